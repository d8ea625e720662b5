use health_stats::plot::parse_cli;
use health_stats::report;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let (csvin, year, outdir, summary_rows) = parse_cli();
    info!(
        "read data from {} for year {} and plot to {}",
        csvin.display(),
        year,
        outdir.display()
    );
    match report::run(&csvin, year, &outdir, summary_rows) {
        Ok(written) => info!("done, {} charts written", written.len()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
