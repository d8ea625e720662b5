use super::{VERSION, YEARS};
use clap::{value_t, App, Arg, ErrorKind};
use std::path::PathBuf;

/// Takes the CLI arguments that control the cleaning and plotting of the health records.
pub fn parse_cli() -> (PathBuf, i32, PathBuf, usize) {
    let arg_csvin = Arg::with_name("csvfile")
        .help("a csv file containing health data")
        .value_name("CSV")
        .required(true)
        .index(1);
    let arg_year = Arg::with_name("year")
        .help("the year for this data, the csv dates are month/day only")
        .value_name("YEAR")
        .required(true)
        .index(2);
    let arg_outdir = Arg::with_name("outdir")
        .help("directory for the svg charts")
        .short("o")
        .long("outdir")
        .takes_value(true)
        .default_value(".");
    let arg_summary_rows = Arg::with_name("summary_rows")
        .help("number of trailing statistics rows to ignore at the end of the csv")
        .short("s")
        .long("summary-rows")
        .takes_value(true)
        .default_value("1");
    let cli_args = App::new("Health_plot")
        .version(VERSION.unwrap_or("unknown"))
        .author("Luca Peruzzo")
        .about("cli app to clean the health records and plot them against time and hour of day")
        .arg(arg_csvin)
        .arg(arg_year)
        .arg(arg_outdir)
        .arg(arg_summary_rows)
        .get_matches();
    let csvin = PathBuf::from(cli_args.value_of("csvfile").unwrap_or_default());
    let year = value_t!(cli_args, "year", i32).unwrap_or_else(|e| e.exit());
    if !YEARS.contains(&year) {
        clap::Error::with_description(
            &format!(
                "the year must have four digits ({} to {}), got {}",
                YEARS.start(),
                YEARS.end(),
                year
            ),
            ErrorKind::InvalidValue,
        )
        .exit();
    }
    let outdir = PathBuf::from(cli_args.value_of("outdir").unwrap_or("."));
    let summary_rows = value_t!(cli_args, "summary_rows", usize).unwrap_or_else(|e| e.exit());
    (csvin, year, outdir, summary_rows)
}
