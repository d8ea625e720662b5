use super::error::{ReportError, Result};
use super::{mean, min_and_max, suitable_xfmt, HourBins, HOURS};
use chrono::prelude::*;
use plotters::prelude::*;
use std::path::Path;

pub const HOURLY_TITLE: &str = "Blood Sugar Readings by Hour";

/// Plots one metric against time to svg, one cross per present value.
/// The caption carries the mean of the present values.
pub fn plot_metric(
    time: &[NaiveDateTime],
    values: &[Option<f64>],
    title: &str,
    ylabel: &str,
    fout: &Path,
) -> Result<()> {
    let (xmindt, xmaxdt) = min_and_max(time)
        .ok_or_else(|| ReportError::Plot(format!("no datetime to plot for {}", title)))?;
    let xspan: chrono::Duration = xmaxdt - xmindt;
    let xmargin = std::cmp::max(xspan / 20, chrono::Duration::hours(1));
    let xminlocal = TimeZone::from_utc_datetime(&Utc, &(xmindt - xmargin));
    let xmaxlocal = TimeZone::from_utc_datetime(&Utc, &(xmaxdt + xmargin));
    let xfmt = suitable_xfmt(xspan);

    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let (ymin, ymax) = match min_and_max(&present[..]) {
        Some((ymin, ymax)) => {
            let yspan = ((ymax - ymin) / 10f64).max(1.);
            (ymin - yspan, ymax + yspan)
        }
        None => (0., 1.),
    };
    let caption = format!("{} (Mean={:5.2})", title, mean(values));

    let root = SVGBackend::new(fout, (1600, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(ReportError::plot)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(&caption, ("sans-serif", 32).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(xminlocal..xmaxlocal, ymin..ymax)
        .map_err(ReportError::plot)?;
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(RGBColor(150, 150, 150).stroke_width(2))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 24))
        .y_desc(ylabel)
        .x_labels(14) // max number of labels
        .x_label_formatter(&|x: &DateTime<Utc>| x.format(xfmt).to_string())
        .y_label_formatter(&|y: &f64| format!("{:5}", y))
        .x_desc(format!("datetime [{}]", xfmt.replace("%", "")))
        .draw()
        .map_err(ReportError::plot)?;

    let points = time
        .iter()
        .zip(values.iter())
        .filter_map(|(t, v)| v.map(|y| (t, y)))
        .map(|(t, y)| {
            Cross::new(
                (TimeZone::from_utc_datetime(&Utc, t), y),
                6,
                RED.stroke_width(2),
            )
        });
    chart.draw_series(points).map_err(ReportError::plot)?;
    root.present().map_err(ReportError::plot)?;
    Ok(())
}

/// Two stacked bar charts: readings per hour of the day on top, mean value per hour below.
pub fn plot_hourly(bins: &HourBins, fout: &Path) -> Result<()> {
    let root = SVGBackend::new(fout, (1200, 1000)).into_drawing_area();
    root.fill(&WHITE).map_err(ReportError::plot)?;
    let root = root
        .titled(HOURLY_TITLE, ("sans-serif", 32))
        .map_err(ReportError::plot)?;
    let panels = root.split_evenly((2, 1));
    let last_hour = (HOURS - 1) as u32;

    let count_max = bins.counts.iter().copied().max().unwrap_or(0) as u32 + 1;
    let mut counts = ChartBuilder::on(&panels[0])
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((0u32..last_hour).into_segmented(), 0u32..count_max)
        .map_err(ReportError::plot)?;
    counts
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(&RGBColor(150, 150, 150).mix(0.3))
        .x_labels(HOURS)
        .y_desc("Number of tests")
        .axis_desc_style(("sans-serif", 20))
        .draw()
        .map_err(ReportError::plot)?;
    counts
        .draw_series(
            Histogram::vertical(&counts)
                .style(BLUE.mix(0.6).filled())
                .margin(4)
                .data(
                    bins.counts
                        .iter()
                        .enumerate()
                        .map(|(h, &c)| (h as u32, c as u32)),
                ),
        )
        .map_err(ReportError::plot)?;

    let mean_max = bins.means.iter().copied().fold(0f64, f64::max).max(1.) * 1.1;
    let mut means = ChartBuilder::on(&panels[1])
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d((0u32..last_hour).into_segmented(), 0f64..mean_max)
        .map_err(ReportError::plot)?;
    means
        .configure_mesh()
        .disable_x_mesh()
        .bold_line_style(&RGBColor(150, 150, 150).mix(0.3))
        .x_labels(HOURS)
        .x_desc("Hour of Day")
        .y_desc("Mean Blood Sugar")
        .axis_desc_style(("sans-serif", 20))
        .draw()
        .map_err(ReportError::plot)?;
    means
        .draw_series(
            Histogram::vertical(&means)
                .style(RED.mix(0.6).filled())
                .margin(4)
                .data(
                    bins.means
                        .iter()
                        .enumerate()
                        .map(|(h, &m)| (h as u32, m)),
                ),
        )
        .map_err(ReportError::plot)?;

    root.present().map_err(ReportError::plot)?;
    Ok(())
}
