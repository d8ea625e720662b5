use super::error::{ReportError, Result};
use super::{build_series, chart, mean, LogSink, Metric, RawRow, SeriesSet, SkipReason, HEADER};
use csv::{ByteRecord, ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// file name of the hourly blood sugar chart, inside the output directory
pub const HOURLY_SVG: &str = "sugarsByHour.svg";

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(false).flexible(true).trim(Trim::None);
    builder
}

/// Reads all the records, header included, without interpreting them.
/// Fields are kept as bytes, so a stray non utf-8 byte only spoils its own field.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ByteRecord>> {
    let mut rdr = reader_builder().from_reader(reader);
    let mut records = Vec::new();
    for result in rdr.byte_records() {
        records.push(result?);
    }
    Ok(records)
}

/// The header must match [`HEADER`] exactly, same names, same order, same case.
pub fn check_header(header: &ByteRecord) -> Result<()> {
    if header.iter().eq(HEADER.iter().map(|h| h.as_bytes())) {
        Ok(())
    } else {
        Err(ReportError::Header {
            found: decode(header).collect(),
            expected: expected_header(),
        })
    }
}

/// invalid utf-8 sequences become U+FFFD, the row parser then reports the field
fn decode(record: &ByteRecord) -> impl Iterator<Item = String> + '_ {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
}

fn expected_header() -> Vec<String> {
    HEADER.iter().map(|h| h.to_string()).collect()
}

/// Checks the header and returns the rows between it and the last `summary_rows` records.
pub fn data_rows(records: &[ByteRecord], summary_rows: usize) -> Result<Vec<RawRow>> {
    let header = records.first().ok_or_else(|| ReportError::MissingHeader {
        expected: expected_header(),
    })?;
    info!("header: {:?}", decode(header).collect::<Vec<_>>());
    check_header(header)?;
    let end = records.len().saturating_sub(summary_rows).max(1);
    if end == 1 && records.len() > 1 {
        warn!(
            "all the {} records after the header are treated as summary rows",
            records.len() - 1
        );
    }
    Ok(records[1..end]
        .iter()
        .map(|r| RawRow::from_fields(decode(r)))
        .collect())
}

/// Reads the csv at `csvin` and returns its data rows, see [`data_rows`].
pub fn read_rows(csvin: &Path, summary_rows: usize) -> Result<Vec<RawRow>> {
    let file = File::open(csvin).map_err(|source| ReportError::Open {
        path: csvin.to_path_buf(),
        source,
    })?;
    let records = read_records(file)?;
    debug!("read {} records from {}", records.len(), csvin.display());
    data_rows(&records, summary_rows)
}

/// logs how many readings survived and the mean of each metric
pub fn summarize(series: &SeriesSet, skipped: &[SkipReason]) {
    let incomplete = skipped
        .iter()
        .filter(|s| matches!(s, SkipReason::Incomplete { .. }))
        .count();
    info!(
        "{} readings, {} rows skipped ({} incomplete, {} with invalid datetime)",
        series.len(),
        skipped.len(),
        incomplete,
        skipped.len() - incomplete
    );
    for &m in Metric::ALL.iter() {
        let values = series.metric(m);
        info!(
            "{:>6}: {} values, mean {:5.2}",
            m.name(),
            values.iter().flatten().count(),
            mean(values)
        );
    }
}

/// Writes one chart per metric and the hourly blood sugar chart into `outdir`.
/// Returns the paths of the written files.
pub fn plot_report(series: &SeriesSet, outdir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(outdir).map_err(|source| ReportError::Io {
        path: outdir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::with_capacity(Metric::ALL.len() + 1);
    if series.is_empty() {
        warn!("no valid readings, skipping the time series charts");
    } else {
        for &m in Metric::ALL.iter() {
            let svgout = outdir.join(format!("{}.svg", m.title()));
            chart::plot_metric(&series.time, series.metric(m), m.title(), m.ylabel(), &svgout)?;
            info!("wrote {}", svgout.display());
            written.push(svgout);
        }
    }
    let svgout = outdir.join(HOURLY_SVG);
    chart::plot_hourly(&series.bin_by_hour(Metric::Sugar), &svgout)?;
    info!("wrote {}", svgout.display());
    written.push(svgout);
    Ok(written)
}

/// The whole run: read, clean, summarize and plot.
/// Nothing is plotted if the file cannot be read or its header is wrong.
pub fn run(csvin: &Path, year: i32, outdir: &Path, summary_rows: usize) -> Result<Vec<PathBuf>> {
    let rows = read_rows(csvin, summary_rows)?;
    let (series, skipped) = build_series(&rows, year, &mut LogSink);
    summarize(&series, &skipped);
    plot_report(&series, outdir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Diagnostic;
    use pretty_assertions::assert_eq;

    const SHEET: &str = "\
Date,Time,Sugar,Upper,Lower,BPM,Weight,Notes
9/28,11:30,121,108,67,70,,
9/28,12:00,,,,,,
,,,,,,,
Mean,,121,108,67,70,,
";

    #[test]
    fn drops_header_and_summary_row() {
        let records = read_records(SHEET.as_bytes()).unwrap();
        assert_eq!(records.len(), 5);
        let rows = data_rows(&records, 1).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].sugar, "121");
        assert_eq!(rows[2], RawRow::default());
    }

    #[test]
    fn summary_rows_are_up_to_the_caller() {
        let records = read_records(SHEET.as_bytes()).unwrap();
        assert_eq!(data_rows(&records, 0).unwrap().len(), 4);
        assert_eq!(data_rows(&records, 3).unwrap().len(), 1);
        assert!(data_rows(&records, 10).unwrap().is_empty());
    }

    #[test]
    fn header_must_match_exactly() {
        for header in [
            "Date,Time,Sugar,Upper,Lower,BPM,Notes",
            "date,time,sugar,upper,lower,bpm,weight,notes",
            "Date, Time, Sugar, Upper, Lower, BPM, Weight, Notes",
            "Time,Date,Sugar,Upper,Lower,BPM,Weight,Notes",
        ]
        .iter()
        {
            let sheet = format!("{}\n9/28,11:30,121,108,67,70,,\nstats\n", header);
            let records = read_records(sheet.as_bytes()).unwrap();
            match data_rows(&records, 1) {
                Err(ReportError::Header { found, expected }) => {
                    assert_eq!(found.join(","), *header);
                    assert_eq!(expected.len(), 8);
                }
                other => panic!("expected a header error, got {:?}", other),
            }
        }
    }

    #[test]
    fn latin1_notes_do_not_abort_the_run() {
        let sheet: &[u8] = b"Date,Time,Sugar,Upper,Lower,BPM,Weight,Notes\n\
9/28,11:30,121,108,67,70,,caf\xe9\n\
9/29,8:00,99,,,,,\n\
9/29,9:00,1\xe90,,,,,\n\
Stats,,,,,,,\n";
        let records = read_records(sheet).unwrap();
        let rows = data_rows(&records, 1).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].notes, "caf\u{FFFD}");
        assert_eq!(rows[1].sugar, "99");

        let mut sink: Vec<Diagnostic> = Vec::new();
        let (series, _) = build_series(&rows, 2020, &mut sink);
        assert_eq!(series.sugar, vec![Some(121.), Some(99.), None]);
        assert_eq!(
            sink,
            vec![Diagnostic::BadField {
                row: 2,
                metric: Metric::Sugar,
                value: "1\u{FFFD}0".to_string(),
            }]
        );
    }

    #[test]
    fn empty_input_has_no_header() {
        let records = read_records("".as_bytes()).unwrap();
        assert!(matches!(
            data_rows(&records, 1),
            Err(ReportError::MissingHeader { .. })
        ));
    }
}
