use super::{Metric, Reading, DT_FORMAT, YEARS};
use chrono::prelude::*;
use tracing::warn;

/// One record of the health csv, as strings.
/// The notes column is kept only to mirror the file layout, it is never parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    pub date: String,
    pub time: String,
    pub sugar: String,
    pub upper: String,
    pub lower: String,
    pub bpm: String,
    pub weight: String,
    pub notes: String,
}

impl RawRow {
    /// Build a row from the csv fields in file order.
    /// Missing trailing fields are read as empty strings, extra fields are ignored.
    pub fn from_fields<I>(fields: I) -> RawRow
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut f = fields.into_iter().map(Into::<String>::into);
        let mut next = || f.next().unwrap_or_default();
        RawRow {
            date: next(),
            time: next(),
            sugar: next(),
            upper: next(),
            lower: next(),
            bpm: next(),
            weight: next(),
            notes: next(),
        }
    }

    pub fn field(&self, metric: Metric) -> &str {
        match metric {
            Metric::Sugar => &self.sugar,
            Metric::Upper => &self.upper,
            Metric::Lower => &self.lower,
            Metric::Bpm => &self.bpm,
            Metric::Weight => &self.weight,
        }
    }
}

/// A recoverable problem found while parsing a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// the metric field could not be read as a finite number, it becomes absent
    BadField {
        row: usize,
        metric: Metric,
        value: String,
    },
    /// date and time do not make a valid timestamp, the whole row is dropped
    BadTimestamp {
        row: usize,
        date: String,
        time: String,
    },
}

impl Diagnostic {
    pub fn row(&self) -> usize {
        match self {
            Diagnostic::BadField { row, .. } | Diagnostic::BadTimestamp { row, .. } => *row,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::BadField { row, metric, value } => write!(
                f,
                "Error converting {} of value '{}' to float in row {} of data",
                metric, value, row
            ),
            Diagnostic::BadTimestamp { row, date, time } => write!(
                f,
                "ERROR converting '{}' and '{}' to datetime in row {}",
                date, time, row
            ),
        }
    }
}

/// Receives the diagnostics in the order they are found.
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards every diagnostic to the tracing subscriber as a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&mut self, diagnostic: Diagnostic) {
        warn!(row = diagnostic.row(), "{}", diagnostic);
    }
}

/// Why a row did not produce a reading.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// empty date or time, usually the blank tail of the sheet
    Incomplete { row: usize },
    BadTimestamp {
        row: usize,
        date: String,
        time: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accepted(Reading),
    Skipped(SkipReason),
}

/// Parses one row; `index` is the 0-based position of the row, used in the diagnostics.
pub fn parse_row(
    row: &RawRow,
    index: usize,
    year: i32,
    sink: &mut dyn DiagnosticSink,
) -> RowOutcome {
    if row.date.is_empty() || row.time.is_empty() {
        return RowOutcome::Skipped(SkipReason::Incomplete { row: index });
    }
    let time = match parse_timestamp(&row.date, &row.time, year) {
        Some(t) => t,
        None => {
            sink.emit(Diagnostic::BadTimestamp {
                row: index,
                date: row.date.clone(),
                time: row.time.clone(),
            });
            return RowOutcome::Skipped(SkipReason::BadTimestamp {
                row: index,
                date: row.date.clone(),
                time: row.time.clone(),
            });
        }
    };
    let mut metric = |m: Metric| parse_metric(row.field(m), m, index, &mut *sink);
    RowOutcome::Accepted(Reading {
        time,
        sugar: metric(Metric::Sugar),
        upper: metric(Metric::Upper),
        lower: metric(Metric::Lower),
        bpm: metric(Metric::Bpm),
        weight: metric(Metric::Weight),
    })
}

/// "<year>/<date> <time>" against [`DT_FORMAT`].
/// chrono skips blanks before numbers and takes any year width, so both are refused first.
fn parse_timestamp(date: &str, time: &str, year: i32) -> Option<NaiveDateTime> {
    let has_blank = |s: &str| s.chars().any(char::is_whitespace);
    if !YEARS.contains(&year) || has_blank(date) || has_blank(time) {
        return None;
    }
    let dt_str = format!("{}/{} {}", year, date, time);
    NaiveDateTime::parse_from_str(&dt_str, DT_FORMAT).ok()
}

/// "140.5" -> Some(140.5), "" -> None;
/// anything else that is not a finite number is reported and read as None.
pub fn parse_metric(
    value: &str,
    metric: Metric,
    index: usize,
    sink: &mut dyn DiagnosticSink,
) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            sink.emit(Diagnostic::BadField {
                row: index,
                metric,
                value: value.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(fields: &[&str]) -> RawRow {
        RawRow::from_fields(fields.iter().copied())
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn short_records_are_padded() {
        let r = row(&["9/28", "12:00"]);
        assert_eq!(r.time, "12:00");
        assert_eq!(r.sugar, "");
        assert_eq!(r.notes, "");
    }

    #[test]
    fn full_row_is_accepted() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let out = parse_row(
            &row(&["9/28", "11:30", "121", "108", "67", "70", "", "after lunch"]),
            0,
            2020,
            &mut sink,
        );
        assert_eq!(
            out,
            RowOutcome::Accepted(Reading {
                time: at(2020, 9, 28, 11, 30),
                sugar: Some(121.),
                upper: Some(108.),
                lower: Some(67.),
                bpm: Some(70.),
                weight: None,
            })
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn empty_date_or_time_is_skipped_silently() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        for fields in [
            ["", "11:30", "121", "", "", "", "", ""],
            ["9/28", "", "121", "", "", "", "", ""],
            ["", "", "", "", "", "", "", ""],
        ]
        .iter()
        {
            let out = parse_row(&row(fields), 4, 2020, &mut sink);
            assert_eq!(out, RowOutcome::Skipped(SkipReason::Incomplete { row: 4 }));
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn bad_metric_nulls_only_that_field() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let out = parse_row(
            &row(&["9/28", "7:05", "abc", "120", "80", "65", "180.5", ""]),
            3,
            2020,
            &mut sink,
        );
        match out {
            RowOutcome::Accepted(r) => {
                assert_eq!(r.time, at(2020, 9, 28, 7, 5));
                assert_eq!(r.sugar, None);
                assert_eq!(r.upper, Some(120.));
                assert_eq!(r.lower, Some(80.));
                assert_eq!(r.bpm, Some(65.));
                assert_eq!(r.weight, Some(180.5));
            }
            other => panic!("expected a reading, got {:?}", other),
        }
        assert_eq!(
            sink,
            vec![Diagnostic::BadField {
                row: 3,
                metric: Metric::Sugar,
                value: "abc".to_string(),
            }]
        );
        assert_eq!(
            sink[0].to_string(),
            "Error converting sugar of value 'abc' to float in row 3 of data"
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        assert_eq!(parse_metric("inf", Metric::Bpm, 1, &mut sink), None);
        assert_eq!(parse_metric("NaN", Metric::Weight, 2, &mut sink), None);
        assert_eq!(parse_metric(" 98.6 ", Metric::Weight, 3, &mut sink), Some(98.6));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn bad_timestamp_drops_row_with_one_diagnostic() {
        for (date, time) in [("13/40", "11:30"), ("9/28", "25:00"), ("sep 28", "11:30"), ("2/30", "8:00")]
            .iter()
        {
            let mut sink: Vec<Diagnostic> = Vec::new();
            let out = parse_row(
                &row(&[*date, *time, "xyz", "108", "67", "70", "", ""]),
                7,
                2021,
                &mut sink,
            );
            assert_eq!(
                out,
                RowOutcome::Skipped(SkipReason::BadTimestamp {
                    row: 7,
                    date: date.to_string(),
                    time: time.to_string(),
                })
            );
            assert_eq!(sink.len(), 1, "{} {}", date, time);
            assert_eq!(sink[0].row(), 7);
        }
    }

    #[test]
    fn blanks_inside_date_or_time_are_rejected() {
        for (date, time) in [(" 9/28", "11:30"), ("9/ 28", "11:30"), ("9/28", " 11:30"), ("9/28", "11: 30"), ("9/28\t", "11:30")]
            .iter()
        {
            let mut sink: Vec<Diagnostic> = Vec::new();
            let out = parse_row(&row(&[*date, *time, "121"]), 0, 2020, &mut sink);
            assert!(matches!(out, RowOutcome::Skipped(SkipReason::BadTimestamp { .. })), "{:?} {:?}", date, time);
            assert_eq!(sink.len(), 1);
        }
    }

    #[test]
    fn year_must_have_four_digits() {
        let r = row(&["9/28", "11:30", "121"]);
        for year in [20, 99, -5, 999, 10000, 12345].iter() {
            let mut sink: Vec<Diagnostic> = Vec::new();
            assert!(matches!(parse_row(&r, 0, *year, &mut sink), RowOutcome::Skipped(_)), "{}", year);
            assert_eq!(sink.len(), 1, "{}", year);
        }
        let mut sink: Vec<Diagnostic> = Vec::new();
        for year in [1000, 2020, 9999].iter() {
            match parse_row(&r, 0, *year, &mut sink) {
                RowOutcome::Accepted(reading) => assert_eq!(reading.time, at(*year, 9, 28, 11, 30)),
                other => panic!("{} rejected: {:?}", year, other),
            }
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn leap_day_depends_on_year() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let r = row(&["2/29", "9:00"]);
        assert!(matches!(parse_row(&r, 0, 2020, &mut sink), RowOutcome::Accepted(_)));
        assert!(matches!(parse_row(&r, 0, 2021, &mut sink), RowOutcome::Skipped(_)));
        assert_eq!(
            sink[0].to_string(),
            "ERROR converting '2/29' and '9:00' to datetime in row 0"
        );
    }
}
