use chrono::prelude::*;
pub mod chart;
pub mod error;
pub mod plot;
pub mod report;
pub mod rowparse;

pub use error::ReportError;
pub use rowparse::{
    parse_row, Diagnostic, DiagnosticSink, LogSink, RawRow, RowOutcome, SkipReason,
};

pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// The year is not in the csv, it is prepended to the "M/D" date before parsing.
pub const DT_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Years with exactly four digits, as `%Y` is meant in [`DT_FORMAT`].
pub const YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

pub const HEADER: [&str; 8] = [
    "Date", "Time", "Sugar", "Upper", "Lower", "BPM", "Weight", "Notes",
];

pub const HOURS: usize = 24;

/// The five numeric columns of the health csv.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Sugar,
    Upper,
    Lower,
    Bpm,
    Weight,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Sugar,
        Metric::Upper,
        Metric::Lower,
        Metric::Bpm,
        Metric::Weight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Sugar => "sugar",
            Metric::Upper => "upper",
            Metric::Lower => "lower",
            Metric::Bpm => "bpm",
            Metric::Weight => "weight",
        }
    }

    /// chart title, also used as the file stem of the chart
    pub fn title(self) -> &'static str {
        match self {
            Metric::Sugar => "sugars vs dt",
            Metric::Upper => "uppers vs dt",
            Metric::Lower => "lowers vs dt",
            Metric::Bpm => "bpms vs dt",
            Metric::Weight => "weight vs dt",
        }
    }

    pub fn ylabel(self) -> &'static str {
        match self {
            Metric::Sugar => "sugars",
            Metric::Upper => "uppers",
            Metric::Lower => "lowers",
            Metric::Bpm => "heart beats / minute",
            Metric::Weight => "weight (lbs)",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One timestamped row of the csv; None is a missing value, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub time: NaiveDateTime,
    pub sugar: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
    pub bpm: Option<f64>,
    pub weight: Option<f64>,
}

/// The main struct for the health time series.
/// All the vectors have the same length, index i of each one comes from the same csv row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    pub time: Vec<NaiveDateTime>,
    pub sugar: Vec<Option<f64>>,
    pub upper: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
    pub bpm: Vec<Option<f64>>,
    pub weight: Vec<Option<f64>>,
}

impl SeriesSet {
    pub fn new(capacity: usize) -> SeriesSet {
        SeriesSet {
            time: Vec::with_capacity(capacity),
            sugar: Vec::with_capacity(capacity),
            upper: Vec::with_capacity(capacity),
            lower: Vec::with_capacity(capacity),
            bpm: Vec::with_capacity(capacity),
            weight: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, reading: Reading) {
        self.time.push(reading.time);
        self.sugar.push(reading.sugar);
        self.upper.push(reading.upper);
        self.lower.push(reading.lower);
        self.bpm.push(reading.bpm);
        self.weight.push(reading.weight);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn metric(&self, metric: Metric) -> &[Option<f64>] {
        match metric {
            Metric::Sugar => &self.sugar,
            Metric::Upper => &self.upper,
            Metric::Lower => &self.lower,
            Metric::Bpm => &self.bpm,
            Metric::Weight => &self.weight,
        }
    }

    pub fn bin_by_hour(&self, metric: Metric) -> HourBins {
        bin_by_hour(&self.time, self.metric(metric))
    }
}

/// Parses all the rows in order and keeps the accepted readings.
/// The rows must not include the header or the trailing summary rows;
/// the diagnostics refer to the 0-based position in `rows`.
pub fn build_series(
    rows: &[RawRow],
    year: i32,
    sink: &mut dyn DiagnosticSink,
) -> (SeriesSet, Vec<SkipReason>) {
    let mut series = SeriesSet::new(rows.len());
    let mut skipped = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        match parse_row(row, i, year, sink) {
            RowOutcome::Accepted(reading) => series.push(reading),
            RowOutcome::Skipped(reason) => skipped.push(reason),
        }
    }
    (series, skipped)
}

/// Mean of the present values.
/// Returns 0.0 when there are none: the hourly chart draws an empty hour as a zero bar.
/// Running mean, so values close to f64::MAX do not overflow a sum.
pub fn mean(xs: &[Option<f64>]) -> f64 {
    let mut mu = 0f64;
    for (k, x) in xs.iter().flatten().enumerate() {
        let n = (k + 1) as f64;
        mu += x / n - mu / n;
    }
    mu
}

/// Number of readings and mean value for each hour of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct HourBins {
    pub counts: [usize; HOURS],
    pub means: [f64; HOURS],
}

/// bins the values by the hour of their (naive) timestamp.
/// Absent values still count as a reading of that hour, but not in its mean.
pub fn bin_by_hour(time: &[NaiveDateTime], values: &[Option<f64>]) -> HourBins {
    assert_eq!(
        time.len(),
        values.len(),
        "timestamps and values must have the same length"
    );
    let mut counts = [0usize; HOURS];
    let mut buckets: Vec<Vec<Option<f64>>> = vec![Vec::new(); HOURS];
    for (t, &v) in time.iter().zip(values.iter()) {
        let h = t.hour() as usize;
        counts[h] += 1;
        buckets[h].push(v);
    }
    let mut means = [0f64; HOURS];
    for (m, b) in means.iter_mut().zip(buckets.iter()) {
        *m = mean(b);
    }
    HourBins { counts, means }
}

/// min and max of the slice, None if it is empty
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

pub fn suitable_xfmt(d: chrono::Duration) -> &'static str {
    if d > chrono::Duration::weeks(1) {
        "%y-%m-%d"
    } else if d > chrono::Duration::days(1) {
        "%m-%d %H"
    } else {
        "%d %H:%M"
    }
}
