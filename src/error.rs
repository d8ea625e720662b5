use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

/// Fatal errors, the run stops before any chart is written.
/// Bad fields and bad rows are not errors, see [`crate::Diagnostic`].
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read csv record: {0}")]
    Csv(#[from] csv::Error),

    #[error("the csv file is empty, expected the header {expected:?}")]
    MissingHeader { expected: Vec<String> },

    #[error("unexpected header {found:?}, expected {expected:?}")]
    Header {
        found: Vec<String>,
        expected: Vec<String>,
    },

    #[error("could not create output directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plotting failed: {0}")]
    Plot(String),
}

impl ReportError {
    pub(crate) fn plot<E: std::fmt::Display>(e: E) -> Self {
        ReportError::Plot(e.to_string())
    }
}
