//! Error types for the analysis pipeline.
//!
//! Structural problems (missing files, missing columns, empty sources) are
//! surfaced through these variants. Numeric edge cases inside aggregation and
//! delay computation are absorbed to `0.0` at the call site instead and never
//! reach this taxonomy.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input source does not exist.
    #[error("traffic data file not found: {0}")]
    NotFound(PathBuf),

    /// One or more required columns are absent from the source.
    #[error("missing required columns: {}", .0.join(", "))]
    Schema(Vec<String>),

    /// The source is structurally empty (no rows at all).
    #[error("input is empty: {0}")]
    EmptyInput(String),

    /// Non-positive green time passed to the strict delay estimator.
    #[error("green time must be positive, got {0}")]
    InvalidParameter(f64),

    /// A merge was attempted against something that is not a timing plan.
    #[error("cannot combine TimingPlan with {found}")]
    TypeMismatch { found: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn schema<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cols: Vec<String> = missing.into_iter().map(Into::into).collect();
        cols.sort();
        Error::Schema(cols)
    }
}
