use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("no input file matching {pattern} found in {}", dir.display())]
    MissingInput { pattern: &'static str, dir: PathBuf },

    #[error("more than one input file matches {pattern}: {}", candidates.join(", "))]
    AmbiguousInput {
        pattern: &'static str,
        candidates: Vec<String>,
    },

    #[error("no date could be read from file name {0}")]
    UndatedInput(String),

    #[error("dates do not match between {primary} ({primary_date}) and {secondary} ({secondary_date})")]
    DateMismatch {
        primary: String,
        primary_date: String,
        secondary: String,
        secondary_date: String,
    },

    #[error("input file {0} has no data rows")]
    EmptyInput(String),

    #[error("processing failed: {0:#}")]
    Processing(anyhow::Error),
}

impl ReconError {
    /// Recovers a taxonomy error raised through `anyhow`, anything else is a
    /// processing failure.
    pub fn classify(err: anyhow::Error) -> Self {
        match err.downcast::<ReconError>() {
            Ok(recon) => recon,
            Err(other) => ReconError::Processing(other),
        }
    }
}
