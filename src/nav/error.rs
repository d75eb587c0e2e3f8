// Navigation errors: missing data and malformed edge records

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading a navigation graph. Both are fatal for the session.
#[derive(Error, Debug)]
pub enum NavError {
    #[error("Navigation data unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed navigation record on line {line}: {message}")]
    Parse { line: usize, message: String },
}
