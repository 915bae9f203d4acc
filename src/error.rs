//! Error kinds surfaced while rendering and submitting job scripts

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::template::parse::Conversion;

/// Result type for rendering and submission
pub type JobResult<T> = Result<T, JobError>;

/// Everything that can go wrong between reading a template and getting a job id back
#[derive(Error, Debug)]
pub enum JobError {
    /// The template text has a malformed placeholder
    #[error("invalid template at line {line}, column {column}: {reason}")]
    InvalidTemplate { line: usize, column: usize, reason: String },

    /// The template references a parameter that wasn't supplied
    #[error("missing parameter '{name}' referenced by template")]
    MissingParameter { name: String },

    /// A supplied value can't be rendered by its placeholder's conversion
    #[error("parameter '{name}' = {value:?} can't be formatted as {expected}")]
    TypeMismatch { name: String, expected: Conversion, value: String },

    /// A value is well typed but outside what the job accepts
    #[error("parameter '{name}' is invalid: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("refusing to submit an empty job script")]
    EmptyScript,

    /// The job script couldn't be written
    #[error("can't write job script to {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The scheduler rejected the script or couldn't be reached
    #[error("{command} submission failed: {diagnostic}")]
    Submission { command: String, diagnostic: String },

    /// A parameter file, cluster description or template couldn't be loaded
    #[error("invalid {origin}: {reason}")]
    Config { origin: String, reason: String },
}

impl JobError {
    /// Process exit code reported by the command line tool, one per error kind
    pub fn exit_code(&self) -> u8 {
        match self {
            JobError::InvalidTemplate { .. } => 10,
            JobError::MissingParameter { .. } => 3,
            JobError::TypeMismatch { .. } => 4,
            JobError::InvalidParameter { .. } => 5,
            JobError::EmptyScript => 6,
            JobError::Io { .. } => 7,
            JobError::Submission { .. } => 8,
            JobError::Config { .. } => 9,
        }
    }
}
