//! Error types for the benchmark.

use crate::driver::PageOp;
use thiserror::Error;

/// Boxed error produced by a driver or bootstrap layer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Benchmark error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Bootstrap of the context or texture failed
    #[error("Setup failed")]
    Setup(#[source] BoxError),

    /// Configuration rejected before setup
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The driver reported an unusable page tile size
    #[error("Invalid tile size: {0}")]
    InvalidTileSize(String),

    /// The driver raised an error after a page-commitment request
    #[error("Page {op} failed at level {level}, tile row {row}, column {column}")]
    CommitFailed {
        op: PageOp,
        level: u32,
        row: u32,
        column: u32,
        #[source]
        source: BoxError,
    },

    /// The driver raised an error after a pixel upload
    #[error("Upload failed at level {level}, tile row {row}, column {column}")]
    UploadFailed {
        level: u32,
        row: u32,
        column: u32,
        #[source]
        source: BoxError,
    },

    /// Writing timing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for this error.
    ///
    /// Setup-class failures exit with 1, faults raised while the passes run exit with 2.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Setup(_) | Self::InvalidConfig(_) | Self::InvalidTileSize(_) => 1,
            Self::CommitFailed { .. } | Self::UploadFailed { .. } | Self::Io(_) => 2,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_errors_exit_with_one() {
        let err = Error::Setup("no EGL devices".into());
        assert_eq!(err.exit_code(), 1);
        assert_eq!(Error::InvalidTileSize("0x0x0".into()).exit_code(), 1);
    }

    #[test]
    fn pass_faults_exit_with_two() {
        let err = Error::CommitFailed {
            op: PageOp::Evict,
            level: 2,
            row: 3,
            column: 4,
            source: "GL_OUT_OF_MEMORY".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "Page evict failed at level 2, tile row 3, column 4");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("GL_OUT_OF_MEMORY"));
    }
}
