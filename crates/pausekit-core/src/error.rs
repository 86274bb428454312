//! Error handling for pausekit
//!
//! The scan-and-splice engine itself never fails: every anomaly in the
//! G-code stream degrades to a documented fallback. Errors only arise at the
//! edges, when processors are looked up or chained, and on I/O.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Layer processor error type
///
/// Represents failures while building or running a processor pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessorError {
    /// No processor is registered under the requested name
    #[error("Unknown processor: {name}")]
    UnknownProcessor {
        /// The name that was requested.
        name: String,
    },

    /// A processor rejected the layer sequence
    #[error("Processor '{processor}' failed: {reason}")]
    ProcessingFailed {
        /// The failing processor's name.
        processor: String,
        /// Why the processor failed.
        reason: String,
    },
}

/// Main error type for pausekit
///
/// A unified error type used in the public APIs of the library crates.
#[derive(Error, Debug)]
pub enum Error {
    /// Processor error
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a processor error
    pub fn is_processor_error(&self) -> bool {
        matches!(self, Error::Processor(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_error_display() {
        let err = ProcessorError::UnknownProcessor {
            name: "arc_expander".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown processor: arc_expander");

        let err = ProcessorError::ProcessingFailed {
            processor: "pause_at_height".to_string(),
            reason: "no layers".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Processor 'pause_at_height' failed: no layers"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = ProcessorError::UnknownProcessor {
            name: "x".to_string(),
        }
        .into();
        assert!(err.is_processor_error());
        assert_eq!(err.to_string(), "Unknown processor: x");

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io_err.into();
        assert!(!err.is_processor_error());
        assert!(matches!(err, Error::Io(_)));

        assert_eq!(Error::other("boom").to_string(), "boom");
    }
}
