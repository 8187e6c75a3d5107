//! Error types for trailpack operations.
//!
//! Every failure in the encoder pipeline is fatal to the encode invocation:
//! errors propagate as [`TrailError`] up to the caller, which converts them
//! to a diagnostic and a nonzero exit. Partial outputs may be left on disk.

use std::io;
use thiserror::Error;

/// The main error type for trailpack operations.
#[derive(Debug, Error)]
pub enum TrailError {
    /// I/O error from an input, output or temporary file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Too many events had a timestamp delta that could not be encoded.
    ///
    /// Raised after grouping when the ratio of invalid records to total
    /// records exceeds the configured maximum.
    #[error("too many invalid timestamp deltas: {invalid} of {total} records")]
    TooManyInvalid {
        /// Number of records whose delta exceeded the encodable range.
        invalid: u64,
        /// Total number of grouped records.
        total: u64,
    },

    /// The trails file grew past the 32-bit offset limit.
    #[error("trails file exceeds the 32-bit offset limit at {offset} bytes")]
    TrailsTooLarge {
        /// Cumulative byte offset that tripped the limit.
        offset: u64,
    },

    /// Huffman codebook construction failed.
    #[error("codebook construction failed: {message}")]
    CodebookBuild {
        /// Description of the failure.
        message: String,
    },

    /// Malformed or out-of-range encoder input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the input violation.
        message: String,
    },
}

/// Result type alias for trailpack operations.
pub type Result<T> = std::result::Result<T, TrailError>;

impl TrailError {
    /// Create a too-many-invalid error.
    pub fn too_many_invalid(invalid: u64, total: u64) -> Self {
        Self::TooManyInvalid { invalid, total }
    }

    /// Create a trails-too-large error.
    pub fn trails_too_large(offset: u64) -> Self {
        Self::TrailsTooLarge { offset }
    }

    /// Create a codebook build error.
    pub fn codebook_build(message: impl Into<String>) -> Self {
        Self::CodebookBuild {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrailError::too_many_invalid(7, 100);
        assert!(err.to_string().contains("7 of 100"));

        let err = TrailError::trails_too_large(u32::MAX as u64);
        assert!(err.to_string().contains("32-bit offset limit"));

        let err = TrailError::codebook_build("empty frequency table");
        assert!(err.to_string().contains("empty frequency table"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: TrailError = io_err.into();
        assert!(matches!(err, TrailError::Io(_)));
    }
}
