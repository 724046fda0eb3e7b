//! Error types for Xtract

use std::io;
use thiserror::Error;

/// Result type for Xtract operations
pub type Result<T> = std::result::Result<T, XtractError>;

/// Errors that can occur while opening or reading an extraction file
#[derive(Debug, Error)]
pub enum XtractError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fewer bytes available than a fixed-size section requires
    #[error("Truncated {section}: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Section being read
        section: &'static str,
        /// Bytes required
        expected: u64,
        /// Bytes available
        actual: u64,
    },

    /// Bad magic, inconsistent field header length or malformed field entry
    #[error("Corrupt header: {0}")]
    CorruptHeader(String),

    /// Format version other than 3 or 4
    #[error("Unsupported extraction format version: {0}")]
    UnsupportedVersion(u32),

    /// Body is not a whole number of timestep records
    #[error(
        "Corrupt body: {body_bytes} bytes is not a multiple of record length {record_length} \
         (residual {residual})"
    )]
    CorruptBody {
        /// Bytes following the headers
        body_bytes: u64,
        /// Bytes per timestep record
        record_length: u64,
        /// Trailing partial record size
        residual: u64,
    },

    /// Timestep values not strictly increasing in file order
    #[error("Timesteps out of order at record {index}: {current} follows {previous}")]
    UnorderedTimeSteps {
        /// Record index of the offending timestep
        index: usize,
        /// Timestep value of the preceding record
        previous: u64,
        /// Timestep value at `index`
        current: u64,
    },

    /// Timestep index past the end of the time index
    #[error("Timestep index {index} out of range (file holds {len} timesteps)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of timesteps
        len: usize,
    },

    /// Timestep value absent from the time index
    #[error("Timestep {0} not present in extraction file")]
    TimeStepNotFound(u64),

    /// Header value exceeds a configured sanity limit
    #[error("{what} of {value} exceeds limit of {limit}")]
    LimitExceeded {
        /// Quantity being checked
        what: &'static str,
        /// Decoded value
        value: u64,
        /// Configured limit
        limit: u64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
