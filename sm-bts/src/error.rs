/// Error types for the StateMod binary time series reader
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for binary time series operations
#[derive(Error, Debug)]
pub enum BtsError {
    /// Opening, seeking or reading the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read ran past the physical end of the file
    #[error("Truncated data: {wanted} bytes at offset {offset} extend past end of file")]
    Truncated { offset: u64, wanted: usize },

    /// The file extension does not name a known binary output file
    #[error("Unknown binary file extension: {0}")]
    UnknownExtension(String),

    /// Header contents are inconsistent (strict mode only)
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The time series identifier pattern could not be parsed
    #[error("Invalid time series identifier pattern: {0}")]
    InvalidPattern(String),

    /// The handle was closed through the registry
    #[error("File handle has been closed: {0}")]
    Closed(PathBuf),
}

impl BtsError {
    /// True for reads past end of file, which callers treat as "no more data".
    pub fn is_truncated(&self) -> bool {
        matches!(self, BtsError::Truncated { .. })
    }
}

/// Type alias for Results using BtsError
pub type Result<T> = std::result::Result<T, BtsError>;
