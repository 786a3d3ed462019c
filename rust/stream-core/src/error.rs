// rust/stream-core/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {

    #[error("Invalid UTF-8 sequence at byte offset {offset}")]
    InvalidUtf8 {
        offset: usize,
    },

    #[error("The stream ends with a partial record of {buffered} byte(s)")]
    TruncatedRecord {
        buffered: usize,
    },

    #[error("Range {offset}+{length} is out of bounds for a block of {size} byte(s)")]
    OutOfRange {
        offset: usize,
        length: usize,
        size: usize,
    },

    #[error("Position tape mismatch at value {index}: expected {expected}, found {found}")]
    TapeMismatch {
        index: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Storage error at '{path}': {message}")]
    Storage {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Checkpoint error: {message}")]
    Checkpoint {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

// Convenience constructors
impl RuntimeError {

    pub fn invalid_utf8(offset: usize) -> Self {
        Self::InvalidUtf8 { offset }
    }

    pub fn truncated_record(buffered: usize) -> Self {
        Self::TruncatedRecord { buffered }
    }

    pub fn out_of_range(offset: usize, length: usize, size: usize) -> Self {
        Self::OutOfRange { offset, length, size }
    }

    pub fn tape_mismatch(index: usize, expected: &'static str, found: impl Into<String>) -> Self {
        Self::TapeMismatch {
            index,
            expected,
            found: found.into(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::Checkpoint {
            message: message.into(),
            source: None,
        }
    }

    pub fn checkpoint_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Checkpoint {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<std::str::Utf8Error> for RuntimeError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::invalid_utf8(err.valid_up_to())
    }
}
