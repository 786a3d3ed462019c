// rust/stream-core/src/record/boundary.rs

use std::fmt;

use crate::error::{Result, RuntimeError};

/// Describes how to find record boundaries in a chunk.
///
/// Implementations must be pure functions of their arguments; the reader
/// relies on this to re-scan and merge chunks freely.
pub trait RecordBoundary: Send + Sync {
    /// Finds the end of the next record within `chunk`.
    ///
    /// `first_chunk` is true for the first chunk examined for the current
    /// record, and `buffered` is the number of bytes of the record already
    /// accumulated from earlier chunks (zero when `first_chunk` is true).
    ///
    /// Returns the exclusive end offset `K <= chunk.len()` of the bytes the
    /// record consumes in `chunk`, including any delimiter, or `None` if the
    /// record continues past the end of the chunk.
    fn find_record_end(&self, chunk: &[u8], first_chunk: bool, buffered: usize) -> Option<usize>;

    /// Number of trailing consumed bytes that are a delimiter and are not
    /// part of the emitted record.
    fn delimiter_len(&self) -> usize {
        0
    }

    /// Name of this boundary strategy.
    fn name(&self) -> &'static str;
}

/// Records terminated by a single delimiter byte (JSONL, CSV, plain text).
///
/// The delimiter is consumed but excluded from the record: `"ab\ncd\n"`
/// yields `"ab"` and `"cd"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDelimited {
    delimiter: u8,
}

impl LineDelimited {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Newline-delimited records.
    pub fn newline() -> Self {
        Self::new(b'\n')
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl Default for LineDelimited {
    fn default() -> Self {
        Self::newline()
    }
}

impl RecordBoundary for LineDelimited {
    fn find_record_end(&self, chunk: &[u8], _first_chunk: bool, _buffered: usize) -> Option<usize> {
        chunk
            .iter()
            .position(|&b| b == self.delimiter)
            .map(|pos| pos + 1)
    }

    fn delimiter_len(&self) -> usize {
        1
    }

    fn name(&self) -> &'static str {
        "line-delimited"
    }
}

/// Fixed-size records with no delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSize {
    record_size: usize,
}

impl FixedSize {
    /// # Errors
    ///
    /// Returns a configuration error if `record_size` is zero.
    pub fn new(record_size: usize) -> Result<Self> {
        if record_size == 0 {
            return Err(RuntimeError::config("record size must be greater than 0"));
        }
        Ok(Self { record_size })
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }
}

impl RecordBoundary for FixedSize {
    fn find_record_end(&self, chunk: &[u8], _first_chunk: bool, buffered: usize) -> Option<usize> {
        let needed = self.record_size.checked_sub(buffered)?;
        (needed <= chunk.len()).then_some(needed)
    }

    fn name(&self) -> &'static str {
        "fixed-size"
    }
}

impl fmt::Debug for dyn RecordBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
