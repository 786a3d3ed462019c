// rust/stream-core/src/text/immutable_string.rs

use std::fmt;
use std::ops::Deref;

use crate::error::{Result, RuntimeError};
use crate::memory::MemoryBlock;

/// An immutable UTF-8 string backed by a shared [`MemoryBlock`].
///
/// Every constructor either validates its input or derives the string from an
/// existing one at a character boundary, so the storage always holds valid
/// UTF-8. Splitting and prefix removal return views over the same storage.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImmutableString {
    storage: MemoryBlock,
}

impl ImmutableString {
    /// Copies `s` into freshly allocated storage.
    pub fn new(s: &str) -> Self {
        Self {
            storage: MemoryBlock::copy_from_slice(s.as_bytes()),
        }
    }

    /// Wraps `storage` after validating that it holds UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUtf8` with the offset of the first invalid byte.
    pub fn from_utf8(storage: MemoryBlock) -> Result<Self> {
        std::str::from_utf8(&storage)?;
        Ok(Self { storage })
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: `storage` is validated on construction and only ever sliced
        // at character boundaries afterwards.
        unsafe { std::str::from_utf8_unchecked(&self.storage) }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of Unicode scalar values in the string.
    pub fn code_point_length(&self) -> usize {
        self.as_str().chars().count()
    }

    /// Drops the first `byte_count` bytes without copying.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `byte_count` exceeds the length, or
    /// `InvalidUtf8` if it does not fall on a character boundary.
    pub fn remove_prefix(&self, byte_count: usize) -> Result<Self> {
        if byte_count > self.len() {
            return Err(RuntimeError::out_of_range(byte_count, 0, self.len()));
        }
        if !self.as_str().is_char_boundary(byte_count) {
            return Err(RuntimeError::invalid_utf8(byte_count));
        }

        Ok(Self {
            storage: self.storage.share_from(byte_count)?,
        })
    }

    /// Splits on `separator`, skipping empty parts.
    pub fn split(&self, separator: char) -> Vec<ImmutableString> {
        let mut output = Vec::new();
        self.split_with(separator, |part| output.push(part));
        output
    }

    /// Calls `handler` with each non-empty part between occurrences of
    /// `separator`, in order.
    pub fn split_with<F>(&self, separator: char, mut handler: F)
    where
        F: FnMut(ImmutableString),
    {
        let mut offset = 0;

        for (idx, matched) in self.as_str().match_indices(separator) {
            if idx != offset {
                handler(self.share_part(offset, idx));
            }
            offset = idx + matched.len();
        }

        if offset != self.len() {
            handler(self.share_part(offset, self.len()));
        }
    }

    /// Returns the underlying block.
    pub fn storage(&self) -> &MemoryBlock {
        &self.storage
    }

    pub fn into_storage(self) -> MemoryBlock {
        self.storage
    }

    // `start..end` comes from `match_indices`, so both ends are in bounds and
    // on character boundaries.
    fn share_part(&self, start: usize, end: usize) -> Self {
        Self {
            storage: self.storage.slice(start..end),
        }
    }
}

impl Deref for ImmutableString {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for ImmutableString {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for ImmutableString {
    fn from(s: String) -> Self {
        Self {
            storage: MemoryBlock::from(s),
        }
    }
}

impl From<&str> for ImmutableString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl TryFrom<MemoryBlock> for ImmutableString {
    type Error = RuntimeError;

    fn try_from(storage: MemoryBlock) -> Result<Self> {
        Self::from_utf8(storage)
    }
}

impl PartialEq<str> for ImmutableString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ImmutableString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for ImmutableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ImmutableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}
