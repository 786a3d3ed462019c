// rust/stream-core/src/memory/block.rs

use std::fmt;
use std::ops::{Deref, DerefMut, Range};

use bytes::{Bytes, BytesMut};

use crate::error::{Result, RuntimeError};

/// An immutable, reference-counted region of bytes.
///
/// Cloning a block or sharing a sub-range of it never copies the underlying
/// storage; the storage is released when the last block referencing it is
/// dropped.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryBlock {
    data: Bytes,
}

impl MemoryBlock {
    /// Creates an empty block.
    pub fn new() -> Self {
        Self { data: Bytes::new() }
    }

    /// Copies `data` into freshly allocated storage.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(data),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, u8> {
        self.data.iter()
    }

    /// Returns a block that aliases `length` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `offset + length` exceeds the block length.
    pub fn share_slice(&self, offset: usize, length: usize) -> Result<Self> {
        match offset.checked_add(length) {
            Some(end) if end <= self.data.len() => Ok(Self {
                data: self.data.slice(offset..end),
            }),
            _ => Err(RuntimeError::out_of_range(offset, length, self.data.len())),
        }
    }

    /// Returns a block that aliases the first `length` bytes.
    pub fn share_first(&self, length: usize) -> Result<Self> {
        self.share_slice(0, length)
    }

    /// Returns a block that aliases everything from `offset` to the end.
    pub fn share_from(&self, offset: usize) -> Result<Self> {
        let length = self
            .data
            .len()
            .checked_sub(offset)
            .ok_or_else(|| RuntimeError::out_of_range(offset, 0, self.data.len()))?;
        self.share_slice(offset, length)
    }

    /// Infallible form of [`share_slice`](Self::share_slice) for callers that
    /// have already established the bounds. Panics if `range` is out of bounds.
    pub(crate) fn slice(&self, range: Range<usize>) -> Self {
        Self {
            data: self.data.slice(range),
        }
    }

    /// Returns true if both blocks view the same bytes of the same storage
    /// region, i.e. one was shared from the other without a copy.
    pub fn shares_storage_with(&self, other: &MemoryBlock) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        let ours = self.data.as_ptr_range();
        let theirs = other.data.as_ptr_range();
        ours.start < theirs.end && theirs.start < ours.end
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl Deref for MemoryBlock {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for MemoryBlock {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl<'a> IntoIterator for &'a MemoryBlock {
    type Item = &'a u8;
    type IntoIter = std::slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl From<Bytes> for MemoryBlock {
    fn from(data: Bytes) -> Self {
        Self { data }
    }
}

impl From<Vec<u8>> for MemoryBlock {
    fn from(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }
}

impl From<String> for MemoryBlock {
    fn from(data: String) -> Self {
        Self { data: data.into() }
    }
}

impl From<&'static [u8]> for MemoryBlock {
    fn from(data: &'static [u8]) -> Self {
        Self {
            data: Bytes::from_static(data),
        }
    }
}

impl From<&'static str> for MemoryBlock {
    fn from(data: &'static str) -> Self {
        Self {
            data: Bytes::from_static(data.as_bytes()),
        }
    }
}

impl PartialEq<[u8]> for MemoryBlock {
    fn eq(&self, other: &[u8]) -> bool {
        self.data.as_ref() == other
    }
}

impl PartialEq<&[u8]> for MemoryBlock {
    fn eq(&self, other: &&[u8]) -> bool {
        self.data.as_ref() == *other
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for MemoryBlock {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.data.as_ref() == other.as_slice()
    }
}

impl fmt::Debug for MemoryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.data, f)
    }
}

/// Freshly allocated, zero-initialized storage that can be written once and
/// then frozen into an immutable [`MemoryBlock`].
pub struct WritableMemoryBlock {
    data: BytesMut,
}

impl WritableMemoryBlock {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Converts into an immutable block without copying.
    pub fn freeze(self) -> MemoryBlock {
        MemoryBlock {
            data: self.data.freeze(),
        }
    }
}

impl Deref for WritableMemoryBlock {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for WritableMemoryBlock {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Allocates `size` zeroed bytes of fresh storage.
pub fn allocate_memory(size: usize) -> WritableMemoryBlock {
    WritableMemoryBlock {
        data: BytesMut::zeroed(size),
    }
}
