// rust/stream-core/src/stream/mod.rs

//! Chunked byte streams.
//!
//! A [`ChunkStream`] hands out raw input as a sequence of [`MemoryBlock`]
//! chunks whose sizes are an implementation detail of the stream. An empty
//! chunk signals the end of input. Readers built on top of a stream must not
//! let chunk boundaries leak into their output.
//!
//! Two implementations are provided:
//!
//! - [`MemoryChunkStream`]: chunks over data already in memory, mostly for
//!   tests and small inputs.
//! - [`StorageChunkStream`]: fixed-size chunks read from a
//!   [`StorageBackend`](crate::storage::StorageBackend) object.

mod memory;
mod storage;

pub use memory::MemoryChunkStream;
pub use storage::StorageChunkStream;

use crate::error::Result;
use crate::memory::MemoryBlock;

/// A source of raw byte chunks.
pub trait ChunkStream: Send {
    /// Returns the next chunk, or an empty block at the end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source fails. Retrying is the
    /// stream's own business; callers propagate the error.
    fn read_chunk(&mut self) -> Result<MemoryBlock>;

    /// Rewinds the stream to its beginning.
    fn reset(&mut self) -> Result<()>;

    /// Positions the stream so that the next chunk starts at byte `offset`
    /// of the input.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `offset` lies past the end of the input. A
    /// failed seek leaves the stream where it was.
    fn seek(&mut self, offset: u64) -> Result<()>;
}

impl<S: ChunkStream + ?Sized> ChunkStream for Box<S> {
    fn read_chunk(&mut self) -> Result<MemoryBlock> {
        (**self).read_chunk()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        (**self).seek(offset)
    }
}
