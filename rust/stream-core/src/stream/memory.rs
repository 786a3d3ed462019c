// rust/stream-core/src/stream/memory.rs

use crate::error::{Result, RuntimeError};
use crate::memory::MemoryBlock;

use super::ChunkStream;

/// A stream over a fixed list of in-memory chunks.
#[derive(Debug, Clone, Default)]
pub struct MemoryChunkStream {
    chunks: Vec<MemoryBlock>,
    next_index: usize,
    // Tail of a chunk left over by `seek`, served before `chunks[next_index]`.
    pending: Option<MemoryBlock>,
}

impl MemoryChunkStream {
    /// Creates a stream that yields `chunks` in order. Empty chunks are
    /// dropped so they are not mistaken for the end of input.
    pub fn new(chunks: Vec<MemoryBlock>) -> Self {
        Self {
            chunks: chunks.into_iter().filter(|c| !c.is_empty()).collect(),
            next_index: 0,
            pending: None,
        }
    }

    /// Splits `data` into zero-copy chunks of at most `chunk_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `chunk_size` is zero.
    pub fn with_chunk_size(data: impl Into<MemoryBlock>, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RuntimeError::config("chunk size must be greater than 0"));
        }

        let data = data.into();
        let chunks = (0..data.len())
            .step_by(chunk_size)
            .map(|start| data.share_slice(start, chunk_size.min(data.len() - start)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(chunks))
    }

    /// Splits `data` into chunks with the given sizes, cycling through
    /// `sizes` until the data is exhausted. Zero sizes are skipped.
    pub fn with_chunk_sizes(data: impl Into<MemoryBlock>, sizes: &[usize]) -> Result<Self> {
        if !sizes.iter().any(|&s| s > 0) {
            return Err(RuntimeError::config(
                "chunk sizes must contain at least one non-zero size",
            ));
        }

        let data = data.into();
        let mut chunks = Vec::new();
        let mut offset = 0;

        for &size in sizes.iter().cycle().filter(|&&s| s > 0) {
            if offset >= data.len() {
                break;
            }
            let length = size.min(data.len() - offset);
            chunks.push(data.share_slice(offset, length)?);
            offset += length;
        }

        Ok(Self::new(chunks))
    }

    /// Total number of bytes across all chunks.
    pub fn total_len(&self) -> u64 {
        self.chunks.iter().map(|c| c.len() as u64).sum()
    }
}

impl ChunkStream for MemoryChunkStream {
    fn read_chunk(&mut self) -> Result<MemoryBlock> {
        if let Some(pending) = self.pending.take() {
            return Ok(pending);
        }

        match self.chunks.get(self.next_index) {
            Some(chunk) => {
                self.next_index += 1;
                Ok(chunk.clone())
            }
            None => Ok(MemoryBlock::new()),
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.next_index = 0;
        self.pending = None;
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        let mut start = 0u64;
        for (index, chunk) in self.chunks.iter().enumerate() {
            let end = start + chunk.len() as u64;
            if offset < end {
                let tail = chunk.share_from((offset - start) as usize)?;
                self.next_index = index + 1;
                self.pending = Some(tail);
                return Ok(());
            }
            start = end;
        }

        if offset == start {
            self.next_index = self.chunks.len();
            self.pending = None;
            return Ok(());
        }

        Err(RuntimeError::out_of_range(
            offset as usize,
            0,
            start as usize,
        ))
    }
}
