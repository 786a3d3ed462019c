// rust/stream-core/src/stream/storage.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, RuntimeError};
use crate::memory::MemoryBlock;
use crate::storage::{StorageBackend, StorageReader};

use super::ChunkStream;

/// A stream reading fixed-size chunks from an object in a storage backend.
///
/// The last chunk may be shorter. With a memory-mapped backend reader the
/// chunks are views into the mapping.
pub struct StorageChunkStream {
    path: PathBuf,
    reader: Box<dyn StorageReader>,
    chunk_size: usize,
    offset: u64,
}

impl StorageChunkStream {
    /// Opens `path` in `storage` for chunked reading.
    ///
    /// # Errors
    ///
    /// Returns an error if `chunk_size` is zero, or if the object is missing,
    /// is a directory or cannot be opened.
    pub fn open(
        storage: &Arc<dyn StorageBackend>,
        path: impl AsRef<Path>,
        chunk_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref();
        if chunk_size == 0 {
            return Err(RuntimeError::config("chunk size must be greater than 0"));
        }

        if !storage.exists(path)? {
            return Err(RuntimeError::storage(path, "input not found"));
        }
        if storage.metadata(path)?.is_dir {
            return Err(RuntimeError::storage(path, "input is a directory"));
        }

        let reader = storage.open_read(path)?;
        tracing::debug!(
            path = %path.display(),
            size = reader.size(),
            chunk_size,
            "opened chunk stream"
        );

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            chunk_size,
            offset: 0,
        })
    }

    /// Size of the underlying object in bytes.
    pub fn size(&self) -> u64 {
        self.reader.size()
    }

    /// Offset of the next chunk within the object.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChunkStream for StorageChunkStream {
    fn read_chunk(&mut self) -> Result<MemoryBlock> {
        let remaining = self.reader.size().saturating_sub(self.offset);
        if remaining == 0 {
            return Ok(MemoryBlock::new());
        }

        let length = (self.chunk_size as u64).min(remaining) as usize;
        let chunk = self.reader.read_range(self.offset, length)?;
        self.offset += chunk.len() as u64;

        Ok(chunk)
    }

    fn reset(&mut self) -> Result<()> {
        self.offset = 0;
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        let size = self.reader.size();
        if offset > size {
            return Err(RuntimeError::out_of_range(offset as usize, 0, size as usize));
        }

        self.offset = offset;
        Ok(())
    }
}
