// rust/stream-core/src/record/reader.rs

use std::sync::Arc;

use crate::error::{Result, RuntimeError};
use crate::memory::{allocate_memory, MemoryBlock};
use crate::source::DataSource;
use crate::stream::ChunkStream;
use crate::tape::Tape;

use super::boundary::RecordBoundary;

/// Reads boundary-delimited records from a [`ChunkStream`].
///
/// A record that lies entirely within one chunk is returned as a view of that
/// chunk. Only records that straddle chunk boundaries are copied, into one
/// freshly allocated buffer.
pub struct RecordReader<S> {
    stream: S,
    boundary: Arc<dyn RecordBoundary>,
    current_chunk: MemoryBlock,
    previous_chunks: Vec<MemoryBlock>,
    // Bytes consumed by the in-progress record, delimiter included.
    record_len: usize,
    record_end_offset: usize,
    // Stream offset of the first byte of the next record.
    position: u64,
}

impl<S: ChunkStream> RecordReader<S> {
    pub fn new(stream: S, boundary: Arc<dyn RecordBoundary>) -> Self {
        Self {
            stream,
            boundary,
            current_chunk: MemoryBlock::new(),
            previous_chunks: Vec::new(),
            record_len: 0,
            record_end_offset: 0,
            position: 0,
        }
    }

    /// Returns the next record, or `None` once the stream ends cleanly
    /// between records.
    ///
    /// # Errors
    ///
    /// Returns `TruncatedRecord` if the stream ends inside a record. The
    /// reader should be reset before further use.
    pub fn next_record(&mut self) -> Result<Option<MemoryBlock>> {
        if !self.load_next_record()? {
            return Ok(None);
        }

        let record = self.extract_record()?;

        self.move_to_next_record()?;

        Ok(Some(record))
    }

    /// Drops any buffered data and rewinds the stream to its beginning.
    pub fn reset(&mut self) -> Result<()> {
        self.clear_buffers();
        self.position = 0;
        self.stream.reset()
    }

    /// Stream offset at which the next record starts.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Moves the reader so the next record starts at stream offset
    /// `position`, dropping any buffered data.
    ///
    /// # Errors
    ///
    /// Returns the stream's error if it cannot seek to `position`. The reader
    /// keeps its buffers and position in that case.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        self.stream.seek(position)?;

        self.clear_buffers();
        self.position = position;
        Ok(())
    }

    /// Returns true if part of a record is buffered.
    pub fn has_partial_record(&self) -> bool {
        !self.current_chunk.is_empty() || !self.previous_chunks.is_empty()
    }

    pub fn boundary(&self) -> &Arc<dyn RecordBoundary> {
        &self.boundary
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn into_stream(self) -> S {
        self.stream
    }

    /// Pulls chunks until the end of the next record is known.
    fn load_next_record(&mut self) -> Result<bool> {
        self.record_len = 0;

        let mut first_chunk = true;

        loop {
            if let Some(end) =
                self.boundary
                    .find_record_end(&self.current_chunk, first_chunk, self.record_len)
            {
                self.record_len += end;
                self.record_end_offset = end;
                return Ok(true);
            }

            let next_chunk = self.stream.read_chunk()?;
            if next_chunk.is_empty() {
                if !self.has_partial_record() {
                    return Ok(false);
                }

                let buffered = self.record_len + self.current_chunk.len();
                tracing::debug!(
                    buffered,
                    position = self.position,
                    "stream ended inside a record"
                );
                return Err(RuntimeError::truncated_record(buffered));
            }

            // Keep the current chunk around and continue the search in the
            // next one. An empty current chunk carries no record bytes.
            let current = std::mem::replace(&mut self.current_chunk, next_chunk);
            if !current.is_empty() {
                self.record_len += current.len();
                self.previous_chunks.push(current);
                first_chunk = false;
            }
        }
    }

    fn extract_record(&self) -> Result<MemoryBlock> {
        let length = self
            .record_len
            .saturating_sub(self.boundary.delimiter_len());

        if self.previous_chunks.is_empty() {
            return self.current_chunk.share_first(length);
        }

        self.copy_split_record(length)
    }

    /// Merges the previous chunks and the head of the current chunk into one
    /// contiguous block of `length` bytes.
    fn copy_split_record(&self, length: usize) -> Result<MemoryBlock> {
        let mut record = allocate_memory(length);

        let head = self.current_chunk.share_first(self.record_end_offset)?;
        let parts = self.previous_chunks.iter().chain(std::iter::once(&head));

        let mut written = 0;
        for part in parts {
            let n = part.len().min(length - written);
            record[written..written + n].copy_from_slice(&part[..n]);
            written += n;
        }

        tracing::trace!(
            length,
            chunks = self.previous_chunks.len() + 1,
            "merged record spanning chunks"
        );

        Ok(record.freeze())
    }

    fn move_to_next_record(&mut self) -> Result<()> {
        self.current_chunk = self.current_chunk.share_from(self.record_end_offset)?;
        self.previous_chunks.clear();
        self.position += self.record_len as u64;
        Ok(())
    }

    fn clear_buffers(&mut self) {
        self.current_chunk = MemoryBlock::new();
        self.previous_chunks.clear();
        self.record_len = 0;
        self.record_end_offset = 0;
    }
}

impl<S: ChunkStream> DataSource for RecordReader<S> {
    type Item = MemoryBlock;

    fn next(&mut self) -> Result<Option<MemoryBlock>> {
        self.next_record()
    }

    fn reset(&mut self) -> Result<()> {
        RecordReader::reset(self)
    }

    fn record_position(&self, tape: &mut Tape) {
        tape.record(self.position);
    }

    fn reload_position(&mut self, tape: &mut Tape) -> Result<()> {
        let position = tape.read::<u64>()?;
        self.seek(position)?;

        tracing::debug!(position, "reloaded record reader position");
        Ok(())
    }
}
