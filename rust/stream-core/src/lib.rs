// rust/stream-core/src/lib.rs

//! Streaming record reading over zero-copy byte blocks.
//!
//! The crate splits chunked byte input into records without copying whenever
//! a record lies inside one chunk, exposes UTF-8 text as immutable views over
//! the same blocks, and lets every reader save and restore its position
//! through a [`Tape`], optionally persisted as a checkpoint.

pub mod config;
pub mod error;
pub mod memory;
pub mod storage;
pub mod stream;
pub mod tape;
pub mod text;

// Re-export commonly used types for convenience
pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use memory::{allocate_memory, MemoryBlock, WritableMemoryBlock};
pub use storage::{LocalStorage, ObjectMeta, StorageBackend, StorageReader, StorageWriter};
pub use stream::{ChunkStream, MemoryChunkStream, StorageChunkStream};
pub use tape::{Tape, TapeData, TapeValue};
pub use text::{read_text, ImmutableString, LineEnding, TextLineReader, TextOptions};

pub mod record;
pub use record::{FixedSize, LineDelimited, RecordBoundary, RecordReader};

pub mod source;
pub use source::{CountDataSource, DataSource};

pub mod checkpoint;
pub use checkpoint::{CheckpointHeader, CheckpointReader, CheckpointWriter};

pub mod runtime;
pub use runtime::{parse_boundary, Runtime};
