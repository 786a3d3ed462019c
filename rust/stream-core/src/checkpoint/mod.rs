// rust/stream-core/src/checkpoint/mod.rs

//! Persistence of position tapes.
//!
//! A checkpoint stores one serialized [`Tape`](crate::tape::Tape), so a reader
//! can resume where a previous process stopped.
//!
//! # File layout
//!
//! ```text
//! +------------------------+
//! | Header Length (4 bytes)|  <- u32 little-endian
//! +------------------------+
//! | Header (bincode)       |  <- CheckpointHeader
//! +------------------------+
//! | Compressed Data        |  <- payload compressed per header
//! +------------------------+
//! ```
//!
//! The header carries an XXHash64 checksum of the uncompressed payload.
//!
//! # Example
//!
//! ```no_run
//! use stream_core::checkpoint::{CheckpointReader, CheckpointWriter};
//! use stream_core::config::{CheckpointConfig, StorageConfig};
//! use stream_core::storage::{LocalStorage, StorageBackend};
//! use stream_core::tape::Tape;
//! use std::sync::Arc;
//!
//! let storage: Arc<dyn StorageBackend> =
//!     Arc::new(LocalStorage::new(&StorageConfig::default()).unwrap());
//! let writer = CheckpointWriter::new(storage.clone(), CheckpointConfig::default());
//!
//! let mut tape = Tape::new();
//! tape.record(128_u64);
//! let path = writer.write_tape("lines", &tape).unwrap();
//!
//! let mut loaded = CheckpointReader::new(storage).read_tape(&path).unwrap();
//! assert_eq!(loaded.read::<u64>().unwrap(), 128);
//! ```

mod format;
mod reader;
mod writer;

pub use format::{CheckpointHeader, CHECKPOINT_EXTENSION};
pub use reader::CheckpointReader;
pub use writer::CheckpointWriter;
