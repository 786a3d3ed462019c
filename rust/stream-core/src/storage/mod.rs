// rust/stream-core/src/storage/mod.rs

//! Storage abstraction.
//!
//! Chunk streams read their input and checkpoints persist their tapes through
//! the [`StorageBackend`] trait, so both work against any backend. The crate
//! ships [`LocalStorage`] for the local filesystem.
//!
//! # Example
//!
//! ```no_run
//! use stream_core::config::StorageConfig;
//! use stream_core::storage::{LocalStorage, StorageBackend};
//! use std::io::Write;
//! use std::path::Path;
//!
//! let storage = LocalStorage::new(&StorageConfig::default()).unwrap();
//!
//! let mut writer = storage.open_write(Path::new("lines.txt")).unwrap();
//! writer.write_all(b"first\nsecond\n").unwrap();
//! writer.finish().unwrap();
//!
//! let mut reader = storage.open_read(Path::new("lines.txt")).unwrap();
//! let head = reader.read_range(0, 5).unwrap();
//! assert_eq!(head, b"first");
//! ```

mod local;
mod traits;

pub use local::LocalStorage;
pub use traits::{ObjectMeta, StorageBackend, StorageReader, StorageWriter};
