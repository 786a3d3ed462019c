// rust/stream-core/src/record/mod.rs

//! Boundary-delimited record reading over chunked streams.
//!
//! A [`RecordReader`] pulls chunks from a [`ChunkStream`](crate::stream::ChunkStream)
//! and splits them into records using a [`RecordBoundary`] strategy.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stream_core::memory::MemoryBlock;
//! use stream_core::record::{LineDelimited, RecordReader};
//! use stream_core::stream::MemoryChunkStream;
//!
//! let stream = MemoryChunkStream::new(vec![
//!     MemoryBlock::from("ab"),
//!     MemoryBlock::from("c\nde"),
//!     MemoryBlock::from("f\n"),
//! ]);
//! let mut reader = RecordReader::new(stream, Arc::new(LineDelimited::newline()));
//!
//! assert_eq!(reader.next_record().unwrap().unwrap(), b"abc");
//! assert_eq!(reader.next_record().unwrap().unwrap(), b"def");
//! assert!(reader.next_record().unwrap().is_none());
//! ```

mod boundary;
mod reader;

pub use boundary::{FixedSize, LineDelimited, RecordBoundary};
pub use reader::RecordReader;
