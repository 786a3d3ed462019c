// rust/stream-core/src/memory/mod.rs

//! Reference-counted byte storage.
//!
//! A [`MemoryBlock`] is an immutable view over shared storage. Sub-ranges are
//! shared without copying, so a record found inside a stream chunk can be
//! handed out as a view of that chunk. New storage is obtained with
//! [`allocate_memory`], filled, and then frozen.

mod block;

pub use block::{allocate_memory, MemoryBlock, WritableMemoryBlock};
