// rust/stream-core/src/text/mod.rs

//! UTF-8 text built on shared memory blocks.

mod immutable_string;
mod line_reader;

pub use immutable_string::ImmutableString;
pub use line_reader::{read_text, LineEnding, TextLineReader, TextOptions};
