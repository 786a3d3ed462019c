// rust/stream-core/src/text/line_reader.rs

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ReaderConfig;
use crate::error::{Result, RuntimeError};
use crate::memory::MemoryBlock;
use crate::record::{LineDelimited, RecordReader};
use crate::source::DataSource;
use crate::stream::ChunkStream;
use crate::tape::Tape;

use super::ImmutableString;

/// How text lines are terminated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Decide from the first line read.
    #[default]
    Infer,
    /// `\n`
    Lf,
    /// `\r\n`
    Crlf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Infer => "infer",
            LineEnding::Lf => "lf",
            LineEnding::Crlf => "crlf",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineEnding {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "infer" => Ok(LineEnding::Infer),
            "lf" => Ok(LineEnding::Lf),
            "crlf" => Ok(LineEnding::Crlf),
            other => Err(RuntimeError::config(format!(
                "unknown line ending '{other}', expected infer, lf or crlf"
            ))),
        }
    }
}

/// Options for [`read_text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextOptions {
    pub line_ending: LineEnding,
    pub ltrim: bool,
    pub rtrim: bool,
    pub skip_empty: bool,
}

impl From<&ReaderConfig> for TextOptions {
    fn from(config: &ReaderConfig) -> Self {
        Self {
            line_ending: config.line_ending,
            ltrim: config.ltrim,
            rtrim: config.rtrim,
            skip_empty: config.skip_empty,
        }
    }
}

/// Reads UTF-8 text lines from `stream`.
pub fn read_text<S: ChunkStream>(stream: S, options: TextOptions) -> TextLineReader<S> {
    TextLineReader::new(stream, options)
}

/// A [`DataSource`] of text lines.
///
/// Lines are views into the underlying chunks whenever the record reader can
/// return them without copying; trimming never copies.
pub struct TextLineReader<S> {
    records: RecordReader<S>,
    options: TextOptions,
    line_ending: LineEnding,
    line_number: u64,
}

impl<S: ChunkStream> TextLineReader<S> {
    pub fn new(stream: S, options: TextOptions) -> Self {
        Self {
            records: RecordReader::new(stream, Arc::new(LineDelimited::newline())),
            options,
            line_ending: options.line_ending,
            line_number: 0,
        }
    }

    /// Returns the next line without its terminator.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidUtf8` if the line is not valid UTF-8, or with
    /// `TruncatedRecord` if the input does not end with a newline.
    pub fn next_line(&mut self) -> Result<Option<ImmutableString>> {
        while let Some(record) = self.records.next_record()? {
            self.line_number += 1;

            let line = self.process(record)?;
            if self.options.skip_empty && line.is_empty() {
                continue;
            }

            return Ok(Some(line));
        }

        Ok(None)
    }

    /// Number of lines consumed so far, skipped lines included.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// The line ending in effect; `Infer` until the first line is read.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn options(&self) -> &TextOptions {
        &self.options
    }

    fn process(&mut self, record: MemoryBlock) -> Result<ImmutableString> {
        if self.line_ending == LineEnding::Infer {
            self.line_ending = if record.last() == Some(&b'\r') {
                LineEnding::Crlf
            } else {
                LineEnding::Lf
            };
            tracing::debug!(line_ending = %self.line_ending, "inferred line ending");
        }

        let mut start = 0;
        let mut end = record.len();

        if self.line_ending == LineEnding::Crlf && record.last() == Some(&b'\r') {
            end -= 1;
        }
        if self.options.ltrim {
            while start < end && record[start].is_ascii_whitespace() {
                start += 1;
            }
        }
        if self.options.rtrim {
            while end > start && record[end - 1].is_ascii_whitespace() {
                end -= 1;
            }
        }

        // Trimming only drops ASCII bytes, so the cut points are always on
        // character boundaries.
        let line = record.share_slice(start, end - start)?;
        ImmutableString::from_utf8(line)
    }
}

impl<S: ChunkStream> DataSource for TextLineReader<S> {
    type Item = ImmutableString;

    fn next(&mut self) -> Result<Option<ImmutableString>> {
        self.next_line()
    }

    fn reset(&mut self) -> Result<()> {
        self.records.reset()?;
        self.line_ending = self.options.line_ending;
        self.line_number = 0;
        Ok(())
    }

    fn record_position(&self, tape: &mut Tape) {
        self.records.record_position(tape);
        tape.record(self.line_number);
        tape.record(self.line_ending.as_str().to_string());
    }

    fn reload_position(&mut self, tape: &mut Tape) -> Result<()> {
        let position = tape.read::<u64>()?;
        let line_number = tape.read::<u64>()?;
        let line_ending = tape.read::<String>()?.parse()?;

        self.records.seek(position)?;
        self.line_number = line_number;
        self.line_ending = line_ending;

        tracing::debug!(position, line_number, "reloaded text reader position");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryChunkStream;

    fn text(data: &'static str, chunk_size: usize, options: TextOptions) -> TextLineReader<MemoryChunkStream> {
        read_text(MemoryChunkStream::with_chunk_size(data, chunk_size).unwrap(), options)
    }

    fn lines(reader: &mut TextLineReader<MemoryChunkStream>) -> Vec<String> {
        reader.iter().map(|l| l.unwrap().to_string()).collect()
    }

    #[test]
    fn test_lf_lines() {
        let mut reader = text("one\ntwo\n\nthree\n", 4, TextOptions::default());
        assert_eq!(lines(&mut reader), vec!["one", "two", "", "three"]);
        assert_eq!(reader.line_ending(), LineEnding::Lf);
        assert_eq!(reader.line_number(), 4);
    }

    #[test]
    fn test_infers_crlf() {
        let mut reader = text("one\r\ntwo\r\n", 3, TextOptions::default());
        assert_eq!(lines(&mut reader), vec!["one", "two"]);
        assert_eq!(reader.line_ending(), LineEnding::Crlf);
    }

    #[test]
    fn test_lf_keeps_carriage_return() {
        let options = TextOptions {
            line_ending: LineEnding::Lf,
            ..Default::default()
        };
        let mut reader = text("one\r\n", 16, options);
        assert_eq!(lines(&mut reader), vec!["one\r"]);
    }

    #[test]
    fn test_trim_and_skip_empty() {
        let options = TextOptions {
            ltrim: true,
            rtrim: true,
            skip_empty: true,
            ..Default::default()
        };
        let mut reader = text("  a b \n\n   \n\tc\n", 5, options);
        assert_eq!(lines(&mut reader), vec!["a b", "c"]);
        assert_eq!(reader.line_number(), 4);
    }

    #[test]
    fn test_trim_is_zero_copy() {
        let data = MemoryBlock::from("  padded  \n");
        let stream = MemoryChunkStream::new(vec![data.clone()]);
        let options = TextOptions {
            ltrim: true,
            rtrim: true,
            ..Default::default()
        };
        let mut reader = read_text(stream, options);

        let line = reader.next_line().unwrap().unwrap();
        assert_eq!(line, "padded");
        assert!(line.storage().shares_storage_with(&data));
    }

    #[test]
    fn test_invalid_utf8_line() {
        let stream = MemoryChunkStream::new(vec![MemoryBlock::from(vec![b'o', b'k', 0xFF, b'\n'])]);
        let mut reader = read_text(stream, TextOptions::default());
        let err = reader.next_line().unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidUtf8 { offset: 2 }));
    }

    #[test]
    fn test_multibyte_lines_across_chunks() {
        let mut reader = text("héllo\nwörld\n", 1, TextOptions::default());
        assert_eq!(lines(&mut reader), vec!["héllo", "wörld"]);
    }

    #[test]
    fn test_reset_restores_inference() {
        let mut reader = text("a\r\nb\r\n", 2, TextOptions::default());
        let first = lines(&mut reader);

        reader.reset().unwrap();
        assert_eq!(reader.line_ending(), LineEnding::Infer);
        assert_eq!(reader.line_number(), 0);
        assert_eq!(lines(&mut reader), first);
    }

    #[test]
    fn test_record_and_reload_position() {
        let data = "a\r\nb\r\nc\r\nd\r\n";
        let mut original = text(data, 4, TextOptions::default());
        original.next_line().unwrap();
        original.next_line().unwrap();

        let mut tape = Tape::new();
        original.record_position(&mut tape);

        let mut restored = text(data, 7, TextOptions::default());
        restored.reload_position(&mut tape).unwrap();

        assert_eq!(restored.line_number(), 2);
        assert_eq!(restored.line_ending(), LineEnding::Crlf);
        assert_eq!(lines(&mut restored), vec!["c", "d"]);
        assert_eq!(lines(&mut original), vec!["c", "d"]);
    }

    #[test]
    fn test_failed_reload_changes_nothing() {
        let mut reader = text("a\nb\nc\n", 3, TextOptions::default());
        assert_eq!(reader.next_line().unwrap().unwrap(), "a");

        // Valid offset, but the line ending value is not one we know.
        let mut bad_ending = Tape::new();
        bad_ending.record(4_u64);
        bad_ending.record(2_u64);
        bad_ending.record("cr".to_string());
        assert!(reader.reload_position(&mut bad_ending).is_err());

        // Offset past the end of the input.
        let mut bad_offset = Tape::new();
        bad_offset.record(100_u64);
        bad_offset.record(9_u64);
        bad_offset.record("crlf".to_string());
        assert!(reader.reload_position(&mut bad_offset).is_err());

        assert_eq!(reader.line_number(), 1);
        assert_eq!(reader.line_ending(), LineEnding::Lf);
        assert_eq!(lines(&mut reader), vec!["b", "c"]);
    }

    #[test]
    fn test_line_ending_from_str() {
        assert_eq!("CRLF".parse::<LineEnding>().unwrap(), LineEnding::Crlf);
        assert_eq!("lf".parse::<LineEnding>().unwrap(), LineEnding::Lf);
        assert!("cr".parse::<LineEnding>().is_err());
    }
}
