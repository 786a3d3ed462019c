// rust/stream-core/src/runtime.rs

//! Runtime wiring of configuration, storage, readers and checkpoints.
//!
//! # Example
//!
//! ```no_run
//! use stream_core::Runtime;
//! use stream_core::source::DataSource;
//!
//! let runtime = Runtime::from_config_file("stream.toml").unwrap();
//!
//! let mut reader = runtime.open_records("events.jsonl").unwrap();
//! for _ in 0..100 {
//!     if reader.next().unwrap().is_none() {
//!         break;
//!     }
//! }
//! let checkpoint = runtime.save_position("events", &reader).unwrap();
//!
//! // Later, possibly in another process:
//! let mut resumed = runtime.open_records("events.jsonl").unwrap();
//! runtime.restore_position(&checkpoint, &mut resumed).unwrap();
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::checkpoint::{CheckpointHeader, CheckpointReader, CheckpointWriter};
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::record::{FixedSize, LineDelimited, RecordBoundary, RecordReader};
use crate::source::DataSource;
use crate::storage::{LocalStorage, StorageBackend};
use crate::stream::StorageChunkStream;
use crate::tape::Tape;
use crate::text::{TextLineReader, TextOptions};

/// Owns the storage backend and checkpoint machinery for a configuration.
pub struct Runtime {
    config: RuntimeConfig,
    storage: Arc<dyn StorageBackend>,
    checkpoint_writer: CheckpointWriter,
    checkpoint_reader: CheckpointReader,
}

impl Runtime {
    /// Creates a runtime from a TOML configuration file.
    ///
    /// Environment variable overrides are applied after loading the file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = RuntimeConfig::from_file(path)?.with_env_overrides();
        Self::from_config(config)
    }

    /// Creates a runtime from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the storage
    /// backend cannot be initialized.
    pub fn from_config(config: RuntimeConfig) -> Result<Self> {
        config.validate()?;

        let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(&config.storage)?);

        let checkpoint_writer = CheckpointWriter::new(storage.clone(), config.checkpoint.clone());
        let checkpoint_reader = CheckpointReader::new(storage.clone());

        Ok(Self {
            config,
            storage,
            checkpoint_writer,
            checkpoint_reader,
        })
    }

    /// Opens `path` as a stream of records split on the configured delimiter.
    pub fn open_records(&self, path: impl AsRef<Path>) -> Result<RecordReader<StorageChunkStream>> {
        let boundary = Arc::new(LineDelimited::new(self.config.reader.delimiter_byte()?));
        self.open_records_with(path, boundary)
    }

    /// Opens `path` as a stream of records split by `boundary`.
    pub fn open_records_with(
        &self,
        path: impl AsRef<Path>,
        boundary: Arc<dyn RecordBoundary>,
    ) -> Result<RecordReader<StorageChunkStream>> {
        let stream = self.open_stream(path.as_ref())?;
        Ok(RecordReader::new(stream, boundary))
    }

    /// Opens `path` as UTF-8 text lines using the configured text options.
    pub fn open_text(&self, path: impl AsRef<Path>) -> Result<TextLineReader<StorageChunkStream>> {
        let stream = self.open_stream(path.as_ref())?;
        Ok(TextLineReader::new(stream, TextOptions::from(&self.config.reader)))
    }

    /// Records the position of `source` and saves it as a checkpoint named
    /// `name`.
    pub fn save_position<S: DataSource>(&self, name: &str, source: &S) -> Result<PathBuf> {
        let mut tape = Tape::new();
        source.record_position(&mut tape);
        self.checkpoint_writer.write_tape(name, &tape)
    }

    /// Reloads the position saved in the checkpoint at `path` into `source`.
    pub fn restore_position<S: DataSource>(
        &self,
        path: impl AsRef<Path>,
        source: &mut S,
    ) -> Result<()> {
        let path = path.as_ref();
        let mut tape = self.checkpoint_reader.read_tape(path)?;
        source.reload_position(&mut tape)?;

        if tape.remaining() > 0 {
            tracing::warn!(
                path = %path.display(),
                remaining = tape.remaining(),
                "checkpoint holds values the source did not read"
            );
        }

        tracing::info!(path = %path.display(), "restored position");
        Ok(())
    }

    /// The newest checkpoint saved under `name`, if any.
    pub fn latest_checkpoint(&self, name: &str) -> Result<Option<PathBuf>> {
        self.checkpoint_writer.latest(name)
    }

    /// Reads the tape stored in a checkpoint.
    pub fn load_tape(&self, path: impl AsRef<Path>) -> Result<Tape> {
        self.checkpoint_reader.read_tape(path.as_ref())
    }

    pub fn checkpoint_header(&self, path: impl AsRef<Path>) -> Result<CheckpointHeader> {
        self.checkpoint_reader.read_header(path.as_ref())
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    fn open_stream(&self, path: &Path) -> Result<StorageChunkStream> {
        StorageChunkStream::open(&self.storage, path, self.config.reader.chunk_size)
    }
}

/// Parses a record format string into a boundary strategy.
///
/// Supported formats:
/// - "line" - records terminated by `delimiter`
/// - "fixed:N" - records of exactly N bytes
pub fn parse_boundary(format: &str, delimiter: u8) -> Result<Arc<dyn RecordBoundary>> {
    if let Some(size_str) = format.strip_prefix("fixed:") {
        let size: usize = size_str.parse().map_err(|_| {
            RuntimeError::config(format!("invalid fixed record size: '{size_str}'"))
        })?;
        return Ok(Arc::new(FixedSize::new(size)?));
    }

    match format {
        "line" => Ok(Arc::new(LineDelimited::new(delimiter))),
        _ => Err(RuntimeError::config(format!(
            "unknown record format: '{format}'. Expected 'line' or 'fixed:N'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CountDataSource;
    use crate::text::LineEnding;
    use tempfile::TempDir;

    fn create_test_runtime(chunk_size: usize) -> (Runtime, TempDir) {
        let temp_dir = TempDir::new().unwrap();

        let mut config = RuntimeConfig::default();
        config.storage.base_path = temp_dir.path().to_path_buf();
        config.reader.chunk_size = chunk_size;
        config.checkpoint.checkpoint_dir = PathBuf::from("checkpoints");

        let runtime = Runtime::from_config(config).unwrap();
        (runtime, temp_dir)
    }

    fn create_test_file(temp_dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        std::fs::write(temp_dir.path().join(name), content).unwrap();
        PathBuf::from(name)
    }

    fn drain_records(reader: &mut RecordReader<StorageChunkStream>) -> Vec<Vec<u8>> {
        reader.iter().map(|r| r.unwrap().to_vec()).collect()
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let mut config = RuntimeConfig::default();
        config.reader.chunk_size = 0;
        assert!(Runtime::from_config(config).is_err());
    }

    #[test]
    fn test_open_records() {
        let (runtime, temp_dir) = create_test_runtime(3);
        let path = create_test_file(&temp_dir, "data.txt", b"alpha\nbeta\ngamma\n");

        let mut reader = runtime.open_records(&path).unwrap();
        assert_eq!(
            drain_records(&mut reader),
            vec![b"alpha".to_vec(), b"beta".to_vec(), b"gamma".to_vec()]
        );
    }

    #[test]
    fn test_open_records_custom_delimiter() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = RuntimeConfig::default();
        config.storage.base_path = temp_dir.path().to_path_buf();
        config.reader.delimiter = ',';
        let runtime = Runtime::from_config(config).unwrap();

        let path = create_test_file(&temp_dir, "data.csv", b"a,b,c,");
        let mut reader = runtime.open_records(&path).unwrap();
        assert_eq!(
            drain_records(&mut reader),
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
        );
    }

    #[test]
    fn test_open_text() {
        let (runtime, temp_dir) = create_test_runtime(4);
        let path = create_test_file(&temp_dir, "lines.txt", b"one\r\ntwo\r\n");

        let mut reader = runtime.open_text(&path).unwrap();
        let lines: Vec<String> = reader.iter().map(|l| l.unwrap().to_string()).collect();

        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(reader.line_ending(), LineEnding::Crlf);
    }

    #[test]
    fn test_save_and_restore_position() {
        let (runtime, temp_dir) = create_test_runtime(5);
        let path = create_test_file(&temp_dir, "data.txt", b"r1\nr2\nr3\nr4\nr5\n");

        let mut reader = runtime.open_records(&path).unwrap();
        reader.next().unwrap();
        reader.next().unwrap();

        let checkpoint = runtime.save_position("data", &reader).unwrap();
        assert_eq!(runtime.latest_checkpoint("data").unwrap(), Some(checkpoint.clone()));

        let mut resumed = runtime.open_records(&path).unwrap();
        runtime.restore_position(&checkpoint, &mut resumed).unwrap();

        assert_eq!(drain_records(&mut resumed), drain_records(&mut reader));
    }

    #[test]
    fn test_restore_into_wrong_source_fails() {
        let (runtime, temp_dir) = create_test_runtime(5);
        let path = create_test_file(&temp_dir, "data.txt", b"r1\n");

        let mut counter = CountDataSource::new(5);
        counter.next().unwrap();
        let checkpoint = runtime.save_position("counter", &counter).unwrap();

        let mut reader = runtime.open_records(&path).unwrap();
        let err = runtime.restore_position(&checkpoint, &mut reader).unwrap_err();
        assert!(matches!(err, RuntimeError::TapeMismatch { .. }));
    }

    #[test]
    fn test_load_tape_and_header() {
        let (runtime, _temp) = create_test_runtime(5);

        let counter = CountDataSource::new(9);
        let checkpoint = runtime.save_position("counter", &counter).unwrap();

        let mut tape = runtime.load_tape(&checkpoint).unwrap();
        assert_eq!(tape.read::<i64>().unwrap(), 9);

        let header = runtime.checkpoint_header(&checkpoint).unwrap();
        assert_eq!(header.compression, "lz4");
    }

    #[test]
    fn test_latest_checkpoint_missing() {
        let (runtime, _temp) = create_test_runtime(5);
        assert!(runtime.latest_checkpoint("nothing").unwrap().is_none());
    }

    #[test]
    fn test_parse_boundary() {
        assert_eq!(parse_boundary("line", b'\n').unwrap().name(), "line-delimited");
        assert_eq!(parse_boundary("fixed:8", b'\n').unwrap().name(), "fixed-size");
        assert!(parse_boundary("fixed:0", b'\n').is_err());
        assert!(parse_boundary("fixed:x", b'\n').is_err());
        assert!(parse_boundary("length-prefixed", b'\n').is_err());
    }

    #[test]
    fn test_open_records_with_fixed_size() {
        let (runtime, temp_dir) = create_test_runtime(3);
        let path = create_test_file(&temp_dir, "data.bin", b"aaaabbbb");

        let boundary = parse_boundary("fixed:4", b'\n').unwrap();
        let mut reader = runtime.open_records_with(&path, boundary).unwrap();

        assert_eq!(
            drain_records(&mut reader),
            vec![b"aaaa".to_vec(), b"bbbb".to_vec()]
        );
    }
}
