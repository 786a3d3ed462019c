// rust/stream-core/src/config.rs

//! Configuration for the stream runtime.
//!
//! Configuration is parsed from TOML, may be overridden through `STREAM_`
//! environment variables, and is validated before use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Result, RuntimeError};
use crate::text::LineEnding;

// Top-level runtime configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub storage: StorageConfig,
    pub reader: ReaderConfig,
    pub checkpoint: CheckpointConfig,
}

// Storage configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    // Base path that input and checkpoint paths are resolved against.
    pub base_path: PathBuf,
    // Buffer size in bytes for buffered file I/O.
    pub buffer_size: usize,
    // Whether to memory-map large inputs.
    pub use_mmap: bool,
    // File size threshold (bytes) at or above which inputs are memory-mapped.
    pub mmap_threshold: u64,
}

/// Record reader options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Size in bytes of the chunks pulled from storage.
    pub chunk_size: usize,
    /// Record delimiter; must be a single ASCII character.
    pub delimiter: char,
    /// Line ending handling for text readers.
    pub line_ending: LineEnding,
    /// Strip leading ASCII whitespace from text lines.
    pub ltrim: bool,
    /// Strip trailing ASCII whitespace from text lines.
    pub rtrim: bool,
    /// Skip text lines that are empty after trimming.
    pub skip_empty: bool,
}

// Checkpoint configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    // Directory for storing checkpoints, relative to the storage base path.
    pub checkpoint_dir: PathBuf,
    // Compression algorithm: "none", "lz4", or "zstd".
    pub compression: String,
    // Compression level (zstd only).
    pub compression_level: i32,
    // Number of recent checkpoints to keep per name.
    pub keep_last_n: usize,
    // Whether to write to a temp file and rename into place.
    pub atomic_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./data"),
            buffer_size: 64 * 1024, // 64 KB
            use_mmap: true,
            mmap_threshold: 1024 * 1024, // 1 MB
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024, // 64 KB
            delimiter: '\n',
            line_ending: LineEnding::Infer,
            ltrim: false,
            rtrim: false,
            skip_empty: false,
        }
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: PathBuf::from("./checkpoints"),
            compression: "lz4".to_string(),
            compression_level: 1,
            keep_last_n: 3,
            atomic_writes: true,
        }
    }
}

impl ReaderConfig {
    /// The delimiter as a byte.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the delimiter is not ASCII.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            return Err(RuntimeError::config(format!(
                "reader.delimiter must be an ASCII character, got {:?}",
                self.delimiter
            )));
        }
        Ok(self.delimiter as u8)
    }
}

impl FromStr for RuntimeConfig {
    type Err = RuntimeError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| RuntimeError::config_with_source("failed to parse TOML config", e))
    }
}

impl RuntimeConfig {
    // Load configuration from a TOML file.
    //
    // # Errors
    //
    // Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::storage_with_source(path, "failed to read config file", e)
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // Variables are prefixed with `STREAM_` followed by the section and field
    // name, e.g. `STREAM_READER_CHUNK_SIZE` overrides `reader.chunk_size`.
    // Values that fail to parse are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        // Storage overrides
        if let Ok(val) = std::env::var("STREAM_STORAGE_BASE_PATH") {
            self.storage.base_path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("STREAM_STORAGE_BUFFER_SIZE") {
            if let Ok(v) = val.parse() {
                self.storage.buffer_size = v;
            }
        }
        if let Ok(val) = std::env::var("STREAM_STORAGE_USE_MMAP") {
            if let Ok(v) = val.parse() {
                self.storage.use_mmap = v;
            }
        }
        if let Ok(val) = std::env::var("STREAM_STORAGE_MMAP_THRESHOLD") {
            if let Ok(v) = val.parse() {
                self.storage.mmap_threshold = v;
            }
        }

        // Reader overrides
        if let Ok(val) = std::env::var("STREAM_READER_CHUNK_SIZE") {
            if let Ok(v) = val.parse() {
                self.reader.chunk_size = v;
            }
        }
        if let Ok(val) = std::env::var("STREAM_READER_DELIMITER") {
            if let Ok(v) = val.parse() {
                self.reader.delimiter = v;
            }
        }
        if let Ok(val) = std::env::var("STREAM_READER_LINE_ENDING") {
            if let Ok(v) = val.parse() {
                self.reader.line_ending = v;
            }
        }
        if let Ok(val) = std::env::var("STREAM_READER_LTRIM") {
            if let Ok(v) = val.parse() {
                self.reader.ltrim = v;
            }
        }
        if let Ok(val) = std::env::var("STREAM_READER_RTRIM") {
            if let Ok(v) = val.parse() {
                self.reader.rtrim = v;
            }
        }
        if let Ok(val) = std::env::var("STREAM_READER_SKIP_EMPTY") {
            if let Ok(v) = val.parse() {
                self.reader.skip_empty = v;
            }
        }

        // Checkpoint overrides
        if let Ok(val) = std::env::var("STREAM_CHECKPOINT_DIR") {
            self.checkpoint.checkpoint_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("STREAM_CHECKPOINT_COMPRESSION") {
            self.checkpoint.compression = val;
        }
        if let Ok(val) = std::env::var("STREAM_CHECKPOINT_COMPRESSION_LEVEL") {
            if let Ok(v) = val.parse() {
                self.checkpoint.compression_level = v;
            }
        }
        if let Ok(val) = std::env::var("STREAM_CHECKPOINT_KEEP_LAST_N") {
            if let Ok(v) = val.parse() {
                self.checkpoint.keep_last_n = v;
            }
        }
        if let Ok(val) = std::env::var("STREAM_CHECKPOINT_ATOMIC_WRITES") {
            if let Ok(v) = val.parse() {
                self.checkpoint.atomic_writes = v;
            }
        }

        self
    }

    // Validate all configuration values.
    //
    // # Errors
    //
    // Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.buffer_size == 0 {
            return Err(RuntimeError::config(
                "storage.buffer_size must be greater than 0",
            ));
        }

        if self.reader.chunk_size == 0 {
            return Err(RuntimeError::config(
                "reader.chunk_size must be greater than 0",
            ));
        }
        self.reader.delimiter_byte()?;

        let valid_compression = ["none", "lz4", "zstd"];
        if !valid_compression.contains(&self.checkpoint.compression.as_str()) {
            return Err(RuntimeError::config(format!(
                "checkpoint.compression must be one of: {}",
                valid_compression.join(", ")
            )));
        }

        if self.checkpoint.keep_last_n == 0 {
            return Err(RuntimeError::config(
                "checkpoint.keep_last_n must be greater than 0",
            ));
        }

        Ok(())
    }
}
