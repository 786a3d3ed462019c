// rust/stream-core/src/checkpoint/writer.rs

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::CheckpointConfig;
use crate::error::{Result, RuntimeError};
use crate::storage::StorageBackend;
use crate::tape::Tape;

use super::format::{checksum, CheckpointHeader, CHECKPOINT_EXTENSION};

/// Writes compressed, checksummed checkpoints.
///
/// Checkpoints are named `{name}_{millis}.ckpt` inside the configured
/// checkpoint directory. Only the newest `keep_last_n` checkpoints of each
/// name are kept.
pub struct CheckpointWriter {
    storage: Arc<dyn StorageBackend>,
    config: CheckpointConfig,
}

impl CheckpointWriter {
    pub fn new(storage: Arc<dyn StorageBackend>, config: CheckpointConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    /// Writes `data` as a checkpoint and returns the path to the saved file.
    pub fn write(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        self.write_with_metadata(name, data, HashMap::new())
    }

    /// Serializes `tape` and writes it as a checkpoint.
    pub fn write_tape(&self, name: &str, tape: &Tape) -> Result<PathBuf> {
        let data = tape.to_bytes()?;

        let mut metadata = HashMap::new();
        metadata.insert("tape_values".to_string(), tape.len().to_string());

        self.write_with_metadata(name, &data, metadata)
    }

    pub fn write_with_metadata(
        &self,
        name: &str,
        data: &[u8],
        metadata: HashMap<String, String>,
    ) -> Result<PathBuf> {
        validate_name(name)?;
        self.storage.create_dir_all(&self.config.checkpoint_dir)?;

        let (compressed, compression) = self.compress(data)?;
        let header =
            CheckpointHeader::with_metadata(compression, data.len() as u64, checksum(data), metadata);

        let mut checkpoint_data = header.encode()?;
        checkpoint_data.extend_from_slice(&compressed);

        let filename = checkpoint_filename(name, self.next_stamp(name)?);
        let final_path = self.config.checkpoint_dir.join(&filename);

        if self.config.atomic_writes {
            let temp_path = self.config.checkpoint_dir.join(format!(".{filename}.tmp"));
            self.write_to_path(&temp_path, &checkpoint_data)?;
            self.storage.rename(&temp_path, &final_path)?;
        } else {
            self.write_to_path(&final_path, &checkpoint_data)?;
        }

        tracing::info!(
            path = %final_path.display(),
            bytes = checkpoint_data.len(),
            compression = %header.compression,
            "saved checkpoint"
        );

        self.cleanup_old_checkpoints(name)?;

        Ok(final_path)
    }

    /// Checkpoints saved under `name`, oldest first.
    pub fn list(&self, name: &str) -> Result<Vec<PathBuf>> {
        let entries = self.storage.list(&self.config.checkpoint_dir)?;

        let mut matching: Vec<String> = entries
            .into_iter()
            .filter(|entry| is_checkpoint_of(entry, name))
            .collect();
        // Zero-padded timestamps sort chronologically.
        matching.sort();

        Ok(matching
            .into_iter()
            .map(|entry| self.config.checkpoint_dir.join(entry))
            .collect())
    }

    /// The most recent checkpoint saved under `name`, if any.
    pub fn latest(&self, name: &str) -> Result<Option<PathBuf>> {
        Ok(self.list(name)?.pop())
    }

    /// Current time in milliseconds, bumped past the newest existing
    /// checkpoint of `name` so saves within one millisecond never collide.
    fn next_stamp(&self, name: &str) -> Result<u128> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        let newest = self
            .storage
            .list(&self.config.checkpoint_dir)?
            .iter()
            .filter_map(|entry| checkpoint_stamp(entry, name))
            .max();

        match newest {
            Some(stamp) if stamp >= now => stamp
                .checked_add(1)
                .ok_or_else(|| RuntimeError::checkpoint("checkpoint timestamp overflow")),
            _ => Ok(now),
        }
    }

    fn compress(&self, data: &[u8]) -> Result<(Vec<u8>, String)> {
        let compression = self.config.compression.as_str();

        let compressed = match compression {
            "none" => data.to_vec(),
            "lz4" => lz4_flex::compress_prepend_size(data),
            "zstd" => zstd::encode_all(data, self.config.compression_level)
                .map_err(|e| RuntimeError::checkpoint_with_source("zstd compression failed", e))?,
            _ => {
                return Err(RuntimeError::checkpoint(format!(
                    "unknown compression algorithm: {compression}"
                )));
            }
        };

        Ok((compressed, compression.to_string()))
    }

    fn write_to_path(&self, path: &Path, data: &[u8]) -> Result<()> {
        let mut writer = self.storage.open_write(path)?;
        writer
            .write_all(data)
            .map_err(|e| RuntimeError::checkpoint_with_source("failed to write checkpoint data", e))?;
        writer.finish()
    }

    fn cleanup_old_checkpoints(&self, name: &str) -> Result<()> {
        let checkpoints = self.list(name)?;
        if checkpoints.len() <= self.config.keep_last_n {
            return Ok(());
        }

        let to_delete = checkpoints.len() - self.config.keep_last_n;
        for path in checkpoints.iter().take(to_delete) {
            match self.storage.delete(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed old checkpoint"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove old checkpoint"),
            }
        }

        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(RuntimeError::checkpoint(format!(
            "invalid checkpoint name '{name}'"
        )));
    }
    Ok(())
}

fn checkpoint_filename(name: &str, stamp: u128) -> String {
    format!("{name}_{stamp:020}.{CHECKPOINT_EXTENSION}")
}

/// The timestamp of `entry` if it is `{name}_{digits}.ckpt`.
fn checkpoint_stamp(entry: &str, name: &str) -> Option<u128> {
    entry
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(CHECKPOINT_EXTENSION))
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|stamp| !stamp.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|stamp| stamp.parse().ok())
}

fn is_checkpoint_of(entry: &str, name: &str) -> bool {
    checkpoint_stamp(entry, name).is_some()
}
