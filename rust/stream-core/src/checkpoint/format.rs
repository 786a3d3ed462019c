// rust/stream-core/src/checkpoint/format.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hasher;

use twox_hash::XxHash64;

use crate::error::{Result, RuntimeError};

/// File extension of checkpoint files.
pub const CHECKPOINT_EXTENSION: &str = "ckpt";

/// Header for a checkpoint file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointHeader {
    /// Magic bytes identifying a position checkpoint ("STPC")
    pub magic: [u8; 4],
    pub version: u32,
    /// Compression algorithm used ("none", "lz4", or "zstd")
    pub compression: String,
    pub uncompressed_size: u64,
    /// XXHash64 checksum of the uncompressed payload
    pub checksum: u64,
    pub metadata: HashMap<String, String>,
}

impl CheckpointHeader {
    pub const MAGIC: [u8; 4] = *b"STPC";

    pub const VERSION: u32 = 1;

    pub fn new(compression: String, uncompressed_size: u64, checksum: u64) -> Self {
        Self::with_metadata(compression, uncompressed_size, checksum, HashMap::new())
    }

    pub fn with_metadata(
        compression: String,
        uncompressed_size: u64,
        checksum: u64,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            compression,
            uncompressed_size,
            checksum,
            metadata,
        }
    }

    pub fn validate_magic(&self) -> bool {
        self.magic == Self::MAGIC
    }

    pub fn validate_version(&self) -> bool {
        self.version == Self::VERSION
    }

    /// Serializes the header with its little-endian length prefix.
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        let header_bytes = bincode::serialize(self)
            .map_err(|e| RuntimeError::checkpoint_with_source("failed to serialize header", e))?;

        let header_len = u32::try_from(header_bytes.len())
            .map_err(|_| RuntimeError::checkpoint("checkpoint header too large"))?;

        let mut out = Vec::with_capacity(4 + header_bytes.len());
        out.extend_from_slice(&header_len.to_le_bytes());
        out.extend_from_slice(&header_bytes);
        Ok(out)
    }

    /// Parses a length-prefixed header from the start of `data`.
    ///
    /// Returns the header and the offset at which the payload starts.
    pub(crate) fn decode(data: &[u8]) -> Result<(Self, usize)> {
        let len_bytes: [u8; 4] = data
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| RuntimeError::checkpoint("checkpoint file too small"))?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;

        let header_bytes = data.get(4..4 + header_len).ok_or_else(|| {
            RuntimeError::checkpoint("checkpoint file truncated: header incomplete")
        })?;

        let header: Self = bincode::deserialize(header_bytes)
            .map_err(|e| RuntimeError::checkpoint_with_source("failed to deserialize header", e))?;

        if !header.validate_magic() {
            return Err(RuntimeError::checkpoint(format!(
                "invalid magic bytes: expected {:?}, got {:?}",
                Self::MAGIC,
                header.magic
            )));
        }
        if !header.validate_version() {
            return Err(RuntimeError::checkpoint(format!(
                "unsupported version: expected {}, got {}",
                Self::VERSION,
                header.version
            )));
        }

        Ok((header, 4 + header_len))
    }
}

/// XXHash64 checksum of `data`.
pub(crate) fn checksum(data: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(data);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_new() {
        let header = CheckpointHeader::new("lz4".to_string(), 1000, 12345);

        assert_eq!(header.magic, CheckpointHeader::MAGIC);
        assert_eq!(header.version, CheckpointHeader::VERSION);
        assert_eq!(header.compression, "lz4");
        assert_eq!(header.uncompressed_size, 1000);
        assert!(header.metadata.is_empty());
    }

    #[test]
    fn test_encode_decode() {
        let mut metadata = HashMap::new();
        metadata.insert("tape_values".to_string(), "3".to_string());
        let header = CheckpointHeader::with_metadata("zstd".to_string(), 24, 99, metadata);

        let mut data = header.encode().unwrap();
        let header_end = data.len();
        data.extend_from_slice(b"payload");

        let (decoded, offset) = CheckpointHeader::decode(&data).unwrap();
        assert_eq!(offset, header_end);
        assert_eq!(&data[offset..], b"payload");
        assert_eq!(decoded.compression, "zstd");
        assert_eq!(decoded.checksum, 99);
        assert_eq!(decoded.metadata.get("tape_values"), Some(&"3".to_string()));
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(CheckpointHeader::decode(b"ab").is_err());

        let mut truncated = CheckpointHeader::new("none".to_string(), 0, 0).encode().unwrap();
        truncated.truncate(truncated.len() - 1);
        assert!(CheckpointHeader::decode(&truncated).is_err());

        let mut header = CheckpointHeader::new("none".to_string(), 0, 0);
        header.magic = *b"XXXX";
        let err = CheckpointHeader::decode(&header.encode().unwrap()).unwrap_err();
        assert!(err.to_string().contains("magic"));

        let mut header = CheckpointHeader::new("none".to_string(), 0, 0);
        header.version = 999;
        let err = CheckpointHeader::decode(&header.encode().unwrap()).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(b"hello world"), checksum(b"hello world"));
        assert_ne!(checksum(b"hello world"), checksum(b"different data"));
    }
}
