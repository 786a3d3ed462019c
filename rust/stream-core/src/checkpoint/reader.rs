// rust/stream-core/src/checkpoint/reader.rs

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, RuntimeError};
use crate::storage::StorageBackend;
use crate::tape::Tape;

use super::format::{checksum, CheckpointHeader};

/// Reads and verifies checkpoints written by
/// [`CheckpointWriter`](super::CheckpointWriter).
pub struct CheckpointReader {
    storage: Arc<dyn StorageBackend>,
}

impl CheckpointReader {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Reads and decompresses a checkpoint payload.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The header is malformed or has the wrong magic or version
    /// - Decompression fails
    /// - The checksum or size doesn't match
    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let (header, payload) = self.read_parts(path)?;
        self.verify(&header, payload)
    }

    /// Reads a checkpoint together with its header.
    pub fn read_with_header(&self, path: &Path) -> Result<(CheckpointHeader, Vec<u8>)> {
        let (header, payload) = self.read_parts(path)?;
        let data = self.verify(&header, payload)?;
        Ok((header, data))
    }

    /// Reads a checkpoint holding a position tape.
    pub fn read_tape(&self, path: &Path) -> Result<Tape> {
        let data = self.read(path)?;
        let tape = Tape::from_bytes(&data)?;

        tracing::info!(path = %path.display(), values = tape.len(), "loaded checkpoint");
        Ok(tape)
    }

    /// Reads only the header of a checkpoint.
    pub fn read_header(&self, path: &Path) -> Result<CheckpointHeader> {
        let mut reader = self.storage.open_read(path)?;

        let mut len_bytes = [0u8; 4];
        reader
            .read_exact(&mut len_bytes)
            .map_err(|e| RuntimeError::checkpoint_with_source("failed to read header length", e))?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;

        let size = reader.size();
        if 4 + header_len as u64 > size {
            return Err(RuntimeError::checkpoint(format!(
                "header length {header_len} exceeds checkpoint file size {size}"
            )));
        }

        let mut prefixed = Vec::with_capacity(4 + header_len);
        prefixed.extend_from_slice(&len_bytes);
        prefixed.resize(4 + header_len, 0);
        reader
            .read_exact(&mut prefixed[4..])
            .map_err(|e| RuntimeError::checkpoint_with_source("failed to read header", e))?;

        let (header, _) = CheckpointHeader::decode(&prefixed)?;
        Ok(header)
    }

    fn read_parts(&self, path: &Path) -> Result<(CheckpointHeader, Vec<u8>)> {
        let mut reader = self.storage.open_read(path)?;
        let mut checkpoint_data = Vec::new();
        reader
            .read_to_end(&mut checkpoint_data)
            .map_err(|e| RuntimeError::checkpoint_with_source("failed to read checkpoint file", e))?;

        let (header, payload_start) = CheckpointHeader::decode(&checkpoint_data)?;
        let payload = self.decompress(&checkpoint_data[payload_start..], &header.compression)?;

        Ok((header, payload))
    }

    fn verify(&self, header: &CheckpointHeader, data: Vec<u8>) -> Result<Vec<u8>> {
        let computed = checksum(&data);
        if computed != header.checksum {
            return Err(RuntimeError::checkpoint(format!(
                "checksum mismatch: expected {}, got {}",
                header.checksum, computed
            )));
        }

        if data.len() as u64 != header.uncompressed_size {
            return Err(RuntimeError::checkpoint(format!(
                "size mismatch: expected {}, got {}",
                header.uncompressed_size,
                data.len()
            )));
        }

        Ok(data)
    }

    fn decompress(&self, data: &[u8], compression: &str) -> Result<Vec<u8>> {
        match compression {
            "none" => Ok(data.to_vec()),
            "lz4" => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| RuntimeError::checkpoint_with_source("lz4 decompression failed", e)),
            "zstd" => zstd::decode_all(data)
                .map_err(|e| RuntimeError::checkpoint_with_source("zstd decompression failed", e)),
            _ => Err(RuntimeError::checkpoint(format!(
                "unknown compression algorithm: {compression}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointWriter;
    use crate::config::{CheckpointConfig, StorageConfig};
    use crate::storage::LocalStorage;
    use std::io::Write as IoWrite;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_setup(
        compression: &str,
    ) -> (CheckpointWriter, CheckpointReader, Arc<dyn StorageBackend>, TempDir) {
        let temp_dir = TempDir::new().unwrap();

        let storage_config = StorageConfig {
            base_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };
        let storage: Arc<dyn StorageBackend> =
            Arc::new(LocalStorage::new(&storage_config).unwrap());

        let checkpoint_config = CheckpointConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            compression: compression.to_string(),
            compression_level: 3,
            keep_last_n: 10,
            atomic_writes: true,
        };

        let writer = CheckpointWriter::new(storage.clone(), checkpoint_config);
        let reader = CheckpointReader::new(storage.clone());

        (writer, reader, storage, temp_dir)
    }

    #[test]
    fn test_roundtrip_all_compressions() {
        for compression in ["none", "lz4", "zstd"] {
            let (writer, reader, _, _temp) = create_test_setup(compression);

            let data = b"position data with repeated content content content";
            let path = writer.write("roundtrip", data).unwrap();

            assert_eq!(reader.read(&path).unwrap(), data);
        }
    }

    #[test]
    fn test_tape_roundtrip() {
        for compression in ["none", "lz4", "zstd"] {
            let (writer, reader, _, _temp) = create_test_setup(compression);

            let mut tape = Tape::new();
            tape.record(42_u64);
            tape.record(7_i64);
            tape.record("crlf".to_string());

            let path = writer.write_tape("reader", &tape).unwrap();
            let mut loaded = reader.read_tape(&path).unwrap();

            assert_eq!(loaded.read::<u64>().unwrap(), 42);
            assert_eq!(loaded.read::<i64>().unwrap(), 7);
            assert_eq!(loaded.read::<String>().unwrap(), "crlf");
            assert_eq!(loaded.remaining(), 0);
        }
    }

    #[test]
    fn test_compression_ratio() {
        let (writer, _, storage, _temp) = create_test_setup("lz4");

        let data = vec![b'a'; 10_000];
        let path = writer.write("compressible", &data).unwrap();

        let meta = storage.metadata(&path).unwrap();
        assert!(meta.size < data.len() as u64);
    }

    #[test]
    fn test_checksum_mismatch() {
        let (writer, _, storage, _temp) = create_test_setup("none");

        let path = writer.write("corrupt", b"original position data").unwrap();

        let mut checkpoint_data = Vec::new();
        storage
            .open_read(&path)
            .unwrap()
            .read_to_end(&mut checkpoint_data)
            .unwrap();

        // Flip a payload byte
        let last = checkpoint_data.len() - 1;
        checkpoint_data[last] ^= 0xFF;

        let mut w = storage.open_write(&path).unwrap();
        w.write_all(&checkpoint_data).unwrap();
        w.finish().unwrap();

        let reader = CheckpointReader::new(storage);
        let err = reader.read(&path).unwrap_err();
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn test_invalid_magic() {
        let (_, reader, _, temp_dir) = create_test_setup("none");

        let path = temp_dir.path().join("checkpoints/invalid_magic.ckpt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut header = CheckpointHeader::new("none".to_string(), 4, 0);
        header.magic = *b"XXXX";
        let mut file_data = header.encode().unwrap();
        file_data.extend_from_slice(b"data");
        std::fs::write(&path, &file_data).unwrap();

        let err = reader.read(&path).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_read_header() {
        let (writer, reader, _, _temp) = create_test_setup("zstd");

        let mut tape = Tape::new();
        tape.record(3_u64);
        let path = writer.write_tape("header_test", &tape).unwrap();

        let header = reader.read_header(&path).unwrap();

        assert_eq!(header.magic, CheckpointHeader::MAGIC);
        assert_eq!(header.compression, "zstd");
        assert_eq!(header.uncompressed_size, tape.to_bytes().unwrap().len() as u64);
        assert_eq!(header.metadata.get("tape_values"), Some(&"1".to_string()));

        let (full_header, _) = reader.read_with_header(&path).unwrap();
        assert_eq!(full_header.checksum, header.checksum);
    }

    #[test]
    fn test_read_header_rejects_oversized_length() {
        let (_, reader, _, temp_dir) = create_test_setup("none");

        let path = temp_dir.path().join("checkpoints/huge_header.ckpt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut file_data = u32::MAX.to_le_bytes().to_vec();
        file_data.extend_from_slice(b"short");
        std::fs::write(&path, &file_data).unwrap();

        let err = reader.read_header(&path).unwrap_err();
        assert!(err.to_string().contains("exceeds checkpoint file size 9"));
        assert!(reader.read(&path).is_err());
    }

    #[test]
    fn test_missing_checkpoint() {
        let (_, reader, _, _temp) = create_test_setup("none");
        assert!(reader.read(Path::new("checkpoints/missing.ckpt")).is_err());
    }
}
