// rust/stream-core/src/storage/local.rs

//! Local filesystem storage backend.
//!
//! Small objects are read through a buffered file handle. Objects at or above
//! the configured threshold are memory-mapped, and ranges read from them are
//! views into the mapping, so chunk streams over large files hand out
//! zero-copy chunks.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;

use super::traits::{ObjectMeta, StorageBackend, StorageReader, StorageWriter};
use crate::config::StorageConfig;
use crate::error::{Result, RuntimeError};
use crate::memory::{allocate_memory, MemoryBlock};

/// Local filesystem storage backend rooted at a base directory.
pub struct LocalStorage {
    base_path: PathBuf,
    buffer_size: usize,
    use_mmap: bool,
    mmap_threshold: u64,
}

impl LocalStorage {
    /// Creates a new `LocalStorage` from configuration, creating the base
    /// directory if needed.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let base_path = config.base_path.clone();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                RuntimeError::storage_with_source(&base_path, "failed to create base directory", e)
            })?;
        }

        Ok(Self {
            base_path,
            buffer_size: config.buffer_size,
            use_mmap: config.use_mmap,
            mmap_threshold: config.mmap_threshold,
        })
    }

    /// Resolves a path relative to the base path. Absolute paths are used as is.
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                fs::create_dir_all(parent).map_err(|e| {
                    RuntimeError::storage_with_source(
                        parent,
                        "failed to create parent directories",
                        e,
                    )
                })
            }
            _ => Ok(()),
        }
    }
}

impl StorageBackend for LocalStorage {
    fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.resolve_path(path).exists())
    }

    fn metadata(&self, path: &Path) -> Result<ObjectMeta> {
        let full_path = self.resolve_path(path);
        let meta = fs::metadata(&full_path).map_err(|e| {
            RuntimeError::storage_with_source(&full_path, "failed to read metadata", e)
        })?;

        Ok(ObjectMeta {
            size: meta.len(),
            is_dir: meta.is_dir(),
        })
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn StorageReader>> {
        let full_path = self.resolve_path(path);
        let file = File::open(&full_path)
            .map_err(|e| RuntimeError::storage_with_source(&full_path, "failed to open file", e))?;

        let size = file
            .metadata()
            .map_err(|e| {
                RuntimeError::storage_with_source(&full_path, "failed to read file metadata", e)
            })?
            .len();

        if self.use_mmap && size > 0 && size >= self.mmap_threshold {
            // SAFETY: The file is opened read-only; the mapping is owned by the
            // returned block storage and unmapped when the last view drops.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
                RuntimeError::storage_with_source(&full_path, "failed to memory-map file", e)
            })?;
            tracing::trace!(path = %full_path.display(), size, "memory-mapped object");

            Ok(Box::new(MmapReader::new(full_path, mmap)))
        } else {
            Ok(Box::new(LocalReader::new(
                full_path,
                file,
                size,
                self.buffer_size,
            )))
        }
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn StorageWriter>> {
        let full_path = self.resolve_path(path);
        Self::ensure_parent(&full_path)?;

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&full_path)
            .map_err(|e| {
                RuntimeError::storage_with_source(&full_path, "failed to create file", e)
            })?;

        Ok(Box::new(LocalWriter::new(full_path, file, self.buffer_size)))
    }

    fn delete(&self, path: &Path) -> Result<()> {
        let full_path = self.resolve_path(path);

        let result = if full_path.is_dir() {
            fs::remove_dir_all(&full_path)
        } else {
            fs::remove_file(&full_path)
        };
        result.map_err(|e| RuntimeError::storage_with_source(&full_path, "failed to delete", e))
    }

    fn list(&self, prefix: &Path) -> Result<Vec<String>> {
        let full_path = self.resolve_path(prefix);

        if !full_path.exists() {
            return Ok(Vec::new());
        }
        if !full_path.is_dir() {
            return Err(RuntimeError::storage(&full_path, "path is not a directory"));
        }

        let read_dir = fs::read_dir(&full_path).map_err(|e| {
            RuntimeError::storage_with_source(&full_path, "failed to read directory", e)
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| {
                RuntimeError::storage_with_source(&full_path, "failed to read directory entry", e)
            })?;
            if let Some(name) = entry.file_name().to_str() {
                entries.push(name.to_string());
            }
        }

        entries.sort();
        Ok(entries)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from_path = self.resolve_path(from);
        let to_path = self.resolve_path(to);
        Self::ensure_parent(&to_path)?;

        fs::rename(&from_path, &to_path).map_err(|e| {
            RuntimeError::storage_with_source(
                &from_path,
                format!("failed to rename to {}", to_path.display()),
                e,
            )
        })
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let full_path = self.resolve_path(path);
        fs::create_dir_all(&full_path).map_err(|e| {
            RuntimeError::storage_with_source(&full_path, "failed to create directories", e)
        })
    }
}

/// Buffered file reader. Ranges are read into freshly allocated blocks.
struct LocalReader {
    path: PathBuf,
    reader: BufReader<File>,
    size: u64,
}

impl LocalReader {
    fn new(path: PathBuf, file: File, size: u64, buffer_size: usize) -> Self {
        Self {
            path,
            reader: BufReader::with_capacity(buffer_size, file),
            size,
        }
    }
}

impl Read for LocalReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl StorageReader for LocalReader {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_range(&mut self, start: u64, length: usize) -> Result<MemoryBlock> {
        self.reader.seek(SeekFrom::Start(start)).map_err(|e| {
            RuntimeError::storage_with_source(
                &self.path,
                format!("failed to seek to position {start}"),
                e,
            )
        })?;

        let mut block = allocate_memory(length);
        self.reader.read_exact(&mut block).map_err(|e| {
            RuntimeError::storage_with_source(
                &self.path,
                format!("failed to read {length} bytes at position {start}"),
                e,
            )
        })?;

        Ok(block.freeze())
    }
}

/// Reader over a memory-mapped file. Ranges are views into the mapping.
struct MmapReader {
    path: PathBuf,
    data: MemoryBlock,
    position: usize,
}

impl MmapReader {
    fn new(path: PathBuf, mmap: Mmap) -> Self {
        Self {
            path,
            data: MemoryBlock::from(Bytes::from_owner(mmap)),
            position: 0,
        }
    }
}

impl Read for MmapReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = &self.data[self.position.min(self.data.len())..];
        let n = buf.len().min(remaining.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

impl StorageReader for MmapReader {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(&mut self, start: u64, length: usize) -> Result<MemoryBlock> {
        let start = usize::try_from(start)
            .map_err(|_| RuntimeError::storage(&self.path, format!("offset {start} too large")))?;

        self.data.share_slice(start, length).map_err(|_| {
            RuntimeError::storage(
                &self.path,
                format!(
                    "read range {}..{} exceeds file size {}",
                    start,
                    start.saturating_add(length),
                    self.data.len()
                ),
            )
        })
    }
}

/// Buffered file writer that syncs to disk on `finish`.
struct LocalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl LocalWriter {
    fn new(path: PathBuf, file: File, buffer_size: usize) -> Self {
        Self {
            path,
            writer: BufWriter::with_capacity(buffer_size, file),
        }
    }
}

impl Write for LocalWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StorageWriter for LocalWriter {
    fn finish(mut self: Box<Self>) -> Result<()> {
        self.writer.flush().map_err(|e| {
            RuntimeError::storage_with_source(&self.path, "failed to flush writer", e)
        })?;

        self.writer.get_ref().sync_all().map_err(|e| {
            RuntimeError::storage_with_source(&self.path, "failed to sync file to disk", e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage(use_mmap: bool) -> (LocalStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            base_path: temp_dir.path().to_path_buf(),
            buffer_size: 4096,
            use_mmap,
            mmap_threshold: 1024, // Low threshold for testing
        };
        let storage = LocalStorage::new(&config).unwrap();
        (storage, temp_dir)
    }

    fn write_file(storage: &LocalStorage, path: &str, data: &[u8]) {
        let mut writer = storage.open_write(Path::new(path)).unwrap();
        writer.write_all(data).unwrap();
        writer.finish().unwrap();
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_new_creates_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let new_base = temp_dir.path().join("new_subdir");

        let config = StorageConfig {
            base_path: new_base.clone(),
            ..Default::default()
        };

        let _storage = LocalStorage::new(&config).unwrap();
        assert!(new_base.exists());
    }

    #[test]
    fn test_write_and_read_back() {
        let (storage, _temp) = create_test_storage(true);
        write_file(&storage, "small.txt", b"hello world");

        let mut reader = storage.open_read(Path::new("small.txt")).unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();

        assert_eq!(buf, b"hello world");
        assert_eq!(reader.size(), 11);
    }

    #[test]
    fn test_read_range_buffered() {
        let (storage, _temp) = create_test_storage(false);
        let data = sample(2048);
        write_file(&storage, "data.bin", &data);

        let mut reader = storage.open_read(Path::new("data.bin")).unwrap();
        let range = reader.read_range(100, 50).unwrap();

        assert_eq!(range.as_slice(), &data[100..150]);
        assert!(reader.read_range(2040, 16).is_err());
    }

    #[test]
    fn test_read_range_mmap_is_zero_copy() {
        let (storage, _temp) = create_test_storage(true);
        let data = sample(4096);
        write_file(&storage, "large.bin", &data);

        let mut reader = storage.open_read(Path::new("large.bin")).unwrap();
        let whole = reader.read_range(0, 4096).unwrap();
        let part = reader.read_range(1000, 24).unwrap();

        assert_eq!(part.as_slice(), &data[1000..1024]);
        assert!(part.shares_storage_with(&whole));
        assert!(reader.read_range(4090, 10).is_err());
    }

    #[test]
    fn test_mmap_reader_read_to_end() {
        let (storage, _temp) = create_test_storage(true);
        let data = sample(2048);
        write_file(&storage, "large.bin", &data);

        let mut reader = storage.open_read(Path::new("large.bin")).unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();

        assert_eq!(buf, data);
    }

    #[test]
    fn test_metadata_and_exists() {
        let (storage, _temp) = create_test_storage(true);
        assert!(!storage.exists(Path::new("test.txt")).unwrap());

        write_file(&storage, "test.txt", b"hello");

        let meta = storage.metadata(Path::new("test.txt")).unwrap();
        assert_eq!(meta.size, 5);
        assert!(!meta.is_dir);
        assert!(storage.metadata(Path::new("missing.txt")).is_err());
    }

    #[test]
    fn test_list_sorted_and_missing() {
        let (storage, _temp) = create_test_storage(true);
        for name in ["c.txt", "a.txt", "b.txt"] {
            write_file(&storage, &format!("dir/{name}"), b"data");
        }

        assert_eq!(
            storage.list(Path::new("dir")).unwrap(),
            vec!["a.txt", "b.txt", "c.txt"]
        );
        assert!(storage.list(Path::new("nonexistent")).unwrap().is_empty());
        assert!(storage.list(Path::new("dir/a.txt")).is_err());
    }

    #[test]
    fn test_rename_and_delete() {
        let (storage, _temp) = create_test_storage(true);
        write_file(&storage, "old.txt", b"hello");

        storage
            .rename(Path::new("old.txt"), Path::new("a/b/new.txt"))
            .unwrap();
        assert!(!storage.exists(Path::new("old.txt")).unwrap());
        assert!(storage.exists(Path::new("a/b/new.txt")).unwrap());

        storage.delete(Path::new("a")).unwrap();
        assert!(!storage.exists(Path::new("a")).unwrap());
        assert!(storage.delete(Path::new("a")).is_err());
    }

    #[test]
    fn test_overwrite_file() {
        let (storage, _temp) = create_test_storage(true);
        write_file(&storage, "file.txt", b"initial");
        write_file(&storage, "file.txt", b"new");

        let mut reader = storage.open_read(Path::new("file.txt")).unwrap();
        assert_eq!(reader.read_range(0, 3).unwrap(), b"new");
    }
}
