use std::io::Write;
use std::path::{Path, PathBuf};

use stream_core::{
    parse_boundary, DataSource, RecordReader, Result, Runtime, RuntimeError, StorageChunkStream,
    TapeValue,
};

#[derive(Debug, Default)]
pub struct RecordsOptions {
    pub limit: Option<usize>,
    pub resume: Option<PathBuf>,
    pub save: Option<String>,
    pub format: String,
}

/// Writes records as lossy UTF-8, one per line.
///
/// Returns the number of records written and the checkpoint path, if one was
/// saved.
pub fn records(
    runtime: &Runtime,
    path: &Path,
    options: &RecordsOptions,
    out: &mut impl Write,
) -> Result<(usize, Option<PathBuf>)> {
    let mut reader = open(runtime, path, &options.format)?;

    if let Some(checkpoint) = &options.resume {
        runtime.restore_position(checkpoint, &mut reader)?;
    }

    let mut written = 0;
    while options.limit.map_or(true, |limit| written < limit) {
        let Some(record) = reader.next_record()? else {
            break;
        };
        write_line(out, &String::from_utf8_lossy(&record))?;
        written += 1;
    }

    let saved = match &options.save {
        Some(name) => Some(runtime.save_position(name, &reader)?),
        None => None,
    };

    tracing::debug!(records = written, position = reader.position(), "finished reading");
    Ok((written, saved))
}

/// Drains `path` and returns the number of records.
pub fn count(runtime: &Runtime, path: &Path, format: &str) -> Result<usize> {
    let mut reader = open(runtime, path, format)?;

    let mut total = 0;
    while reader.next()?.is_some() {
        total += 1;
    }
    Ok(total)
}

/// Prints a checkpoint header followed by its tape values.
pub fn inspect(runtime: &Runtime, checkpoint: &Path, out: &mut impl Write) -> Result<()> {
    let header = runtime.checkpoint_header(checkpoint)?;
    let tape = runtime.load_tape(checkpoint)?;

    write_line(out, &format!("checkpoint: {}", checkpoint.display()))?;
    write_line(out, &format!("magic: {}", String::from_utf8_lossy(&header.magic)))?;
    write_line(out, &format!("version: {}", header.version))?;
    write_line(out, &format!("compression: {}", header.compression))?;
    write_line(out, &format!("size: {}", header.uncompressed_size))?;
    write_line(out, &format!("checksum: {:016x}", header.checksum))?;

    let mut metadata: Vec<_> = header.metadata.iter().collect();
    metadata.sort();
    for (key, value) in metadata {
        write_line(out, &format!("metadata.{key}: {value}"))?;
    }

    write_line(out, &format!("tape: {} value(s)", tape.len()))?;
    for (index, value) in tape.values().iter().enumerate() {
        write_line(out, &format!("  [{index}] {}: {}", value.kind(), describe(value)))?;
    }

    Ok(())
}

pub fn write_line(out: &mut impl Write, line: &str) -> Result<()> {
    writeln!(out, "{line}")
        .map_err(|e| RuntimeError::storage_with_source("<stdout>", "failed to write output", e))
}

fn open(runtime: &Runtime, path: &Path, format: &str) -> Result<RecordReader<StorageChunkStream>> {
    let delimiter = runtime.config().reader.delimiter_byte()?;
    let boundary = parse_boundary(format, delimiter)?;
    runtime.open_records_with(path, boundary)
}

fn describe(value: &TapeValue) -> String {
    match value {
        TapeValue::Bool(v) => v.to_string(),
        TapeValue::Int(v) => v.to_string(),
        TapeValue::UInt(v) => v.to_string(),
        TapeValue::Float(v) => v.to_string(),
        TapeValue::String(v) => format!("{v:?}"),
        TapeValue::Bytes(v) => format!("{} byte(s)", v.len()),
    }
}
