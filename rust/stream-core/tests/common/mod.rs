use std::sync::Arc;

use stream_core::{LineDelimited, MemoryChunkStream, RecordReader};

/// Joins `records` with a trailing newline after each one.
pub fn newline_input(records: &[Vec<u8>]) -> Vec<u8> {
    let mut input = Vec::new();
    for record in records {
        input.extend_from_slice(record);
        input.push(b'\n');
    }
    input
}

pub fn line_reader(input: &[u8], sizes: &[usize]) -> RecordReader<MemoryChunkStream> {
    let stream = MemoryChunkStream::with_chunk_sizes(input.to_vec(), sizes)
        .expect("chunk sizes are non-zero");
    RecordReader::new(stream, Arc::new(LineDelimited::newline()))
}

pub fn drain(reader: &mut RecordReader<MemoryChunkStream>) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    while let Some(record) = reader.next_record().expect("input ends with a newline") {
        out.push(record.to_vec());
    }
    out
}
