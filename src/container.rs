//! Container framing: an 8-byte symbol total followed by chunk records.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use crate::chunk_codec::ChunkCodec;
use crate::config::TruncationPolicy;
use crate::error::{HuffmanError, Result};
use crate::record::{ChunkRecord, ChunkStats};
use crate::Symbol;

pub const HEADER_LEN: usize = 8;

pub fn write_header<W: Write>(writer: &mut W, total_symbols: u64) -> Result<()> {
    writer.write_all(&total_symbols.to_be_bytes())?;
    Ok(())
}

pub fn read_header<R: Read>(reader: &mut R) -> Result<u64> {
    let mut total_bytes = [0u8; HEADER_LEN];
    reader.read_exact(&mut total_bytes).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            HuffmanError::TruncatedRecord("container header".to_string())
        }
        _ => HuffmanError::Io(e),
    })?;
    Ok(u64::from_be_bytes(total_bytes))
}

/// Writes records in ascending chunk order. The header total is written as
/// a placeholder and patched by [`ContainerWriter::finish`].
pub struct ContainerWriter<W: Write + Seek> {
    inner: W,
    header_pos: u64,
    next_index: u32,
    total_symbols: u64,
}

impl<W: Write + Seek> ContainerWriter<W> {
    pub fn new(mut inner: W) -> Result<Self> {
        let header_pos = inner.stream_position()?;
        write_header(&mut inner, 0)?;
        Ok(ContainerWriter {
            inner,
            header_pos,
            next_index: 0,
            total_symbols: 0,
        })
    }

    /// Index the next written record will carry.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    pub fn total_symbols(&self) -> u64 {
        self.total_symbols
    }

    /// Encodes and writes one chunk. Empty chunks write nothing.
    pub fn write_chunk(&mut self, chunk: &[Symbol]) -> Result<Option<ChunkStats>> {
        if chunk.is_empty() {
            return Ok(None);
        }
        let record = ChunkCodec::encode(self.next_index, chunk)?;
        self.write_record(&record).map(Some)
    }

    pub fn write_record(&mut self, record: &ChunkRecord) -> Result<ChunkStats> {
        if record.index != self.next_index {
            return Err(HuffmanError::ChunkOutOfOrder {
                expected: self.next_index,
                found: record.index,
            });
        }
        record.write_to(&mut self.inner)?;
        self.next_index += 1;
        self.total_symbols += u64::from(record.length);
        Ok(record.stats())
    }

    /// Patches the header total and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        let end = self.inner.stream_position()?;
        self.inner.seek(SeekFrom::Start(self.header_pos))?;
        write_header(&mut self.inner, self.total_symbols)?;
        self.inner.seek(SeekFrom::Start(end))?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

pub struct ContainerReader<R: Read> {
    inner: R,
    policy: TruncationPolicy,
    total_symbols: u64,
    decoded_symbols: u64,
    next_index: u32,
    truncated: bool,
}

impl<R: Read> ContainerReader<R> {
    pub fn new(mut inner: R, policy: TruncationPolicy) -> Result<Self> {
        let total_symbols = read_header(&mut inner)?;
        Ok(ContainerReader {
            inner,
            policy,
            total_symbols,
            decoded_symbols: 0,
            next_index: 0,
            truncated: false,
        })
    }

    pub fn total_symbols(&self) -> u64 {
        self.total_symbols
    }

    /// Symbols covered by the records returned so far.
    pub fn decoded_symbols(&self) -> u64 {
        self.decoded_symbols
    }

    pub fn is_complete(&self) -> bool {
        self.decoded_symbols == self.total_symbols
    }

    /// Whether reading stopped early on a tolerated truncation.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Reads the next record, or `None` once the header total is reached.
    ///
    /// Chunk indices must run 0, 1, 2, ... with no gaps. Any other index,
    /// including one that skips ahead, is [`HuffmanError::ChunkOutOfOrder`].
    pub fn next_record(&mut self) -> Result<Option<ChunkRecord>> {
        if self.decoded_symbols >= self.total_symbols {
            return Ok(None);
        }

        let record = match ChunkRecord::read_from(&mut self.inner, self.policy)? {
            Some(record) => record,
            None => return self.ended_early(),
        };

        if record.index != self.next_index {
            return Err(HuffmanError::ChunkOutOfOrder {
                expected: self.next_index,
                found: record.index,
            });
        }
        let remaining = self.total_symbols - self.decoded_symbols;
        if u64::from(record.length) > remaining {
            return Err(HuffmanError::InconsistentLength(format!(
                "chunk {} declares {} symbols but only {} remain of {}",
                record.index, record.length, remaining, self.total_symbols
            )));
        }

        self.next_index += 1;
        self.decoded_symbols += u64::from(record.length);
        Ok(Some(record))
    }

    pub fn next_chunk(&mut self) -> Result<Option<Vec<Symbol>>> {
        match self.next_record()? {
            Some(record) => ChunkCodec::decode(&record).map(Some),
            None => Ok(None),
        }
    }

    fn ended_early(&mut self) -> Result<Option<ChunkRecord>> {
        match self.policy {
            TruncationPolicy::Tolerant => {
                tracing::warn!(
                    decoded = self.decoded_symbols,
                    total = self.total_symbols,
                    "container ended before the declared symbol total"
                );
                self.truncated = true;
                Ok(None)
            }
            TruncationPolicy::Strict => Err(HuffmanError::TruncatedRecord(format!(
                "container ends after {} of {} symbols",
                self.decoded_symbols, self.total_symbols
            ))),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Splits `symbols` into `chunk_size` chunks and returns the container bytes.
pub fn compress_symbols(symbols: &[Symbol], chunk_size: usize) -> Result<Vec<u8>> {
    if chunk_size == 0 {
        return Err(HuffmanError::Config("chunk_size must be at least 1".to_string()));
    }
    let mut writer = ContainerWriter::new(Cursor::new(Vec::new()))?;
    for chunk in symbols.chunks(chunk_size) {
        writer.write_chunk(chunk)?;
    }
    Ok(writer.finish()?.into_inner())
}

pub fn decompress_symbols(container: &[u8], policy: TruncationPolicy) -> Result<Vec<Symbol>> {
    let mut reader = ContainerReader::new(container, policy)?;
    let mut symbols = Vec::with_capacity(reader.total_symbols().min(1 << 24) as usize);
    while let Some(chunk) = reader.next_chunk()? {
        symbols.extend_from_slice(&chunk);
    }
    Ok(symbols)
}
