//! Whole-stream compression and decompression of UTF-8 text.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::chunk_codec::ChunkCodec;
use crate::config::CodecConfig;
use crate::container::{ContainerReader, ContainerWriter, HEADER_LEN};
use crate::error::{HuffmanError, Result};
use crate::record::{ChunkRecord, ChunkStats};
use crate::text::{Utf16Chunks, Utf16Writer};
use crate::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub chunks: u32,
    pub symbols: u64,
    /// Container size, header included.
    pub container_bytes: u64,
    /// Set when decompression stopped at a tolerated truncation.
    pub truncated: bool,
}

impl Summary {
    fn add(&mut self, stats: &ChunkStats) {
        self.chunks += 1;
        self.symbols += stats.symbols;
        self.container_bytes += stats.encoded_bytes() as u64;
    }
}

/// Drives the chunk codec over whole streams and files.
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CodecConfig,
    abort: Option<Arc<AtomicBool>>,
}

impl Compressor {
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Compressor { config, abort: None })
    }

    /// Work stops before the next chunk once `flag` is set and the call
    /// returns [`HuffmanError::Aborted`].
    ///
    /// An aborted compression still patches the container header, so the
    /// output is a valid container holding every chunk written before the
    /// flag was seen.
    pub fn with_abort_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    fn check_abort(&self) -> Result<()> {
        match &self.abort {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(HuffmanError::Aborted),
            _ => Ok(()),
        }
    }

    pub fn compress_stream<R: Read, W: Write + Seek>(&self, input: R, output: W) -> Result<(W, Summary)> {
        let mut writer = ContainerWriter::new(output)?;
        let mut summary = Summary {
            container_bytes: HEADER_LEN as u64,
            ..Summary::default()
        };
        let chunks = Utf16Chunks::new(input, self.config.chunk_size)?;

        tracing::info!(
            chunk_size = self.config.chunk_size,
            parallel = self.config.parallel,
            "compressing"
        );

        match self.write_chunks(chunks, &mut writer, &mut summary) {
            Ok(()) => {}
            Err(HuffmanError::Aborted) => {
                writer.finish()?;
                tracing::warn!(
                    chunks = summary.chunks,
                    symbols = summary.symbols,
                    "compression aborted"
                );
                return Err(HuffmanError::Aborted);
            }
            Err(e) => return Err(e),
        }

        let output = writer.finish()?;
        tracing::info!(
            chunks = summary.chunks,
            symbols = summary.symbols,
            bytes = summary.container_bytes,
            "compression finished"
        );
        Ok((output, summary))
    }

    fn write_chunks<R: Read, W: Write + Seek>(
        &self,
        mut chunks: Utf16Chunks<R>,
        writer: &mut ContainerWriter<W>,
        summary: &mut Summary,
    ) -> Result<()> {
        if self.config.parallel {
            loop {
                self.check_abort()?;
                let batch = chunks
                    .by_ref()
                    .take(self.config.batch_size)
                    .collect::<Result<Vec<Vec<Symbol>>>>()?;
                if batch.is_empty() {
                    break;
                }
                for record in encode_batch(writer.next_index(), &batch)? {
                    summary.add(&writer.write_record(&record)?);
                }
            }
        } else {
            for chunk in chunks {
                self.check_abort()?;
                if let Some(stats) = writer.write_chunk(&chunk?)? {
                    summary.add(&stats);
                }
            }
        }
        Ok(())
    }

    pub fn decompress_stream<R: Read, W: Write>(&self, input: R, output: W) -> Result<(W, Summary)> {
        let mut reader = ContainerReader::new(input, self.config.truncation)?;
        let mut text = Utf16Writer::new(output);
        let mut summary = Summary {
            container_bytes: HEADER_LEN as u64,
            ..Summary::default()
        };

        tracing::info!(total = reader.total_symbols(), "decompressing");

        loop {
            self.check_abort()?;
            let Some(record) = reader.next_record()? else {
                break;
            };
            let symbols = ChunkCodec::decode(&record)?;
            text.write_units(&symbols)?;
            summary.add(&record.stats());
        }

        summary.truncated = reader.is_truncated();
        let output = if summary.truncated {
            text.finish_truncated()?
        } else {
            text.finish()?
        };
        tracing::info!(
            chunks = summary.chunks,
            symbols = summary.symbols,
            complete = reader.is_complete(),
            "decompression finished"
        );
        Ok((output, summary))
    }

    pub fn compress_file(&self, input: &Path, output: &Path) -> Result<Summary> {
        let reader = BufReader::new(File::open(input)?);
        let writer = BufWriter::new(File::create(output)?);
        let (writer, summary) = self.compress_stream(reader, writer)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        Ok(summary)
    }

    pub fn decompress_file(&self, input: &Path, output: &Path) -> Result<Summary> {
        let reader = BufReader::new(File::open(input)?);
        let writer = BufWriter::new(File::create(output)?);
        let (mut writer, summary) = self.decompress_stream(reader, writer)?;
        writer.flush()?;
        Ok(summary)
    }
}

/// Encodes a batch on the rayon pool; records come back in index order.
fn encode_batch(first_index: u32, batch: &[Vec<Symbol>]) -> Result<Vec<ChunkRecord>> {
    batch
        .par_iter()
        .enumerate()
        .map(|(offset, chunk)| ChunkCodec::encode(first_index + offset as u32, chunk))
        .collect()
}
