use std::io::{self, ErrorKind, Read, Write};

use crate::config::TruncationPolicy;
use crate::error::{HuffmanError, Result};
use crate::hufftree::HuffmanTree;

/// One independently coded chunk as stored in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub index: u32,
    /// Symbol count of the chunk.
    pub length: u32,
    pub tree: HuffmanTree,
    pub payload: Vec<u8>,
}

/// Per-chunk sizes, used for logging and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkStats {
    pub symbols: u64,
    pub distinct: usize,
    pub trie_bytes: usize,
    pub payload_bytes: usize,
}

impl ChunkStats {
    /// Bytes written for the record, framing included.
    pub fn encoded_bytes(&self) -> usize {
        12 + self.trie_bytes + self.payload_bytes
    }

    /// Uncompressed size (two bytes per symbol) over encoded size.
    pub fn ratio(&self) -> f64 {
        match self.encoded_bytes() {
            0 => 0.0,
            n => (self.symbols * 2) as f64 / n as f64,
        }
    }
}

enum Field {
    Complete,
    Missing,
    Partial(usize),
}

fn read_field<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<Field> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(match filled {
        n if n == buf.len() => Field::Complete,
        0 => Field::Missing,
        n => Field::Partial(n),
    })
}

fn truncated(policy: TruncationPolicy, field: &str, detail: String) -> Result<Option<ChunkRecord>> {
    match policy {
        TruncationPolicy::Tolerant => {
            tracing::warn!("record truncated in {}: {}; treating as end of stream", field, detail);
            Ok(None)
        }
        TruncationPolicy::Strict => Err(HuffmanError::TruncatedRecord(format!("{}: {}", field, detail))),
    }
}

impl ChunkRecord {
    pub fn stats(&self) -> ChunkStats {
        ChunkStats {
            symbols: u64::from(self.length),
            distinct: self.tree.leaf_count(),
            trie_bytes: self.tree.serialized_len(),
            payload_bytes: self.payload.len(),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(12 + self.tree.serialized_len() + self.payload.len());
        bytes.extend_from_slice(&self.index.to_be_bytes());
        bytes.extend_from_slice(&self.length.to_be_bytes());
        self.tree.write_into(&mut bytes);
        bytes.extend_from_slice(&(self.payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.payload.len() > u32::MAX as usize {
            return Err(HuffmanError::InconsistentLength(format!(
                "payload of {} bytes exceeds the 32-bit length field",
                self.payload.len()
            )));
        }
        writer.write_all(&self.serialize())?;
        Ok(())
    }

    /// Reads the next record. `Ok(None)` means the stream ended cleanly
    /// between records, or (tolerant policy) partway through one.
    pub fn read_from<R: Read>(reader: &mut R, policy: TruncationPolicy) -> Result<Option<ChunkRecord>> {
        let mut word = [0u8; 4];

        let index = match read_field(reader, &mut word)? {
            Field::Complete => u32::from_be_bytes(word),
            Field::Missing => return Ok(None),
            Field::Partial(n) => return truncated(policy, "chunk_index", format!("{} of 4 bytes", n)),
        };

        let length = match read_field(reader, &mut word)? {
            Field::Complete => u32::from_be_bytes(word),
            Field::Missing => return truncated(policy, "chunk_length", "missing".to_string()),
            Field::Partial(n) => return truncated(policy, "chunk_length", format!("{} of 4 bytes", n)),
        };

        let tree = HuffmanTree::read_from(reader)?;

        let payload_len = match read_field(reader, &mut word)? {
            Field::Complete => u32::from_be_bytes(word),
            Field::Missing => return truncated(policy, "payload_byte_len", "missing".to_string()),
            Field::Partial(n) => {
                return truncated(policy, "payload_byte_len", format!("{} of 4 bytes", n))
            }
        };

        let mut payload = Vec::new();
        reader.by_ref().take(u64::from(payload_len)).read_to_end(&mut payload)?;
        if payload.len() < payload_len as usize {
            return truncated(
                policy,
                "payload",
                format!("declared {} bytes, {} available", payload_len, payload.len()),
            );
        }

        Ok(Some(ChunkRecord {
            index,
            length,
            tree,
            payload,
        }))
    }
}
