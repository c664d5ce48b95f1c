use crate::bit_vec::{BitReader, BitVec};
use crate::code_table::CodeTable;
use crate::error::{HuffmanError, Result};
use crate::frequency::FrequencyTable;
use crate::hufftree::{HuffNode, HuffmanTree};
use crate::record::ChunkRecord;
use crate::Symbol;

/// Code tree and code table for one chunk.
pub struct ChunkCodec {
    tree: HuffmanTree,
    encode_table: CodeTable,
}

impl ChunkCodec {
    pub fn new(tree: HuffmanTree) -> Result<Self> {
        let encode_table = CodeTable::from_tree(&tree)?;
        Ok(ChunkCodec { tree, encode_table })
    }

    pub fn from_frequencies(frequencies: &FrequencyTable) -> Result<Self> {
        ChunkCodec::new(HuffmanTree::from_frequencies(frequencies)?)
    }

    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    pub fn code_table(&self) -> &CodeTable {
        &self.encode_table
    }

    /// Packs `symbols` with this chunk's codes.
    pub fn pack(&self, symbols: &[Symbol]) -> Result<BitVec> {
        let mut bit_vec = BitVec::with_capacity(symbols.len());
        for &symbol in symbols {
            let code = self
                .encode_table
                .get(symbol)
                .ok_or(HuffmanError::UnknownSymbol(symbol))?;
            bit_vec.push_code(code);
        }
        Ok(bit_vec)
    }

    /// Builds a fresh code for `chunk` and encodes it as record `index`.
    pub fn encode(index: u32, chunk: &[Symbol]) -> Result<ChunkRecord> {
        let length =
            u32::try_from(chunk.len()).map_err(|_| HuffmanError::ChunkTooLarge(chunk.len()))?;

        let frequencies = FrequencyTable::from_symbols(chunk);
        let codec = ChunkCodec::from_frequencies(&frequencies)?;
        let payload = codec.pack(chunk)?.into_bytes();

        let record = ChunkRecord {
            index,
            length,
            tree: codec.tree,
            payload,
        };

        let stats = record.stats();
        tracing::debug!(
            chunk = index,
            symbols = length,
            distinct = frequencies.len(),
            payload_bytes = stats.payload_bytes,
            ratio = stats.ratio(),
            "encoded chunk"
        );

        Ok(record)
    }

    pub fn decode(record: &ChunkRecord) -> Result<Vec<Symbol>> {
        let symbols = unpack(&record.payload, &record.tree, record.length as usize)?;
        tracing::debug!(
            chunk = record.index,
            symbols = symbols.len(),
            "decoded chunk"
        );
        Ok(symbols)
    }
}

/// Decodes exactly `count` symbols from `payload`. Bits past the last
/// symbol are padding and are never examined.
pub fn unpack(payload: &[u8], tree: &HuffmanTree, count: usize) -> Result<Vec<Symbol>> {
    let mut bits = BitReader::new(payload);
    // every symbol costs at least one bit
    let mut result = Vec::with_capacity(count.min(payload.len().saturating_mul(8)));

    let out_of_bits = |decoded: usize| {
        HuffmanError::InconsistentLength(format!(
            "payload of {} bytes ran out after {} of {} symbols",
            payload.len(),
            decoded,
            count
        ))
    };

    // one-leaf trie: every symbol is the single bit 0
    if let HuffNode::Leaf { symbol } = tree.root {
        let needed = count.div_ceil(8);
        if payload.len() < needed {
            return Err(out_of_bits(payload.len() * 8));
        }
        result.resize(count, symbol);
        return Ok(result);
    }

    for decoded in 0..count {
        let mut current_node = &tree.root;

        // walk the tree until we hit a leaf
        loop {
            match current_node {
                HuffNode::Leaf { symbol } => {
                    result.push(*symbol);
                    break;
                }
                HuffNode::Internal { left, right } => {
                    let bit = bits.next_bit().ok_or_else(|| out_of_bits(decoded))?;
                    current_node = if bit { right } else { left };
                }
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<Symbol> {
        s.encode_utf16().collect()
    }

    #[test]
    fn aaabbc_roundtrip() {
        let chunk = units("aaabbc");
        let record = ChunkCodec::encode(0, &chunk).unwrap();

        // a=0 a=0 a=0 b=11 b=11 c=10 -> 000 11 11 10 -> 0001 1111 0(000)
        assert_eq!(record.payload, vec![0b0001_1111, 0b0000_0000]);
        assert_eq!(record.length, 6);
        assert_eq!(ChunkCodec::decode(&record).unwrap(), chunk);
    }

    #[test]
    fn single_symbol_chunk() {
        let chunk = vec![0x263A; 17];
        let record = ChunkCodec::encode(5, &chunk).unwrap();
        assert!(record.tree.root.is_leaf());
        assert_eq!(record.payload.len(), 3);
        assert!(record.payload.iter().all(|&b| b == 0));
        assert_eq!(ChunkCodec::decode(&record).unwrap(), chunk);
    }

    #[test]
    fn empty_chunk_is_rejected() {
        let err = ChunkCodec::encode(0, &[]).unwrap_err();
        assert!(matches!(err, HuffmanError::EmptyInput));
    }

    #[test]
    fn padding_bits_are_not_decoded() {
        let chunk = units("ab");
        let mut record = ChunkCodec::encode(0, &chunk).unwrap();
        // trailing garbage in the padding and an extra byte
        record.payload[0] |= 0b0011_1111;
        record.payload.push(0xFF);
        assert_eq!(ChunkCodec::decode(&record).unwrap(), chunk);
    }

    #[test]
    fn short_payload_is_inconsistent() {
        let chunk = units("abcdefgh");
        let mut record = ChunkCodec::encode(0, &chunk).unwrap();
        record.payload.truncate(1);
        let err = ChunkCodec::decode(&record).unwrap_err();
        assert!(matches!(err, HuffmanError::InconsistentLength(_)));
    }

    #[test]
    fn short_payload_single_leaf_is_inconsistent() {
        let mut record = ChunkCodec::encode(0, &[7; 9]).unwrap();
        record.payload.truncate(1);
        let err = ChunkCodec::decode(&record).unwrap_err();
        assert!(matches!(err, HuffmanError::InconsistentLength(_)));
    }

    #[test]
    fn huge_declared_length_fails_without_reserving_it() {
        for chunk in [units("abcd"), vec![9; 4]] {
            let mut record = ChunkCodec::encode(0, &chunk).unwrap();
            record.length = u32::MAX;
            let err = ChunkCodec::decode(&record).unwrap_err();
            assert!(matches!(err, HuffmanError::InconsistentLength(_)));
        }
    }

    #[test]
    fn pack_rejects_foreign_symbol() {
        let codec = ChunkCodec::new(HuffmanTree::from_symbols(&units("ab")).unwrap()).unwrap();
        let err = codec.pack(&units("abz")).unwrap_err();
        assert!(matches!(err, HuffmanError::UnknownSymbol(s) if s == b'z' as Symbol));
        assert_eq!(codec.pack(&units("abba")).unwrap().bit_count(), 4);
    }
}
