use std::cmp::Ordering;
use std::fmt;
use std::io::{ErrorKind, Read};

use crate::error::{HuffmanError, Result};
use crate::frequency::FrequencyTable;
use crate::min_heap::MinHeap;
use crate::Symbol;

/// Preorder flag preceding an internal node.
pub const INTERNAL_FLAG: u8 = 0;
/// Preorder flag preceding a leaf node and its 2-byte symbol.
pub const LEAF_FLAG: u8 = 1;

/// Deepest trie accepted from a container. Codes are held in a `u64`.
pub const MAX_TRIE_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        symbol: Symbol,
    },
    Internal {
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn leaf(symbol: Symbol) -> Self {
        HuffNode::Leaf { symbol }
    }

    pub fn merge(left: HuffNode, right: HuffNode) -> Self {
        HuffNode::Internal {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf { .. })
    }
}

/// Secondary ordering for queued nodes of equal weight.
/// Variant order puts every leaf ahead of every internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TieBreak {
    Leaf(Symbol),
    Internal(u64),
}

#[derive(Debug)]
struct Weighted {
    weight: u64,
    tie: TieBreak,
    node: HuffNode,
}

impl PartialEq for Weighted {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Weighted {}

impl PartialOrd for Weighted {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Weighted {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then_with(|| self.tie.cmp(&other.tie))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    pub root: HuffNode,
}

impl HuffmanTree {
    pub fn from_symbols(symbols: &[Symbol]) -> Result<Self> {
        HuffmanTree::from_frequencies(&FrequencyTable::from_symbols(symbols))
    }

    pub fn from_frequencies(frequencies: &FrequencyTable) -> Result<Self> {
        if frequencies.is_empty() {
            return Err(HuffmanError::EmptyInput);
        }

        let leaves: Vec<Weighted> = frequencies
            .iter()
            .map(|(symbol, count)| Weighted {
                weight: count,
                tie: TieBreak::Leaf(symbol),
                node: HuffNode::leaf(symbol),
            })
            .collect();

        HuffmanTree::build_from_heap(MinHeap::build(leaves))
    }

    fn build_from_heap(mut heap: MinHeap<Weighted>) -> Result<Self> {
        let mut sequence = 0u64;
        while heap.heap_size() > 1 {
            let x = heap.extract_min()?;
            let y = heap.extract_min()?;

            let weight = x
                .weight
                .checked_add(y.weight)
                .ok_or(HuffmanError::WeightOverflow)?;
            heap.insert(Weighted {
                weight,
                tie: TieBreak::Internal(sequence),
                node: HuffNode::merge(x.node, y.node),
            });
            sequence += 1;
        }

        let root = heap.extract_min()?.node;
        Ok(HuffmanTree { root })
    }

    pub fn leaf_count(&self) -> usize {
        self.preorder().filter(|node| node.is_leaf()).count()
    }

    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(&self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                HuffNode::Leaf { .. } => deepest = deepest.max(depth),
                HuffNode::Internal { left, right } => {
                    stack.push((right, depth + 1));
                    stack.push((left, depth + 1));
                }
            }
        }
        deepest
    }

    fn preorder(&self) -> impl Iterator<Item = &HuffNode> {
        let mut stack = vec![&self.root];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let HuffNode::Internal { left, right } = node {
                stack.push(right);
                stack.push(left);
            }
            Some(node)
        })
    }

    /// Size in bytes of the preorder encoding.
    pub fn serialized_len(&self) -> usize {
        self.preorder()
            .map(|node| if node.is_leaf() { 3 } else { 1 })
            .sum()
    }

    pub fn write_into(&self, out: &mut Vec<u8>) {
        for node in self.preorder() {
            match node {
                HuffNode::Leaf { symbol } => {
                    out.push(LEAF_FLAG);
                    out.extend_from_slice(&symbol.to_be_bytes());
                }
                HuffNode::Internal { .. } => out.push(INTERNAL_FLAG),
            }
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.serialized_len());
        self.write_into(&mut bytes);
        bytes
    }

    /// Decodes a complete preorder encoding; trailing bytes are rejected.
    pub fn deserialize(mut data: &[u8]) -> Result<Self> {
        let tree = HuffmanTree::read_from(&mut data)?;
        if !data.is_empty() {
            return Err(HuffmanError::MalformedTrie(format!(
                "{} trailing bytes after trie",
                data.len()
            )));
        }
        Ok(tree)
    }

    /// Reads exactly one preorder-encoded trie from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        // each slot is an internal node waiting for children: None until its
        // left subtree completes
        let mut pending: Vec<Option<HuffNode>> = Vec::new();

        loop {
            let mut node = match read_trie_byte(reader)? {
                LEAF_FLAG => {
                    let hi = read_trie_byte(reader)?;
                    let lo = read_trie_byte(reader)?;
                    HuffNode::leaf(Symbol::from_be_bytes([hi, lo]))
                }
                INTERNAL_FLAG => {
                    if pending.len() >= MAX_TRIE_DEPTH {
                        return Err(HuffmanError::MalformedTrie(format!(
                            "trie deeper than {} levels",
                            MAX_TRIE_DEPTH
                        )));
                    }
                    pending.push(None);
                    continue;
                }
                flag => {
                    return Err(HuffmanError::MalformedTrie(format!(
                        "invalid node flag {:#04x}",
                        flag
                    )))
                }
            };

            loop {
                match pending.pop() {
                    None => return Ok(HuffmanTree { root: node }),
                    Some(None) => {
                        pending.push(Some(node));
                        break;
                    }
                    Some(Some(left)) => node = HuffNode::merge(left, node),
                }
            }
        }
    }
}

fn read_trie_byte<R: Read>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    match reader.read_exact(&mut byte) {
        Ok(()) => Ok(byte[0]),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(HuffmanError::MalformedTrie(
            "flag stream ended before the trie was complete".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

impl fmt::Display for HuffmanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(&self.root, 0usize, "root")];
        while let Some((node, depth, label)) = stack.pop() {
            let indent = "  ".repeat(depth);
            match node {
                HuffNode::Leaf { symbol } => {
                    let shown = char::from_u32(u32::from(*symbol))
                        .filter(|c| !c.is_control())
                        .unwrap_or('\u{FFFD}');
                    writeln!(f, "{}{}-> Leaf: {:?} ({:#06x})", indent, label, shown, symbol)?;
                }
                HuffNode::Internal { left, right } => {
                    writeln!(f, "{}{}-> Internal", indent, label)?;
                    stack.push((right, depth + 1, "R"));
                    stack.push((left, depth + 1, "L"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<Symbol> {
        s.encode_utf16().collect()
    }

    #[test]
    fn single_symbol_is_a_leaf_root() {
        let tree = HuffmanTree::from_symbols(&units("zzzz")).unwrap();
        assert_eq!(tree.root, HuffNode::leaf(b'z' as Symbol));
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.serialize(), vec![LEAF_FLAG, 0x00, b'z']);
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = HuffmanTree::from_frequencies(&FrequencyTable::default()).unwrap_err();
        assert!(matches!(err, HuffmanError::EmptyInput));
    }

    #[test]
    fn aaabbc_shape() {
        // c(1) and b(2) merge first, then a(3) against the internal(3):
        // leaf wins the tie and goes left
        let tree = HuffmanTree::from_symbols(&units("aaabbc")).unwrap();
        let expected = HuffNode::merge(
            HuffNode::leaf(b'a' as Symbol),
            HuffNode::merge(HuffNode::leaf(b'c' as Symbol), HuffNode::leaf(b'b' as Symbol)),
        );
        assert_eq!(tree.root, expected);
        assert_eq!(
            tree.serialize(),
            vec![0, 1, 0, b'a', 0, 1, 0, b'c', 1, 0, b'b']
        );
        assert_eq!(tree.serialized_len(), 11);
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn overflowing_weights_are_rejected() {
        let table: FrequencyTable = vec![(0, u64::MAX), (1, 1)].into_iter().collect();
        let err = HuffmanTree::from_frequencies(&table).unwrap_err();
        assert!(matches!(err, HuffmanError::WeightOverflow));
    }

    #[test]
    fn equal_leaves_order_by_symbol() {
        let table: FrequencyTable = vec![(7, 1), (3, 1)].into_iter().collect();
        let tree = HuffmanTree::from_frequencies(&table).unwrap();
        assert_eq!(tree.root, HuffNode::merge(HuffNode::leaf(3), HuffNode::leaf(7)));
    }

    #[test]
    fn equal_internals_order_by_sequence() {
        // four unit-weight leaves: (0,1) merge first, (2,3) second; the two
        // internals tie at weight 2 and the earlier one goes left
        let table: FrequencyTable = (0..4).map(|s| (s, 1)).collect();
        let tree = HuffmanTree::from_frequencies(&table).unwrap();
        let expected = HuffNode::merge(
            HuffNode::merge(HuffNode::leaf(0), HuffNode::leaf(1)),
            HuffNode::merge(HuffNode::leaf(2), HuffNode::leaf(3)),
        );
        assert_eq!(tree.root, expected);
    }

    #[test]
    fn repeated_builds_serialize_identically() {
        let text = units("the quick brown fox jumps over the lazy dog, again and again");
        let first = HuffmanTree::from_symbols(&text).unwrap().serialize();
        for _ in 0..10 {
            assert_eq!(HuffmanTree::from_symbols(&text).unwrap().serialize(), first);
        }
    }

    #[test]
    fn deserialize_mirrors_serialize() {
        let tree = HuffmanTree::from_symbols(&units("mississippi river")).unwrap();
        let bytes = tree.serialize();
        assert_eq!(HuffmanTree::deserialize(&bytes).unwrap(), tree);
    }

    #[test]
    fn zero_symbol_is_an_ordinary_leaf() {
        let tree = HuffmanTree::from_symbols(&[0, 0, 1]).unwrap();
        let back = HuffmanTree::deserialize(&tree.serialize()).unwrap();
        assert_eq!(back.leaf_count(), 2);
        assert_eq!(back, tree);
    }

    #[test]
    fn truncated_flag_stream_is_malformed() {
        for bytes in [&[][..], &[0][..], &[0, 1, 0, b'a'][..], &[1, 0][..]] {
            let err = HuffmanTree::deserialize(bytes).unwrap_err();
            assert!(matches!(err, HuffmanError::MalformedTrie(_)), "{:?}", bytes);
        }
    }

    #[test]
    fn bad_flag_is_malformed() {
        let err = HuffmanTree::deserialize(&[2]).unwrap_err();
        assert!(matches!(err, HuffmanError::MalformedTrie(_)));
    }

    #[test]
    fn trailing_bytes_are_malformed() {
        let err = HuffmanTree::deserialize(&[1, 0, b'a', 9]).unwrap_err();
        assert!(matches!(err, HuffmanError::MalformedTrie(_)));
    }

    #[test]
    fn overly_deep_trie_is_malformed() {
        let bytes = vec![INTERNAL_FLAG; MAX_TRIE_DEPTH + 1];
        let err = HuffmanTree::deserialize(&bytes).unwrap_err();
        assert!(matches!(err, HuffmanError::MalformedTrie(_)));
    }

    #[test]
    fn display_lists_every_leaf() {
        let tree = HuffmanTree::from_symbols(&units("aab")).unwrap();
        let shown = tree.to_string();
        assert!(shown.starts_with("root-> Internal"));
        assert!(shown.contains("Leaf: 'a'"));
        assert!(shown.contains("Leaf: 'b'"));
    }
}
