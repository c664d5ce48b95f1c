use std::collections::BTreeMap;
use std::fmt;

use crate::error::{HuffmanError, Result};
use crate::hufftree::{HuffNode, HuffmanTree};
use crate::Symbol;

/// A prefix code, MSB-first in the low `len` bits of `bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub bits: u64,
    pub len: u8,
}

impl Code {
    /// Whether `self` is a prefix of `other` (a code is a prefix of itself).
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && other.bits >> (other.len - self.len) == self.bits
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pos in (0..self.len).rev() {
            let bit = (self.bits >> pos) & 1;
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<Symbol, Code>,
}

impl CodeTable {
    pub fn from_tree(tree: &HuffmanTree) -> Result<Self> {
        let mut codes = BTreeMap::new();

        if let HuffNode::Leaf { symbol } = tree.root {
            codes.insert(symbol, Code { bits: 0, len: 1 });
            return Ok(CodeTable { codes });
        }

        // Left = 0, Right = 1, building codes from MSB to LSB
        let mut stack = vec![(&tree.root, 0u64, 0usize)];
        while let Some((node, bits, depth)) = stack.pop() {
            match node {
                HuffNode::Leaf { symbol } => {
                    codes.insert(*symbol, Code { bits, len: depth as u8 });
                }
                HuffNode::Internal { left, right } => {
                    if depth >= u64::BITS as usize {
                        let symbol = first_leaf(left);
                        return Err(HuffmanError::CodeTooLong { symbol, depth: depth + 1 });
                    }
                    stack.push((right, (bits << 1) | 1, depth + 1));
                    stack.push((left, bits << 1, depth + 1));
                }
            }
        }

        Ok(CodeTable { codes })
    }

    pub fn get(&self, symbol: Symbol) -> Option<Code> {
        self.codes.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, Code)> + '_ {
        self.codes.iter().map(|(&symbol, &code)| (symbol, code))
    }

    pub fn is_prefix_free(&self) -> bool {
        let codes: Vec<Code> = self.codes.values().copied().collect();
        codes.iter().enumerate().all(|(i, a)| {
            codes
                .iter()
                .enumerate()
                .all(|(j, b)| i == j || !a.is_prefix_of(b))
        })
    }
}

fn first_leaf(mut node: &HuffNode) -> Symbol {
    loop {
        match node {
            HuffNode::Leaf { symbol } => return *symbol,
            HuffNode::Internal { left, .. } => node = left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<Symbol> {
        s.encode_utf16().collect()
    }

    #[test]
    fn aaabbc_codes() {
        let tree = HuffmanTree::from_symbols(&units("aaabbc")).unwrap();
        let table = CodeTable::from_tree(&tree).unwrap();

        let a = table.get(b'a' as Symbol).unwrap();
        let b = table.get(b'b' as Symbol).unwrap();
        let c = table.get(b'c' as Symbol).unwrap();
        assert_eq!(a.to_string(), "0");
        assert_eq!(c.to_string(), "10");
        assert_eq!(b.to_string(), "11");
        assert!(table.is_prefix_free());
    }

    #[test]
    fn single_leaf_gets_code_zero() {
        let tree = HuffmanTree::from_symbols(&units("qqq")).unwrap();
        let table = CodeTable::from_tree(&tree).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(b'q' as Symbol), Some(Code { bits: 0, len: 1 }));
    }

    #[test]
    fn one_entry_per_distinct_symbol() {
        let text = units("hello, wide world of prefix codes");
        let tree = HuffmanTree::from_symbols(&text).unwrap();
        let table = CodeTable::from_tree(&tree).unwrap();

        let mut distinct = text.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(table.len(), distinct.len());
        assert!(distinct.iter().all(|s| table.get(*s).is_some()));
        assert!(table.is_prefix_free());
    }

    #[test]
    fn prefix_detection() {
        let zero = Code { bits: 0b0, len: 1 };
        let zero_one = Code { bits: 0b01, len: 2 };
        let one = Code { bits: 0b1, len: 1 };
        assert!(zero.is_prefix_of(&zero_one));
        assert!(!one.is_prefix_of(&zero_one));
        assert!(!zero_one.is_prefix_of(&zero));
    }

    #[test]
    fn skewed_tree_depth_matches_code_length() {
        // fibonacci weights give the most lopsided tree
        let weights = [1u64, 1, 2, 3, 5, 8, 13, 21, 34, 55];
        let table: crate::frequency::FrequencyTable = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| (i as Symbol, w))
            .collect();
        let tree = HuffmanTree::from_frequencies(&table).unwrap();
        let codes = CodeTable::from_tree(&tree).unwrap();
        let longest = codes.iter().map(|(_, c)| c.len as usize).max().unwrap();
        assert_eq!(longest, tree.depth());
        assert_eq!(longest, weights.len() - 1);
    }
}
