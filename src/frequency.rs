use std::collections::HashMap;

use crate::Symbol;

/// Occurrence counts for the symbols of a single chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<Symbol, u64>,
}

impl FrequencyTable {
    pub fn from_symbols(symbols: &[Symbol]) -> Self {
        let counts = symbols
            .iter()
            .copied()
            .fold(HashMap::new(), |mut acc, symbol| {
                *acc.entry(symbol).or_insert(0) += 1;
                acc
            });

        FrequencyTable { counts }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, symbol: Symbol) -> Option<u64> {
        self.counts.get(&symbol).copied()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts.iter().map(|(&symbol, &count)| (symbol, count))
    }
}

impl FromIterator<(Symbol, u64)> for FrequencyTable {
    /// Entries with a zero count are dropped; repeated symbols accumulate,
    /// saturating at `u64::MAX`.
    fn from_iter<I: IntoIterator<Item = (Symbol, u64)>>(iter: I) -> Self {
        let mut counts = HashMap::new();
        for (symbol, count) in iter {
            if count > 0 {
                let entry = counts.entry(symbol).or_insert(0u64);
                *entry = entry.saturating_add(count);
            }
        }
        FrequencyTable { counts }
    }
}
