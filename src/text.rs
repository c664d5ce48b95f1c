//! Conversion between UTF-8 byte streams and chunks of UTF-16 code units.
//!
//! Symbols are code units, so a surrogate pair may straddle two chunks.
//! Both directions stream: neither side holds more than one chunk plus one
//! read block.

use std::io::{ErrorKind, Read, Write};

use crate::error::{HuffmanError, Result};
use crate::Symbol;

const READ_BLOCK: usize = 64 * 1024;

/// Iterator over fixed-size code-unit chunks of a UTF-8 reader.
pub struct Utf16Chunks<R: Read> {
    reader: R,
    chunk_size: usize,
    pending: Vec<Symbol>,
    // incomplete UTF-8 sequence left at the end of the last block
    carry: Vec<u8>,
    block: Vec<u8>,
    eof: bool,
}

impl<R: Read> Utf16Chunks<R> {
    pub fn new(reader: R, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(HuffmanError::Config("chunk_size must be at least 1".into()));
        }
        Ok(Utf16Chunks {
            reader,
            chunk_size,
            pending: Vec::new(),
            carry: Vec::new(),
            block: vec![0; READ_BLOCK],
            eof: false,
        })
    }

    fn fill(&mut self) -> Result<()> {
        let n = loop {
            match self.reader.read(&mut self.block) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        };

        if n == 0 {
            self.eof = true;
            if !self.carry.is_empty() {
                return Err(HuffmanError::InvalidText(format!(
                    "input ends inside a {}-byte UTF-8 sequence",
                    self.carry.len()
                )));
            }
            return Ok(());
        }

        self.carry.extend_from_slice(&self.block[..n]);
        let valid = match std::str::from_utf8(&self.carry) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => return Err(HuffmanError::InvalidText(e.to_string())),
        };

        // valid_up_to guarantees this prefix is UTF-8
        let text = std::str::from_utf8(&self.carry[..valid])
            .map_err(|e| HuffmanError::InvalidText(e.to_string()))?;
        self.pending.extend(text.encode_utf16());
        self.carry.drain(..valid);
        Ok(())
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<Symbol>>> {
        while self.pending.len() < self.chunk_size && !self.eof {
            self.fill()?;
        }
        if self.pending.is_empty() {
            return Ok(None);
        }
        let take = self.pending.len().min(self.chunk_size);
        Ok(Some(self.pending.drain(..take).collect()))
    }
}

impl<R: Read> Iterator for Utf16Chunks<R> {
    type Item = Result<Vec<Symbol>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                // stop after the first error
                self.eof = true;
                self.pending.clear();
                self.carry.clear();
                Some(Err(e))
            }
        }
    }
}

fn is_high_surrogate(unit: Symbol) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

/// Writes code-unit chunks as UTF-8, pairing surrogates across chunk edges.
pub struct Utf16Writer<W: Write> {
    inner: W,
    held: Option<Symbol>,
    buf: String,
}

impl<W: Write> Utf16Writer<W> {
    pub fn new(inner: W) -> Self {
        Utf16Writer {
            inner,
            held: None,
            buf: String::new(),
        }
    }

    pub fn write_units(&mut self, units: &[Symbol]) -> Result<()> {
        let (body, tail) = match units.last() {
            Some(&last) if is_high_surrogate(last) => (&units[..units.len() - 1], Some(last)),
            _ => (units, None),
        };

        self.buf.clear();
        for decoded in char::decode_utf16(self.held.take().into_iter().chain(body.iter().copied())) {
            let c = decoded.map_err(|e| {
                HuffmanError::InvalidText(format!("unpaired surrogate {:#06x}", e.unpaired_surrogate()))
            })?;
            self.buf.push(c);
        }
        self.held = tail;

        self.inner.write_all(self.buf.as_bytes())?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        if let Some(unit) = self.held {
            return Err(HuffmanError::InvalidText(format!(
                "text ends with unpaired surrogate {:#06x}",
                unit
            )));
        }
        self.inner.flush()?;
        Ok(self.inner)
    }

    /// Like [`finish`](Self::finish), for text cut short by a tolerated
    /// truncation: a held high surrogate is dropped instead of rejected.
    pub fn finish_truncated(mut self) -> Result<W> {
        if let Some(unit) = self.held.take() {
            tracing::warn!(
                unit,
                "dropping high surrogate cut off by truncation"
            );
        }
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks_of(text: &str, size: usize) -> Vec<Vec<Symbol>> {
        Utf16Chunks::new(text.as_bytes(), size)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn splits_into_fixed_chunks() {
        let chunks = chunks_of("abcabcabc", 4);
        assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![4, 4, 1]);
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(chunks_of("", 8).is_empty());
    }

    #[test]
    fn multibyte_sequences_split_across_read_blocks() {
        // 'é' is two UTF-8 bytes; an odd prefix puts one across the block edge
        let text = format!("x{}", "é".repeat(READ_BLOCK));
        let chunks = chunks_of(&text, 1000);
        let units: Vec<Symbol> = chunks.concat();
        assert_eq!(units, text.encode_utf16().collect::<Vec<_>>());
    }

    #[test]
    fn surrogate_pairs_reassemble_across_chunks() {
        let text = "a😀b😀😀c";
        let mut writer = Utf16Writer::new(Vec::new());
        for chunk in chunks_of(text, 2) {
            writer.write_units(&chunk).unwrap();
        }
        let out = writer.finish().unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), text);
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let bytes: &[u8] = &[b'a', 0xFF, b'b'];
        let result: Result<Vec<_>> = Utf16Chunks::new(bytes, 4).unwrap().collect();
        assert!(matches!(result, Err(HuffmanError::InvalidText(_))));
    }

    #[test]
    fn truncated_utf8_is_rejected() {
        let bytes: &[u8] = &[b'a', 0xE2, 0x82];
        let result: Result<Vec<_>> = Utf16Chunks::new(bytes, 4).unwrap().collect();
        assert!(matches!(result, Err(HuffmanError::InvalidText(_))));
    }

    #[test]
    fn zero_chunk_size_is_a_config_error() {
        let result = Utf16Chunks::new(&b"abc"[..], 0);
        assert!(matches!(result, Err(HuffmanError::Config(_))));
    }

    #[test]
    fn finish_truncated_drops_held_surrogate() {
        let mut writer = Utf16Writer::new(Vec::new());
        writer.write_units(&[0x61, 0xD83D]).unwrap();
        assert_eq!(writer.finish_truncated().unwrap(), b"a");

        let mut writer = Utf16Writer::new(Vec::new());
        writer.write_units(&[0x61, 0x62]).unwrap();
        assert_eq!(writer.finish_truncated().unwrap(), b"ab");
    }

    #[test]
    fn dangling_surrogate_is_rejected() {
        let mut writer = Utf16Writer::new(Vec::new());
        writer.write_units(&[0x61, 0xD83D]).unwrap();
        assert!(matches!(writer.finish(), Err(HuffmanError::InvalidText(_))));

        let mut writer = Utf16Writer::new(Vec::new());
        assert!(writer.write_units(&[0xDE00]).is_err());
    }
}
