use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{HuffmanError, Result};

/// Compares two texts line by line and returns the number of matching lines.
pub fn verify_readers<A: BufRead, B: BufRead>(original: A, decompressed: B) -> Result<u64> {
    let mut original = original.lines();
    let mut decompressed = decompressed.lines();
    let mut line = 0u64;

    loop {
        match (original.next().transpose()?, decompressed.next().transpose()?) {
            (Some(a), Some(b)) => {
                line += 1;
                if a != b {
                    return Err(HuffmanError::VerificationFailed { line });
                }
            }
            (None, None) => return Ok(line),
            _ => return Err(HuffmanError::LengthMismatch),
        }
    }
}

pub fn verify_files(original: &Path, decompressed: &Path) -> Result<u64> {
    let lines = verify_readers(
        BufReader::new(File::open(original)?),
        BufReader::new(File::open(decompressed)?),
    )?;
    tracing::info!(lines, "original and decompressed files match");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_match() {
        let text = "alpha\nbeta\ngamma\n";
        assert_eq!(verify_readers(text.as_bytes(), text.as_bytes()).unwrap(), 3);
    }

    #[test]
    fn reports_first_differing_line() {
        let err = verify_readers("a\nb\nc\nd".as_bytes(), "a\nb\nx\ny".as_bytes()).unwrap_err();
        assert!(matches!(err, HuffmanError::VerificationFailed { line: 3 }));
    }

    #[test]
    fn reports_length_mismatch() {
        let err = verify_readers("a\nb\n".as_bytes(), "a\n".as_bytes()).unwrap_err();
        assert!(matches!(err, HuffmanError::LengthMismatch));
    }
}
