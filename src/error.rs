//! Error types for the chunked Huffman codec.

use thiserror::Error;

use crate::min_heap::HeapErr;

#[derive(Debug, Error)]
pub enum HuffmanError {
    /// A code tree was requested for a chunk with no symbols.
    #[error("cannot build a code tree from an empty chunk")]
    EmptyInput,

    /// The preorder flag stream is invalid or ends before the tree is complete.
    #[error("malformed trie: {0}")]
    MalformedTrie(String),

    /// A record field declares more bytes than the container holds.
    #[error("truncated record: {0}")]
    TruncatedRecord(String),

    /// Declared lengths disagree with each other or with the payload.
    #[error("inconsistent length: {0}")]
    InconsistentLength(String),

    #[error("symbol {0:#06x} has no code in this chunk's table")]
    UnknownSymbol(u16),

    #[error("combined symbol weight overflows u64")]
    WeightOverflow,

    #[error("chunk of {0} symbols exceeds the 32-bit chunk length field")]
    ChunkTooLarge(usize),

    #[error("code for symbol {symbol:#06x} needs {depth} bits")]
    CodeTooLong { symbol: u16, depth: usize },

    #[error("chunk index {found} out of order, expected {expected}")]
    ChunkOutOfOrder { expected: u32, found: u32 },

    #[error("decoded symbols are not valid UTF-16: {0}")]
    InvalidText(String),

    #[error("verification failed at line {line}")]
    VerificationFailed { line: u64 },

    #[error("files have different lengths")]
    LengthMismatch,

    #[error("operation aborted between chunks")]
    Aborted,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("heap error: {0:?}")]
    Heap(HeapErr),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HeapErr> for HuffmanError {
    fn from(e: HeapErr) -> Self {
        HuffmanError::Heap(e)
    }
}

pub type Result<T> = std::result::Result<T, HuffmanError>;
