//! # chunk_huffman
//!
//! Chunked Huffman compression for text. Input is split into fixed-size
//! chunks of UTF-16 code units; every chunk gets its own code tree, stored
//! next to its bit-packed payload in a single container.
//!
//! ## Quick Start
//!
//! ```rust
//! use chunk_huffman::{compress_symbols, decompress_symbols, TruncationPolicy};
//!
//! let text: Vec<u16> = "abcabcabc".encode_utf16().collect();
//! let container = compress_symbols(&text, 4)?;
//! let restored = decompress_symbols(&container, TruncationPolicy::Strict)?;
//! assert_eq!(restored, text);
//! # Ok::<(), chunk_huffman::HuffmanError>(())
//! ```
//!
//! Whole files go through [`Compressor`]:
//!
//! ```no_run
//! use chunk_huffman::{CodecConfig, Compressor};
//! use std::path::Path;
//!
//! let compressor = Compressor::new(CodecConfig::default())?;
//! compressor.compress_file(Path::new("input.csv"), Path::new("compressed.bin"))?;
//! compressor.decompress_file(Path::new("compressed.bin"), Path::new("output.csv"))?;
//! # Ok::<(), chunk_huffman::HuffmanError>(())
//! ```

pub mod chunk_codec;
pub mod code_table;
pub mod config;
pub mod container;
pub mod error;
pub mod frequency;
pub mod hufftree;
pub mod pipeline;
pub mod record;
pub mod text;
pub mod verify;

// Internal modules - not part of public API
mod bit_vec;
mod min_heap;

/// A 16-bit code unit.
pub type Symbol = u16;

// Re-export main types for convenience
pub use chunk_codec::ChunkCodec;
pub use code_table::{Code, CodeTable};
pub use config::{CodecConfig, TruncationPolicy};
pub use container::{compress_symbols, decompress_symbols, ContainerReader, ContainerWriter};
pub use error::{HuffmanError, Result};
pub use frequency::FrequencyTable;
pub use hufftree::{HuffNode, HuffmanTree};
pub use pipeline::{Compressor, Summary};
pub use record::{ChunkRecord, ChunkStats};
pub use verify::{verify_files, verify_readers};
