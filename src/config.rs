use std::path::Path;

use serde::Deserialize;

use crate::error::{HuffmanError, Result};

/// How a container that ends partway through a record is treated.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Stop reading and return what was decoded so far.
    #[default]
    Tolerant,
    /// Fail with `TruncatedRecord`.
    Strict,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CodecConfig {
    /// Symbols per chunk.
    pub chunk_size: usize,
    pub truncation: TruncationPolicy,
    /// Encode chunks on the rayon pool.
    pub parallel: bool,
    /// Chunks held in memory per parallel batch.
    pub batch_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024 * 1024,
            truncation: TruncationPolicy::Tolerant,
            parallel: false,
            batch_size: 4,
        }
    }
}

impl CodecConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: CodecConfig =
            toml::from_str(text).map_err(|e| HuffmanError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > u32::MAX as usize {
            return Err(HuffmanError::Config(format!(
                "chunk_size must be in 1..={}, got {}",
                u32::MAX,
                self.chunk_size
            )));
        }
        if self.batch_size == 0 {
            return Err(HuffmanError::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CodecConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 1 << 20);
        assert_eq!(config.truncation, TruncationPolicy::Tolerant);
    }

    #[test]
    fn parses_partial_toml() {
        let config = CodecConfig::from_toml_str(
            r#"
            chunk_size = 4096
            truncation = "strict"
            "#,
        )
        .unwrap();
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.truncation, TruncationPolicy::Strict);
        assert!(!config.parallel);
        assert_eq!(config.batch_size, 4);
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let err = CodecConfig::from_toml_str("chunk_size = 0").unwrap_err();
        assert!(matches!(err, HuffmanError::Config(_)));
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = CodecConfig::from_toml_str("truncation = \"lenient\"").unwrap_err();
        assert!(matches!(err, HuffmanError::Config(_)));
    }
}
