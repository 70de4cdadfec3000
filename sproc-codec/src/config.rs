//! Codec configuration.

use crate::buffer::INITIAL_CAPACITY;
use serde::{Deserialize, Serialize};

/// Default limit on container nesting during encode and decode.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// How the unarmoring step treats characters outside the symbol alphabet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorMode {
    /// Unknown symbols decode as code 0 and a lone trailing symbol is
    /// dropped. This is what the remote peer has always done.
    #[default]
    Lenient,
    /// Unknown symbols and a lone trailing symbol are errors.
    Strict,
}

impl std::str::FromStr for ArmorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(ArmorMode::Lenient),
            "strict" => Ok(ArmorMode::Strict),
            other => Err(format!("unknown armor mode: {}", other)),
        }
    }
}

/// Options shared by the serializer, deserializer and armor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Treatment of unrecognized armor symbols.
    pub armor_mode: ArmorMode,
    /// Maximum container nesting accepted in either direction.
    pub max_depth: usize,
    /// Starting capacity of the encode buffer.
    pub initial_capacity: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            armor_mode: ArmorMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            initial_capacity: INITIAL_CAPACITY,
        }
    }
}

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_armor_mode(mut self, mode: ArmorMode) -> Self {
        self.armor_mode = mode;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Shorthand for `with_armor_mode(ArmorMode::Strict)`.
    pub fn strict(self) -> Self {
        self.with_armor_mode(ArmorMode::Strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.armor_mode, ArmorMode::Lenient);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.initial_capacity, INITIAL_CAPACITY);
    }

    #[test]
    fn test_builder() {
        let config = CodecConfig::new()
            .strict()
            .with_max_depth(8)
            .with_initial_capacity(16);
        assert_eq!(config.armor_mode, ArmorMode::Strict);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.initial_capacity, 16);
    }

    #[test]
    fn test_armor_mode_parse() {
        assert_eq!("strict".parse::<ArmorMode>().unwrap(), ArmorMode::Strict);
        assert_eq!("Lenient".parse::<ArmorMode>().unwrap(), ArmorMode::Lenient);
        assert!("loose".parse::<ArmorMode>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CodecConfig = serde_json::from_str(r#"{"armor_mode":"strict"}"#).unwrap();
        assert_eq!(config.armor_mode, ArmorMode::Strict);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }
}
