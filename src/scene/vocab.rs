//! Symbol vocabulary shared by generation and loading.
//!
//! Colors and markers live in one flat symbol table so a question's anchor
//! and target are plain indices regardless of which attribute they name.
//! The table is serialized per split as `dict.json`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;

/// Scene colors, canonical order.
pub const COLORS: [&str; 8] = [
    "blue", "green", "red", "cyan", "magenta", "yellow", "black", "gray",
];

/// Marker glyph codes, canonical order.
pub const MARKERS: [&str; 8] = ["o", "v", "^", "<", ">", "s", "P", "X"];

/// Total number of symbols (colors followed by markers).
pub const N_SYMBOLS: usize = COLORS.len() + MARKERS.len();

static CANONICAL: Lazy<Vocabulary> = Lazy::new(Vocabulary::canonical);

/// The process-wide canonical vocabulary.
pub fn vocabulary() -> &'static Vocabulary {
    &CANONICAL
}

/// Bidirectional symbol table mapping color and marker names to dense indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    s2i: HashMap<String, usize>,
    i2s: Vec<String>,
}

impl Vocabulary {
    fn canonical() -> Self {
        let i2s: Vec<String> = COLORS
            .iter()
            .chain(MARKERS.iter())
            .map(|s| s.to_string())
            .collect();
        let s2i = i2s
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        Self { s2i, i2s }
    }

    /// Rebuild a vocabulary from a symbol-to-index map, e.g. a parsed
    /// `dict.json`. Indices must be dense in `0..len`.
    pub fn from_s2i(s2i: HashMap<String, usize>) -> Result<Self> {
        let mut i2s = vec![String::new(); s2i.len()];
        for (symbol, &index) in &s2i {
            if index >= i2s.len() {
                bail!(
                    "symbol table index {} out of range for {} symbols",
                    index,
                    i2s.len()
                );
            }
            if !i2s[index].is_empty() {
                bail!("symbol table index {} assigned twice", index);
            }
            i2s[index] = symbol.clone();
        }
        Ok(Self { s2i, i2s })
    }

    pub fn len(&self) -> usize {
        self.i2s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i2s.is_empty()
    }

    /// Index of a symbol, if it is in the table.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.s2i.get(symbol).copied()
    }

    /// Symbol at an index, if in range.
    pub fn symbol_of(&self, index: usize) -> Option<&str> {
        self.i2s.get(index).map(String::as_str)
    }

    /// Write the symbol-to-index map as `dict.json`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer(file, &self.s2i)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Read a `dict.json` back into a vocabulary.
    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let s2i: HashMap<String, usize> = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Self::from_s2i(s2i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_layout() {
        let vocab = vocabulary();
        assert_eq!(vocab.len(), 16);
        assert_eq!(vocab.index_of("blue"), Some(0));
        assert_eq!(vocab.index_of("gray"), Some(7));
        assert_eq!(vocab.index_of("o"), Some(8));
        assert_eq!(vocab.index_of("X"), Some(15));
        assert_eq!(vocab.index_of("purple"), None);
    }

    #[test]
    fn test_inverse_map_is_consistent() {
        let vocab = vocabulary();
        for i in 0..vocab.len() {
            let symbol = vocab.symbol_of(i).unwrap();
            assert_eq!(vocab.index_of(symbol), Some(i));
        }
        assert_eq!(vocab.symbol_of(16), None);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.json");
        vocabulary().save(&path).unwrap();
        let loaded = Vocabulary::load(&path).unwrap();
        assert_eq!(&loaded, vocabulary());
    }

    #[test]
    fn test_rejects_sparse_indices() {
        let mut s2i = HashMap::new();
        s2i.insert("blue".to_string(), 0);
        s2i.insert("red".to_string(), 5);
        assert!(Vocabulary::from_s2i(s2i).is_err());
    }
}
