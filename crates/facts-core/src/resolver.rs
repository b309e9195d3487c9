//! Ticker symbol to CIK resolution.
//!
//! The [`CikMap`] is loaded once from a JSON object mapping ticker symbols to
//! CIK strings and is read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{FactsError, Result};
use crate::types::{Cik, Symbol};

/// Preloaded lookup table from ticker symbol to CIK.
#[derive(Clone, Debug, Default)]
pub struct CikMap {
    entries: HashMap<Symbol, Cik>,
}

impl CikMap {
    /// Parses a CIK map from a JSON object such as `{"PLTR": "0001321655"}`.
    ///
    /// CIKs may be given as strings or numbers and are zero-padded.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::Config`] if the document is not a JSON object and
    /// [`FactsError::InvalidCik`] if any entry is not a valid CIK.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| FactsError::Config(format!("Failed to parse CIK map: {}", e)))?;

        let Value::Object(object) = value else {
            return Err(FactsError::Config(
                "CIK map must be a JSON object of symbol to CIK".to_string(),
            ));
        };

        let mut entries = HashMap::with_capacity(object.len());
        for (symbol, cik) in object {
            let cik = match cik {
                Value::String(s) => Cik::new(&s)?,
                Value::Number(n) => Cik::new(&n.to_string())?,
                other => return Err(FactsError::InvalidCik(other.to_string())),
            };
            entries.insert(Symbol::new(symbol), cik);
        }

        debug!(entries = entries.len(), "Loaded CIK map");
        Ok(Self { entries })
    }

    /// Loads a CIK map from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::Config`] if the file cannot be read, plus any
    /// error from [`CikMap::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            FactsError::Config(format!("Failed to read CIK map {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Looks up the CIK for a symbol.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::SymbolNotFound`] if the symbol is not in the map.
    pub fn resolve(&self, symbol: &Symbol) -> Result<&Cik> {
        self.entries
            .get(symbol)
            .ok_or_else(|| FactsError::SymbolNotFound(symbol.to_string()))
    }

    /// Number of symbols in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map holds no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Symbol, Cik)> for CikMap {
    fn from_iter<I: IntoIterator<Item = (Symbol, Cik)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_symbol() {
        let map = CikMap::from_json_str(r#"{"pltr": "1321655", "GOLD": 756894}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.resolve(&Symbol::new("PLTR")).unwrap().as_str(),
            "0001321655"
        );
        assert_eq!(
            map.resolve(&Symbol::new("gold")).unwrap().as_str(),
            "0000756894"
        );
    }

    #[test]
    fn test_collect_from_pairs() {
        let map: CikMap = [
            (Symbol::new("wmt"), Cik::new("104169").unwrap()),
            (Symbol::new("SMCI"), Cik::new("1375365").unwrap()),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.resolve(&Symbol::new("WMT")).unwrap().as_str(),
            "0000104169"
        );
    }

    #[test]
    fn test_resolve_unknown_symbol() {
        let map = CikMap::from_json_str(r#"{"PLTR": "0001321655"}"#).unwrap();
        match map.resolve(&Symbol::new("WMT")) {
            Err(FactsError::SymbolNotFound(symbol)) => assert_eq!(symbol, "WMT"),
            other => panic!("expected SymbolNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            CikMap::from_json_str(r#"["PLTR"]"#),
            Err(FactsError::Config(_))
        ));
        assert!(matches!(
            CikMap::from_json_str("not json"),
            Err(FactsError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_cik() {
        assert!(matches!(
            CikMap::from_json_str(r#"{"PLTR": "CIK1321655"}"#),
            Err(FactsError::InvalidCik(_))
        ));
        assert!(matches!(
            CikMap::from_json_str(r#"{"PLTR": null}"#),
            Err(FactsError::InvalidCik(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cik.json");
        std::fs::write(&path, r#"{"AXTI": "0001051627"}"#).unwrap();

        let map = CikMap::from_path(&path).unwrap();
        assert!(!map.is_empty());
        assert!(map.resolve(&Symbol::new("AXTI")).is_ok());

        assert!(matches!(
            CikMap::from_path(dir.path().join("missing.json")),
            Err(FactsError::Config(_))
        ));
    }
}
