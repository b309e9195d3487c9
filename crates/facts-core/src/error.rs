//! Error types for fact operations.
//!
//! This module defines [`FactsError`] which covers every failure that can occur
//! while resolving, fetching, flattening or persisting company facts.

use thiserror::Error;

/// Errors that can occur during fact operations.
#[derive(Error, Debug)]
pub enum FactsError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Error parsing data returned by the data service.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The requested symbol is not present in the CIK map.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// A CIK that is not a number of at most ten digits.
    #[error("Invalid CIK: {0:?}")]
    InvalidCik(String),

    /// A required top-level field is absent from a facts response.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The data service returned nothing for the requested CIK.
    #[error("No data found for CIK {cik}")]
    NoData {
        /// The CIK that was requested.
        cik: String,
    },

    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error writing the output workbook.
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl FactsError {
    /// Returns true for upstream data errors, after which the affected company
    /// can be skipped and the run can continue.
    ///
    /// Configuration, filesystem and workbook errors are not recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Parse(_) | Self::MissingField(_) | Self::NoData { .. }
        )
    }
}

/// Result type alias using [`FactsError`].
pub type Result<T> = std::result::Result<T, FactsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(FactsError::NoData { cik: "0000000001".into() }.is_recoverable());
        assert!(FactsError::MissingField("cik").is_recoverable());
        assert!(FactsError::Network("reset".into()).is_recoverable());
        assert!(!FactsError::SymbolNotFound("ZZZZ".into()).is_recoverable());
        assert!(!FactsError::Config("bad".into()).is_recoverable());
        assert!(!FactsError::Workbook("bad".into()).is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = FactsError::NoData {
            cik: "0001321655".into(),
        };
        assert_eq!(err.to_string(), "No data found for CIK 0001321655");
        assert_eq!(
            FactsError::MissingField("entityName").to_string(),
            "Missing required field: entityName"
        );
    }
}
