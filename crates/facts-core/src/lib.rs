#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/facts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types and transformations for EDGAR company facts.
//!
//! This crate provides the pieces shared by the fetcher, the workbook writer and
//! the pipeline:
//!
//! - [`CikMap`](resolver::CikMap) - Ticker symbol to CIK lookup
//! - [`flatten_facts`](flatten::flatten_facts) - Nested facts to flat rows
//! - [`HttpSession`](session::HttpSession) - HTTP collaborator abstraction
//! - [`FactsError`](error::FactsError) - Shared error type

/// Error types for fact operations.
pub mod error;
/// Flattening of company facts into tabular rows.
pub mod flatten;
/// Ticker symbol to CIK resolution.
pub mod resolver;
/// HTTP session abstraction.
pub mod session;
/// Core data types (Symbol, Cik, FactResponse, Observation, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use error::{FactsError, Result};
pub use flatten::{
    COLUMNS, FactTable, FlattenedRow, MAX_SHEET_NAME_LEN, flatten_facts, sanitize_sheet_name,
    sheet_name,
};
pub use resolver::CikMap;
pub use session::{HttpSession, MemorySession};
pub use types::{Cik, FactResponse, Observation, Symbol};
