#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/facts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Download SEC EDGAR company facts into an Excel workbook.
//!
//! This crate re-exports the core types, the EDGAR fetcher and the workbook
//! writer, and provides the [`Pipeline`] that runs them in sequence for a list
//! of symbols:
//!
//! 1. resolve each symbol to a CIK through a [`CikMap`]
//! 2. fetch the company facts with an [`EdgarFetcher`]
//! 3. flatten them with [`flatten_facts`]
//! 4. queue the table in a [`WorkbookWriter`]
//!
//! and finally persists every sheet in one timestamped workbook.

// Core types and traits
pub use facts_core::*;

// Fetcher and writer
pub use facts_edgar::{EdgarFetcher, ReqwestSession};
pub use facts_xlsx::{WorkbookWriter, workbook_file_name};

mod config;
pub use config::{
    DEFAULT_FILE_PREFIX, DEFAULT_SHEET_SUFFIX, DEFAULT_SYMBOLS, DEFAULT_USER_AGENT, RunConfig,
    UnknownSymbolPolicy,
};

mod pipeline;
pub use pipeline::{Pipeline, ProcessedCompany, RunReport, SkippedSymbol};
