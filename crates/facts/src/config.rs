//! Run configuration.

use std::path::PathBuf;

use facts_core::{FactsError, Result, Symbol};

/// Symbols processed when none are given.
pub const DEFAULT_SYMBOLS: [&str; 3] = ["PLTR", "AXTI", "GOLD"];

/// Prefix of the output workbook's file name.
pub const DEFAULT_FILE_PREFIX: &str = "EDGAR_FINANCIALS";

/// Marker appended to each entity name to form its sheet name.
pub const DEFAULT_SHEET_SUFFIX: &str = "_FACTS";

/// User agent sent to the SEC when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "edgar-facts/",
    env!("CARGO_PKG_VERSION"),
    " (contact@example.com)"
);

/// What to do when a symbol is not in the CIK map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownSymbolPolicy {
    /// Stop the run before anything is written.
    #[default]
    Abort,
    /// Log the symbol and continue with the next one.
    Skip,
}

/// Everything a [`Pipeline`](crate::Pipeline) run needs besides its
/// collaborators.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Symbols to process, in order.
    pub symbols: Vec<Symbol>,
    /// JSON file mapping symbols to CIKs.
    pub cik_map_path: PathBuf,
    /// Directory the workbook is written to.
    pub data_dir: PathBuf,
    /// Workbook file name prefix.
    pub file_prefix: String,
    /// Sheet name suffix.
    pub sheet_suffix: String,
    /// User agent for SEC requests.
    pub user_agent: String,
    /// Handling of symbols missing from the CIK map.
    pub on_unknown_symbol: UnknownSymbolPolicy,
    /// When set, every raw facts response is also written to
    /// `<dir>/<SYMBOL>.json`.
    pub save_json: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| Symbol::new(*s)).collect(),
            cik_map_path: PathBuf::from("config").join("cik.json"),
            data_dir: PathBuf::from("data"),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            sheet_suffix: DEFAULT_SHEET_SUFFIX.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            on_unknown_symbol: UnknownSymbolPolicy::default(),
            save_json: None,
        }
    }
}

impl RunConfig {
    /// Replace the symbol list.
    #[must_use]
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the unknown-symbol policy.
    #[must_use]
    pub fn with_unknown_symbol_policy(mut self, policy: UnknownSymbolPolicy) -> Self {
        self.on_unknown_symbol = policy;
        self
    }

    /// Checks the configuration before a run.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::Config`] for an empty symbol list, an empty
    /// symbol, or an empty file prefix or user agent.
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(FactsError::Config("No symbols to process".to_string()));
        }
        if self.symbols.iter().any(|s| s.as_str().is_empty()) {
            return Err(FactsError::Config("Empty symbol in symbol list".to_string()));
        }
        if self.file_prefix.trim().is_empty() {
            return Err(FactsError::Config("Empty workbook file prefix".to_string()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(FactsError::Config("Empty user agent".to_string()));
        }
        Ok(())
    }
}
