//! Sequential resolve → fetch → flatten → write pipeline.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{debug, error, info, warn};

use facts_core::{
    Cik, CikMap, FactResponse, FactsError, HttpSession, Result, Symbol, flatten_facts, sheet_name,
};
use facts_edgar::EdgarFetcher;
use facts_xlsx::{WorkbookWriter, workbook_file_name};

use crate::config::{RunConfig, UnknownSymbolPolicy};

/// Rows of each table shown in debug logs.
const PREVIEW_ROWS: usize = 5;

/// A company that made it into the workbook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedCompany {
    /// Requested symbol.
    pub symbol: Symbol,
    /// Registrant name from the facts document.
    pub entity_name: String,
    /// Sheet the rows were written to.
    pub sheet: String,
    /// Number of rows written.
    pub rows: usize,
}

/// A symbol that was skipped, with the reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedSymbol {
    /// Requested symbol.
    pub symbol: Symbol,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of a [`Pipeline::run`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Companies written to the workbook, in processing order.
    pub processed: Vec<ProcessedCompany>,
    /// Symbols skipped because of upstream data errors or an unknown symbol.
    pub skipped: Vec<SkippedSymbol>,
    /// Path of the workbook, or `None` when no company produced a sheet.
    pub output: Option<PathBuf>,
}

/// Wires the CIK map, the fetcher and the workbook writer together.
///
/// Construction does no work; everything happens in [`Pipeline::run`].
///
/// # Example
///
/// ```no_run
/// use facts::{CikMap, EdgarFetcher, Pipeline, ReqwestSession, RunConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = RunConfig::default().with_symbols(["PLTR"]);
///     let cik_map = CikMap::from_path(&config.cik_map_path)?;
///     let fetcher = EdgarFetcher::new(ReqwestSession::new(&config.user_agent)?);
///
///     let report = Pipeline::new(config, cik_map, fetcher).run().await?;
///     println!("{:?}", report.output);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Pipeline<S> {
    config: RunConfig,
    cik_map: CikMap,
    fetcher: EdgarFetcher<S>,
}

impl<S: HttpSession> Pipeline<S> {
    /// Create a pipeline from its collaborators.
    #[must_use]
    pub const fn new(config: RunConfig, cik_map: CikMap, fetcher: EdgarFetcher<S>) -> Self {
        Self {
            config,
            cik_map,
            fetcher,
        }
    }

    /// The configuration this pipeline runs with.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Processes every configured symbol and writes the workbook, named after
    /// the current local time.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::run_at`].
    pub async fn run(&self) -> Result<RunReport> {
        self.run_at(Local::now().naive_local()).await
    }

    /// Processes every configured symbol and writes the workbook, named after
    /// `at`.
    ///
    /// Companies with upstream data errors (nothing returned, unparseable
    /// body, missing required fields) are skipped. An unknown symbol aborts the
    /// run before anything is written unless the policy is
    /// [`UnknownSymbolPolicy::Skip`].
    ///
    /// # Errors
    ///
    /// Returns configuration errors, unknown symbols under
    /// [`UnknownSymbolPolicy::Abort`], and workbook/filesystem errors.
    pub async fn run_at(&self, at: NaiveDateTime) -> Result<RunReport> {
        self.config.validate()?;
        info!(symbols = ?self.config.symbols, "Processing symbols");

        let mut writer = WorkbookWriter::new();
        let mut report = RunReport::default();

        for symbol in &self.config.symbols {
            let cik = match self.cik_map.resolve(symbol) {
                Ok(cik) => cik,
                Err(e) => match self.config.on_unknown_symbol {
                    UnknownSymbolPolicy::Abort => {
                        error!(%symbol, "Symbol is not in the CIK map, aborting");
                        return Err(e);
                    }
                    UnknownSymbolPolicy::Skip => {
                        warn!(%symbol, "Symbol is not in the CIK map, skipping");
                        report.skipped.push(SkippedSymbol {
                            symbol: symbol.clone(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                },
            };

            match self.process(symbol, cik, &mut writer).await {
                Ok(company) => report.processed.push(company),
                Err(e) if e.is_recoverable() => {
                    warn!(%symbol, %cik, error = %e, "Skipping company");
                    report.skipped.push(SkippedSymbol {
                        symbol: symbol.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let file_name = workbook_file_name(&self.config.file_prefix, at);
        report.output = writer.save(&file_name, &self.config.data_dir)?;

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "Run finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        symbol: &Symbol,
        cik: &Cik,
        writer: &mut WorkbookWriter,
    ) -> Result<ProcessedCompany> {
        let response = self.fetcher.fetch_company_facts(cik).await?;

        if let Some(dir) = &self.config.save_json
            && let Err(e) = save_json(dir, symbol, &response).await
        {
            warn!(%symbol, error = %e, "Failed to save raw facts");
        }

        let table = flatten_facts(&response)?;
        let frame = table.to_frame()?;
        debug!("{}\n{}", table.entity_name(), frame.head(Some(PREVIEW_ROWS)));

        let sheet = writer.add_sheet(
            frame,
            &sheet_name(table.entity_name(), &self.config.sheet_suffix),
        );
        info!(
            %symbol,
            entity = table.entity_name(),
            rows = table.len(),
            sheet = %sheet,
            "Flattened company facts"
        );

        Ok(ProcessedCompany {
            symbol: symbol.clone(),
            entity_name: table.entity_name().to_string(),
            sheet,
            rows: table.len(),
        })
    }
}

/// Writes a raw facts document to `<dir>/<SYMBOL>.json`, pretty-printed.
async fn save_json(dir: &Path, symbol: &Symbol, response: &FactResponse) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.json", symbol));
    info!(path = %path.display(), "Saving raw facts");

    let json = serde_json::to_vec_pretty(response.as_value())
        .map_err(|e| FactsError::Other(e.to_string()))?;
    tokio::fs::write(&path, json).await?;
    Ok(path)
}
