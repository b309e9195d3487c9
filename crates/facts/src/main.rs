//! `edgar-facts`: download SEC EDGAR company facts into an Excel workbook.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use facts::{
    CikMap, DEFAULT_FILE_PREFIX, DEFAULT_SHEET_SUFFIX, DEFAULT_SYMBOLS, DEFAULT_USER_AGENT,
    EdgarFetcher, Pipeline, ReqwestSession, RunConfig, Symbol, UnknownSymbolPolicy,
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ticker symbols to process [default: the built-in symbol list]
    symbols: Vec<String>,

    /// JSON file mapping ticker symbols to CIKs
    #[arg(long, default_value = "config/cik.json")]
    cik_map: PathBuf,

    /// Directory the workbook is written to
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Workbook file name prefix
    #[arg(long, default_value = DEFAULT_FILE_PREFIX)]
    prefix: String,

    /// Sheet name suffix appended to each entity name
    #[arg(long, default_value = DEFAULT_SHEET_SUFFIX)]
    suffix: String,

    /// User agent sent to the SEC, "AppName/Version (contact@email.com)"
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Skip symbols missing from the CIK map instead of aborting
    #[arg(long)]
    skip_unknown: bool,

    /// Also save each raw facts response as <DIR>/<SYMBOL>.json
    #[arg(long, value_name = "DIR")]
    save_json: Option<PathBuf>,

    /// Log filter, e.g. "info" or "facts=debug"
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        let symbols = if self.symbols.is_empty() {
            DEFAULT_SYMBOLS.iter().map(|s| Symbol::new(*s)).collect()
        } else {
            self.symbols.into_iter().map(Symbol::new).collect()
        };
        RunConfig {
            symbols,
            cik_map_path: self.cik_map,
            data_dir: self.data_dir,
            file_prefix: self.prefix,
            sheet_suffix: self.suffix,
            user_agent: self.user_agent,
            on_unknown_symbol: if self.skip_unknown {
                UnknownSymbolPolicy::Skip
            } else {
                UnknownSymbolPolicy::Abort
            },
            save_json: self.save_json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level)
                .with_context(|| format!("invalid log filter {:?}", cli.log_level))?,
        )
        .init();

    let config = cli.into_config();
    let cik_map = CikMap::from_path(&config.cik_map_path)?;
    let session = ReqwestSession::new(&config.user_agent)?;
    let pipeline = Pipeline::new(config, cik_map, EdgarFetcher::new(session));

    let report = pipeline.run().await?;

    for company in &report.processed {
        info!(
            symbol = %company.symbol,
            sheet = %company.sheet,
            rows = company.rows,
            "Written"
        );
    }
    for skipped in &report.skipped {
        info!(symbol = %skipped.symbol, reason = %skipped.reason, "Skipped");
    }
    match &report.output {
        Some(path) => println!("{}", path.display()),
        None => println!("No company produced any facts; nothing written"),
    }

    Ok(())
}
