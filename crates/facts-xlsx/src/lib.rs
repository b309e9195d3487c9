#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/facts/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Workbook writer for flattened company facts.
//!
//! # Example
//!
//! ```no_run
//! use facts_xlsx::{WorkbookWriter, workbook_file_name};
//! use polars::prelude::*;
//!
//! let df = DataFrame::new(vec![Column::new("Field".into(), vec!["Assets"])]).unwrap();
//!
//! let mut writer = WorkbookWriter::new();
//! writer.add_sheet(df, "AXT Inc_FACTS");
//!
//! let name = workbook_file_name("EDGAR_FINANCIALS", chrono::Local::now().naive_local());
//! writer.save(&name, "data").unwrap();
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use facts_core::{FactsError, MAX_SHEET_NAME_LEN, Result, sanitize_sheet_name};
use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::{debug, info, warn};

/// Rows available on a worksheet, header included.
const MAX_ROWS: usize = 1_048_576;

/// Columns available on a worksheet.
const MAX_COLUMNS: usize = 16_384;

/// Entity characters kept in front of a duplicate marker.
const MIN_STEM_LEN: usize = 8;

/// Builds the output file name `PREFIX_YYYYMMDD_HHMMSS.xlsx`.
#[must_use]
pub fn workbook_file_name(prefix: &str, at: NaiveDateTime) -> String {
    format!("{}_{}.xlsx", prefix, at.format("%Y%m%d_%H%M%S"))
}

/// Accumulates tables as named sheets and persists them as one workbook.
#[derive(Debug, Default)]
pub struct WorkbookWriter {
    sheets: Vec<(String, DataFrame)>,
}

impl WorkbookWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `frame` as a sheet and returns the name it will be written under.
    ///
    /// The name is sanitised for the xlsx format. Sheet names compare
    /// case-insensitively, so a name already in use gets a ` (n)` marker
    /// inserted before its last `_`-delimited segment, or appended when there
    /// is none.
    pub fn add_sheet(&mut self, frame: DataFrame, name: &str) -> String {
        let name = self.unique_name(&sanitize_sheet_name(name));
        debug!(sheet = %name, rows = frame.height(), "Adding sheet");
        self.sheets.push((name.clone(), frame));
        name
    }

    /// Names of the queued sheets, in insertion order.
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Number of queued sheets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Returns true if no sheet has been queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Writes every queued sheet to `dir/file_name`, creating `dir` if needed.
    ///
    /// Returns the written path, or `None` when there was nothing to write.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::Io`] if the directory cannot be created and
    /// [`FactsError::Workbook`] if a table does not fit on a worksheet or the
    /// file cannot be written.
    pub fn save(&self, file_name: &str, dir: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        if self.sheets.is_empty() {
            warn!("No sheets to save, skipping workbook");
            return Ok(None);
        }

        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(file_name);

        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        for (name, frame) in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name).map_err(xlsx_error)?;
            write_frame(worksheet, frame, &header)?;
        }

        info!(path = %path.display(), sheets = self.sheets.len(), "Saving workbook");
        workbook.save(&path).map_err(xlsx_error)?;

        Ok(Some(path))
    }

    fn is_taken(&self, name: &str) -> bool {
        self.sheets
            .iter()
            .any(|(taken, _)| taken.to_lowercase() == name.to_lowercase())
    }

    fn unique_name(&self, name: &str) -> String {
        if !self.is_taken(name) {
            return name.to_string();
        }

        let (stem, tail) = match name.rfind('_') {
            Some(idx) => name.split_at(idx),
            None => (name, ""),
        };

        let mut n = 2;
        loop {
            let marker = format!(" ({})", n);
            let marker_len = marker.chars().count();
            // keep part of the entity even when the suffix alone fills the name
            let kept_stem = stem.chars().count().min(MIN_STEM_LEN);
            let tail_room = MAX_SHEET_NAME_LEN.saturating_sub(marker_len + kept_stem);
            let tail: String = tail.chars().take(tail_room).collect();
            let stem_room =
                MAX_SHEET_NAME_LEN.saturating_sub(marker_len + tail.chars().count());
            let stem: String = stem.chars().take(stem_room).collect();
            let candidate = format!("{}{}{}", stem, marker, tail);
            if !self.is_taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Writes a bold header row followed by one row per DataFrame row.
fn write_frame(worksheet: &mut Worksheet, frame: &DataFrame, header: &Format) -> Result<()> {
    if frame.height() + 1 > MAX_ROWS || frame.width() > MAX_COLUMNS {
        return Err(FactsError::Workbook(format!(
            "Table of {} rows x {} columns does not fit on a worksheet",
            frame.height(),
            frame.width()
        )));
    }

    for (col, column) in frame.get_columns().iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, column.name().as_str(), header)
            .map_err(xlsx_error)?;

        for idx in 0..frame.height() {
            let value = column
                .get(idx)
                .map_err(|e| FactsError::Workbook(e.to_string()))?;
            write_cell(worksheet, idx as u32 + 1, col, value)?;
        }
    }

    worksheet.set_freeze_panes(1, 0).map_err(xlsx_error)?;
    worksheet.autofit();

    Ok(())
}

/// Writes one value; nulls leave the cell blank.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: AnyValue<'_>,
) -> Result<()> {
    match value {
        AnyValue::Null => return Ok(()),
        AnyValue::String(s) => worksheet.write_string(row, col, s),
        AnyValue::StringOwned(s) => worksheet.write_string(row, col, s.as_str()),
        AnyValue::Float64(v) => worksheet.write_number(row, col, v),
        AnyValue::Float32(v) => worksheet.write_number(row, col, v),
        AnyValue::Int64(v) => worksheet.write_number(row, col, v as f64),
        AnyValue::Int32(v) => worksheet.write_number(row, col, v),
        AnyValue::UInt32(v) => worksheet.write_number(row, col, v),
        AnyValue::Boolean(v) => worksheet.write_boolean(row, col, v),
        other => worksheet.write_string(row, col, other.to_string()),
    }
    .map_err(xlsx_error)?;

    Ok(())
}

fn xlsx_error(e: XlsxError) -> FactsError {
    FactsError::Workbook(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use chrono::NaiveDate;
    use polars::prelude::*;

    fn frame(fields: &[&str], values: &[Option<f64>]) -> DataFrame {
        DataFrame::new(vec![
            Column::new("Field".into(), fields.to_vec()),
            Column::new("Value".into(), values.to_vec()),
        ])
        .unwrap()
    }

    #[test]
    fn test_workbook_file_name() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(9, 3, 7)
            .unwrap();
        assert_eq!(
            workbook_file_name("EDGAR_FINANCIALS", at),
            "EDGAR_FINANCIALS_20240105_090307.xlsx"
        );
    }

    #[test]
    fn test_duplicate_names() {
        let mut writer = WorkbookWriter::new();
        let df = frame(&["Assets"], &[Some(1.0)]);
        let first = writer.add_sheet(df.clone(), "Barrick Gold Corp_FACTS");
        let second = writer.add_sheet(df.clone(), "barrick gold corp_FACTS");
        let third = writer.add_sheet(df, "Barrick Gold Corp_FACTS");

        assert_eq!(first, "Barrick Gold Corp_FACTS");
        assert_eq!(second, "barrick gold corp (2)_FACTS");
        assert_eq!(third, "Barrick Gold Corp (3)_FACTS");
        assert_eq!(writer.len(), 3);
        assert_eq!(writer.sheet_names(), vec![first, second, third]);
    }

    #[test]
    fn test_duplicate_names_with_long_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let suffix = "_ABCDEFGHIJKLMNOPQRSTUVWXYZ12";
        let name = facts_core::sheet_name("Alphabet Inc.", suffix);

        let mut writer = WorkbookWriter::new();
        let first = writer.add_sheet(frame(&["Assets"], &[Some(1.0)]), &name);
        let second = writer.add_sheet(frame(&["Assets"], &[Some(2.0)]), &name);

        assert_eq!(first, "Al_ABCDEFGHIJKLMNOPQRSTUVWXYZ12");
        assert_eq!(second, "Al (2)_ABCDEFGHIJKLMNOPQRSTUVWX");
        assert_eq!(writer.sheet_names(), vec![first.as_str(), second.as_str()]);
        for name in writer.sheet_names() {
            assert!(name.chars().count() <= MAX_SHEET_NAME_LEN);
        }

        let path = writer.save("LONG.xlsx", dir.path()).unwrap().unwrap();
        let workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![first, second]);
    }

    #[test]
    fn test_save_without_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let writer = WorkbookWriter::new();
        assert!(writer.is_empty());

        let out = writer.save("EMPTY.xlsx", dir.path()).unwrap();
        assert!(out.is_none());
        assert!(!dir.path().join("EMPTY.xlsx").exists());
    }

    #[test]
    fn test_save_two_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("data");

        let mut writer = WorkbookWriter::new();
        writer.add_sheet(
            frame(&["Assets", "Liabilities"], &[Some(100.0), None]),
            "Palantir Technologies Inc_FACTS",
        );
        writer.add_sheet(frame(&["Revenues"], &[Some(5.5)]), "AXT Inc_FACTS");

        let path = writer.save("TEST.xlsx", &out_dir).unwrap().unwrap();
        assert_eq!(path, out_dir.join("TEST.xlsx"));

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Palantir Technologies Inc_FACTS", "AXT Inc_FACTS"]
        );

        let range = workbook
            .worksheet_range("Palantir Technologies Inc_FACTS")
            .unwrap();
        assert_eq!(range.height(), 3);
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("Field".to_string()))
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(100.0)));
        assert!(matches!(range.get_value((2, 1)), None | Some(Data::Empty)));
    }
}
