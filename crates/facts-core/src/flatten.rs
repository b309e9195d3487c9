//! Flattening of company facts into tabular rows.
//!
//! A facts document nests taxonomy → field → metadata, where the `units`
//! metadata entry maps each unit to a list of observations. [`flatten_facts`]
//! walks that tree in document order and emits one [`FlattenedRow`] per
//! observation, carrying the name of the enclosing field.

use polars::prelude::{Column, DataFrame};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{FactsError, Result};
use crate::types::{FactResponse, Observation};

/// Column headers of a flattened facts table, in order.
pub const COLUMNS: [&str; 11] = [
    "CIK",
    "EntityName",
    "Field",
    "Timestamp",
    "Value",
    "AccountNumber",
    "FiscalYear",
    "FiscalPeriod",
    "Form",
    "FilingDate",
    "Frame",
];

/// One observation together with the entity and field it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlattenedRow {
    /// CIK reported in the document.
    pub cik: i64,
    /// Registrant name.
    pub entity_name: String,
    /// XBRL field (tag) name, e.g. `Assets`.
    pub field: String,
    /// Period end date.
    pub end: Option<String>,
    /// Reported value.
    pub val: Option<f64>,
    /// Accession number.
    pub accn: Option<String>,
    /// Fiscal year.
    pub fy: Option<i64>,
    /// Fiscal period.
    pub fp: Option<String>,
    /// Form type.
    pub form: Option<String>,
    /// Filing date.
    pub filed: Option<String>,
    /// Aggregation frame.
    pub frame: Option<String>,
}

/// All flattened rows for a single entity.
#[derive(Clone, Debug, PartialEq)]
pub struct FactTable {
    entity_name: String,
    rows: Vec<FlattenedRow>,
}

impl FactTable {
    /// Registrant name the rows belong to.
    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    /// Rows in traversal order.
    #[must_use]
    pub fn rows(&self) -> &[FlattenedRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the document held no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Builds a DataFrame with the columns listed in [`COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::Other`] if polars rejects the columns.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let text = |f: fn(&FlattenedRow) -> Option<String>| -> Vec<Option<String>> {
            rows.iter().map(f).collect()
        };

        let columns = vec![
            Column::new(
                COLUMNS[0].into(),
                rows.iter().map(|row| row.cik).collect::<Vec<i64>>(),
            ),
            Column::new(
                COLUMNS[1].into(),
                rows.iter()
                    .map(|row| row.entity_name.clone())
                    .collect::<Vec<String>>(),
            ),
            Column::new(
                COLUMNS[2].into(),
                rows.iter()
                    .map(|row| row.field.clone())
                    .collect::<Vec<String>>(),
            ),
            Column::new(COLUMNS[3].into(), text(|row| row.end.clone())),
            Column::new(
                COLUMNS[4].into(),
                rows.iter().map(|row| row.val).collect::<Vec<Option<f64>>>(),
            ),
            Column::new(COLUMNS[5].into(), text(|row| row.accn.clone())),
            Column::new(
                COLUMNS[6].into(),
                rows.iter().map(|row| row.fy).collect::<Vec<Option<i64>>>(),
            ),
            Column::new(COLUMNS[7].into(), text(|row| row.fp.clone())),
            Column::new(COLUMNS[8].into(), text(|row| row.form.clone())),
            Column::new(COLUMNS[9].into(), text(|row| row.filed.clone())),
            Column::new(COLUMNS[10].into(), text(|row| row.frame.clone())),
        ];

        DataFrame::new(columns).map_err(|e| FactsError::Other(e.to_string()))
    }
}

/// Flattens a company facts document into one row per observation.
///
/// Only the `units` entry of each field is expanded; labels and descriptions
/// are ignored. Rows are neither sorted nor deduplicated.
///
/// # Errors
///
/// Returns [`FactsError::MissingField`] if `cik`, `entityName` or `facts` is
/// absent or empty. No rows are produced in that case.
pub fn flatten_facts(response: &FactResponse) -> Result<FactTable> {
    let cik = response.cik().ok_or(FactsError::MissingField("cik"))?;
    let entity_name = response
        .entity_name()
        .ok_or(FactsError::MissingField("entityName"))?;
    let facts = response.facts().ok_or(FactsError::MissingField("facts"))?;

    let mut rows = Vec::new();
    for (taxonomy, fields) in facts {
        let Some(fields) = fields.as_object() else {
            debug!(taxonomy = %taxonomy, "Skipping taxonomy that is not an object");
            continue;
        };

        for (field, metadata) in fields {
            let Some(units) = metadata.get("units").and_then(Value::as_object) else {
                continue;
            };

            for (unit, observations) in units {
                let Some(observations) = observations.as_array() else {
                    debug!(field = %field, unit = %unit, "Skipping unit without observations");
                    continue;
                };

                rows.extend(observations.iter().map(|value| {
                    let obs = Observation::from_value(value);
                    FlattenedRow {
                        cik,
                        entity_name: entity_name.to_string(),
                        field: field.clone(),
                        end: obs.end,
                        val: obs.val,
                        accn: obs.accn,
                        fy: obs.fy,
                        fp: obs.fp,
                        form: obs.form,
                        filed: obs.filed,
                        frame: obs.frame,
                    }
                }));
            }
        }
    }

    debug!(entity = entity_name, rows = rows.len(), "Flattened company facts");

    Ok(FactTable {
        entity_name: entity_name.to_string(),
        rows,
    })
}

/// Longest sheet name a workbook accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters a workbook sheet name may not contain.
const INVALID_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Replaces characters that are not allowed in sheet names with `_` and
/// truncates to [`MAX_SHEET_NAME_LEN`] characters.
#[must_use]
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if INVALID_SHEET_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    // leading or trailing apostrophes are rejected as well
    let trimmed = cleaned.trim_matches('\'');
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Sheet name for an entity: the entity name followed by `suffix`.
///
/// The entity part is shortened so that the whole name fits in a sheet name;
/// the suffix is always kept.
#[must_use]
pub fn sheet_name(entity_name: &str, suffix: &str) -> String {
    let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
    let entity: String = entity_name.chars().take(room).collect();
    sanitize_sheet_name(&format!("{}{}", entity.trim_end(), suffix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> FactResponse {
        FactResponse::from_value(value)
    }

    #[test]
    fn test_single_observation() {
        let facts = response(json!({
            "cik": 1321655,
            "entityName": "Palantir Technologies Inc.",
            "facts": {"us-gaap": {"Assets": {"units": {"USD": [{
                "end": "2023-12-31", "val": 100, "accn": "X", "fy": 2023,
                "fp": "FY", "form": "10-K", "filed": "2024-01-01"
            }]}}}}
        }));

        let table = flatten_facts(&facts).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.rows()[0],
            FlattenedRow {
                cik: 1321655,
                entity_name: "Palantir Technologies Inc.".into(),
                field: "Assets".into(),
                end: Some("2023-12-31".into()),
                val: Some(100.0),
                accn: Some("X".into()),
                fy: Some(2023),
                fp: Some("FY".into()),
                form: Some("10-K".into()),
                filed: Some("2024-01-01".into()),
                frame: None,
            }
        );
    }

    #[test]
    fn test_row_per_observation() {
        let facts = response(json!({
            "cik": 1051627,
            "entityName": "AXT Inc",
            "facts": {
                "dei": {
                    "EntityCommonStockSharesOutstanding": {
                        "label": "Entity Common Stock, Shares Outstanding",
                        "description": "Indicate number of shares...",
                        "units": {"shares": [
                            {"end": "2023-03-31", "val": 1, "fy": 2023},
                            {"end": "2023-06-30", "val": 2, "fy": 2023}
                        ]}
                    }
                },
                "us-gaap": {
                    "Revenues": {
                        "label": "Revenues",
                        "units": {
                            "USD": [{"end": "2023-12-31", "val": 3}],
                            "EUR": [{"end": "2023-12-31", "val": 4}, {"end": "2022-12-31", "val": 5}]
                        }
                    },
                    "Labels": {"label": "No units here"}
                }
            }
        }));

        let table = flatten_facts(&facts).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.entity_name(), "AXT Inc");

        // document order, field name carried from the enclosing field
        let fields: Vec<&str> = table.rows().iter().map(|r| r.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "EntityCommonStockSharesOutstanding",
                "EntityCommonStockSharesOutstanding",
                "Revenues",
                "Revenues",
                "Revenues",
            ]
        );
        let values: Vec<Option<f64>> = table.rows().iter().map(|r| r.val).collect();
        assert_eq!(
            values,
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let obs = json!({"end": "2023-12-31", "val": 7, "accn": "A"});
        let facts = response(json!({
            "cik": 1,
            "entityName": "Dup Co",
            "facts": {"us-gaap": {"Assets": {"units": {"USD": [obs.clone(), obs]}}}}
        }));

        let table = flatten_facts(&facts).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], table.rows()[1]);
    }

    #[test]
    fn test_missing_required_fields() {
        let body = json!({"us-gaap": {"Assets": {"units": {"USD": [{"val": 1}]}}}});

        let no_cik = response(json!({"entityName": "X", "facts": body.clone()}));
        assert!(matches!(
            flatten_facts(&no_cik),
            Err(FactsError::MissingField("cik"))
        ));

        let no_name = response(json!({"cik": 1, "facts": body}));
        assert!(matches!(
            flatten_facts(&no_name),
            Err(FactsError::MissingField("entityName"))
        ));

        let no_facts = response(json!({"cik": 1, "entityName": "X"}));
        assert!(matches!(
            flatten_facts(&no_facts),
            Err(FactsError::MissingField("facts"))
        ));

        let empty_facts = response(json!({"cik": 1, "entityName": "X", "facts": {}}));
        assert!(matches!(
            flatten_facts(&empty_facts),
            Err(FactsError::MissingField("facts"))
        ));
    }

    #[test]
    fn test_missing_value_yields_null() {
        let facts = response(json!({
            "cik": 756894,
            "entityName": "Barrick Gold Corp",
            "facts": {"us-gaap": {"Assets": {"units": {"USD": [
                {"end": "2023-12-31", "accn": "Y", "fy": 2023, "fp": "FY", "form": "10-K", "filed": "2024-02-01"}
            ]}}}}
        }));

        let table = flatten_facts(&facts).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.val, None);
        assert_eq!(row.field, "Assets");
        assert_eq!(row.end.as_deref(), Some("2023-12-31"));
        assert_eq!(row.form.as_deref(), Some("10-K"));
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let facts = response(json!({
            "cik": 1,
            "entityName": "Same Co",
            "facts": {"us-gaap": {"Assets": {"units": {"USD": [{"val": 1}, {"val": 2}]}}}}
        }));

        let first = flatten_facts(&facts).unwrap();
        let second = flatten_facts(&facts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_to_frame() {
        let facts = response(json!({
            "cik": 1321655,
            "entityName": "Palantir Technologies Inc.",
            "facts": {"us-gaap": {"Assets": {"units": {"USD": [
                {"end": "2023-12-31", "val": 100, "fy": 2023, "frame": "CY2023Q4I"},
                {"end": "2022-12-31", "fy": 2022}
            ]}}}}
        }));

        let df = flatten_facts(&facts).unwrap().to_frame().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), COLUMNS.len());
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, COLUMNS.to_vec());
        assert_eq!(df.column("Value").unwrap().null_count(), 1);
        assert_eq!(df.column("Frame").unwrap().null_count(), 1);
    }

    #[test]
    fn test_sheet_name() {
        assert_eq!(sheet_name("AXT Inc", "_FACTS"), "AXT Inc_FACTS");

        let long = sheet_name("Palantir Technologies Inc. Class A", "_FACTS");
        assert_eq!(long, "Palantir Technologies Inc_FACTS");
        assert_eq!(long.chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("A/B: C*"), "A_B_ C_");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        assert_eq!(sanitize_sheet_name(""), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), MAX_SHEET_NAME_LEN);
    }
}
