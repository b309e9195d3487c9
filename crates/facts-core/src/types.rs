//! Core data types for EDGAR company facts.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`Cik`] - Zero-padded 10-digit Central Index Key
//! - [`FactResponse`] - Raw company facts document
//! - [`Observation`] - One reported value inside a facts document

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{FactsError, Result};

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Central Index Key, the data service's identifier for a filing entity.
///
/// Always stored zero-padded to ten digits, which is the form the EDGAR
/// endpoints expect in their URLs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Cik(String);

impl Cik {
    /// Width of a CIK in EDGAR URLs.
    pub const WIDTH: usize = 10;

    /// Validates and zero-pads a CIK.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::InvalidCik`] if the input is empty, contains
    /// anything but ASCII digits, or is longer than ten digits.
    pub fn new(raw: &str) -> Result<Self> {
        let digits = raw.trim();
        if digits.is_empty()
            || digits.len() > Self::WIDTH
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(FactsError::InvalidCik(raw.to_string()));
        }
        Ok(Self(format!("{:0>10}", digits)))
    }

    /// Returns the padded CIK as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cik {
    type Err = FactsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Cik {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// Raw response from the EDGAR Company Facts API.
///
/// The document is kept as untyped JSON so that a malformed observation deep in
/// the tree never rejects the whole response. Accessors treat absent, null and
/// empty values alike.
#[derive(Clone, Debug, PartialEq)]
pub struct FactResponse(Value);

impl FactResponse {
    /// Wraps an already parsed JSON document.
    #[must_use]
    pub const fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns [`FactsError::Parse`] if the body is not valid JSON.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map(Self)
            .map_err(|e| FactsError::Parse(format!("Failed to parse company facts: {}", e)))
    }

    /// The entity's CIK as reported in the document.
    ///
    /// Accepts a JSON number or a numeric string; zero counts as absent.
    #[must_use]
    pub fn cik(&self) -> Option<i64> {
        let cik = match self.0.get("cik")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }?;
        (cik != 0).then_some(cik)
    }

    /// The registrant's name, if present and non-empty.
    #[must_use]
    pub fn entity_name(&self) -> Option<&str> {
        self.0
            .get("entityName")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Facts keyed by taxonomy, if present and non-empty.
    #[must_use]
    pub fn facts(&self) -> Option<&Map<String, Value>> {
        self.0
            .get("facts")
            .and_then(Value::as_object)
            .filter(|facts| !facts.is_empty())
    }

    /// The underlying JSON document.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }
}

impl FromStr for FactResponse {
    type Err = FactsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_slice(s.as_bytes())
    }
}

/// A single reported value with its filing metadata.
///
/// Every attribute is optional: a missing or wrongly typed attribute is kept as
/// `None` instead of failing the surrounding document.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Observation {
    /// End date of the reporting period.
    pub end: Option<String>,
    /// Reported value.
    pub val: Option<f64>,
    /// Accession number of the filing.
    pub accn: Option<String>,
    /// Fiscal year.
    pub fy: Option<i64>,
    /// Fiscal period (FY, Q1, ...).
    pub fp: Option<String>,
    /// Form type (10-K, 10-Q, ...).
    pub form: Option<String>,
    /// Date the filing was made.
    pub filed: Option<String>,
    /// Aggregation frame (e.g. CY2023Q4I).
    pub frame: Option<String>,
}

impl Observation {
    /// Reads an observation from a JSON value.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            end: text("end"),
            val: value.get("val").and_then(Value::as_f64),
            accn: text("accn"),
            fy: value.get("fy").and_then(Value::as_i64),
            fp: text("fp"),
            form: text("form"),
            filed: text("filed"),
            frame: text("frame"),
        }
    }
}
