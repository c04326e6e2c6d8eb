//! Firm table loading.
//!
//! The table is a header-first UTF-8 CSV. Columns are matched by header name;
//! unknown columns are ignored and optional columns may be absent entirely.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::DataLoadError;
use crate::model::{ArDetail, FirmRecord, Relationship};

const REQUIRED_COLUMNS: [&str; 3] = ["name", "postcode", "principal_rep_name"];

/// Raw CSV row as written by the harvester and spreadsheet exports.
#[derive(Debug, Deserialize)]
struct FirmRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    regulatory_number: Option<String>,
    #[serde(default)]
    company_number: Option<String>,
    #[serde(default)]
    postcode: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    services: Option<String>,
    #[serde(default)]
    gps_latitude: Option<String>,
    #[serde(default)]
    gps_longitude: Option<String>,
    #[serde(default)]
    principal_rep_name: Option<String>,
    #[serde(default)]
    principal_rep_reg_number: Option<String>,
    #[serde(default, rename = "AR_relationship")]
    ar_relationship: Option<String>,
    #[serde(default, rename = "ARDetails")]
    ar_details: Option<String>,
}

/// All firms from one load of the source table, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FirmTable {
    records: Vec<FirmRecord>,
}

impl FirmTable {
    #[must_use]
    pub fn new(records: Vec<FirmRecord>) -> Self {
        Self { records }
    }

    /// Load the table from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError::Io`] if the file cannot be opened, and
    /// otherwise the errors of [`FirmTable::from_reader`].
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let file = std::fs::File::open(path).map_err(|e| DataLoadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let table = Self::from_reader(file)?;
        tracing::debug!(path = %path.display(), rows = table.len(), "loaded firm table");
        Ok(table)
    }

    /// Parse the table from any CSV reader.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError::MissingColumn`] when a required header is
    /// absent and [`DataLoadError::Csv`] for malformed rows or invalid UTF-8.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(DataLoadError::MissingColumn(column));
            }
        }

        let mut records = Vec::new();
        for row in csv_reader.deserialize::<FirmRow>() {
            records.push(FirmRecord::from(row?));
        }
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[FirmRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows that can be mapped (non-blank postcode).
    pub fn eligible(&self) -> impl Iterator<Item = &FirmRecord> {
        self.records.iter().filter(|r| r.is_mappable())
    }

    /// Distinct non-empty `principal_rep_name` values, sorted.
    #[must_use]
    pub fn principal_names(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.principal_rep_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl From<FirmRow> for FirmRecord {
    fn from(row: FirmRow) -> Self {
        let name = clean(row.name).unwrap_or_default();
        let ar_details = parse_ar_details(&name, clean(row.ar_details).as_deref());
        FirmRecord {
            regulatory_number: clean(row.regulatory_number).unwrap_or_default(),
            company_number: clean(row.company_number),
            postcode: clean(row.postcode),
            address: clean(row.address),
            website: clean(row.website),
            services: clean(row.services),
            gps_latitude: parse_float(row.gps_latitude),
            gps_longitude: parse_float(row.gps_longitude),
            principal_rep_name: clean(row.principal_rep_name),
            principal_rep_reg_number: clean(row.principal_rep_reg_number),
            ar_relationship: Relationship::from_field(clean(row.ar_relationship).as_deref()),
            ar_details,
            name,
        }
    }
}

/// Trim a cell; empty cells and the `nan` export placeholder become `None`.
fn clean(cell: Option<String>) -> Option<String> {
    let cell = cell?;
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else if trimmed.len() == cell.len() {
        Some(cell)
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_float(cell: Option<String>) -> Option<f64> {
    let raw = clean(cell)?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            tracing::debug!(value = %raw, "ignoring non-numeric GPS cell");
            None
        }
    }
}

fn parse_ar_details(firm: &str, raw: Option<&str>) -> Vec<ArDetail> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<ArDetail>>(raw) {
        Ok(details) => details,
        Err(e) => {
            tracing::warn!(firm, error = %e, "ignoring malformed ARDetails cell");
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
