//! Fills the `ARDetails` column of a firm list from the register.
//!
//! Rows are fetched by a bounded pool of workers. Every result is sent to a
//! single writer that owns the table, updates the row and rewrites the output
//! file (temp file + rename), so an interrupted run keeps everything fetched
//! so far.

use std::fs::File;
use std::path::{Path, PathBuf};

use armap_core::ArDetail;
use csv::StringRecord;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::mpsc;

use crate::error::RegisterError;
use crate::source::RegisterSource;

pub const FRN_COLUMN: &str = "SearchedFCANumber";
pub const AR_COUNT_COLUMN: &str = "NumberOfCurrentARs";
pub const DETAILS_COLUMN: &str = "ARDetails";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestConfig {
    pub max_concurrent: usize,
    /// Firms reporting fewer ARs than this are left alone.
    pub min_ar_count: u32,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            min_ar_count: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// A row selected for fetching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestJob {
    /// Zero-based data row index (header excluded).
    pub row: usize,
    pub frn: String,
    pub reported_ars: u32,
}

/// The harvest input held in memory: header plus raw records, every column
/// kept as read.
#[derive(Debug, Clone)]
pub struct HarvestTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    frn_idx: usize,
    count_idx: usize,
    details_idx: usize,
}

impl HarvestTable {
    /// Reads a harvest table from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Io`] if the file cannot be opened, and the
    /// errors of [`HarvestTable::from_reader`] otherwise.
    pub fn load(path: &Path) -> Result<Self, RegisterError> {
        let file = File::open(path).map_err(|e| RegisterError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_reader(file)
    }

    /// Parses a harvest table. An `ARDetails` column is appended when the
    /// input has none.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Csv`] on malformed CSV and
    /// [`RegisterError::MissingColumn`] if the FRN or AR count column is
    /// absent.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, RegisterError> {
        let mut reader = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
        let mut headers = reader.headers()?.clone();

        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let frn_idx = position(FRN_COLUMN).ok_or(RegisterError::MissingColumn(FRN_COLUMN))?;
        let count_idx =
            position(AR_COUNT_COLUMN).ok_or(RegisterError::MissingColumn(AR_COUNT_COLUMN))?;
        let existing_details = position(DETAILS_COLUMN);

        let mut rows = reader
            .records()
            .collect::<Result<Vec<StringRecord>, csv::Error>>()?;

        let details_idx = match existing_details {
            Some(idx) => idx,
            None => {
                headers.push_field(DETAILS_COLUMN);
                for row in &mut rows {
                    row.push_field("");
                }
                headers.len() - 1
            }
        };

        Ok(Self {
            headers,
            rows,
            frn_idx,
            count_idx,
            details_idx,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Splits the table into rows to fetch and the number of rows skipped:
    /// blank FRN, unreadable AR count, or fewer than `min_ar_count` ARs.
    #[must_use]
    pub fn plan(&self, min_ar_count: u32) -> (Vec<HarvestJob>, usize) {
        let mut jobs = Vec::new();
        let mut skipped = 0;

        for (row, record) in self.rows.iter().enumerate() {
            let frn = record.get(self.frn_idx).unwrap_or_default().trim();
            if frn.is_empty() {
                tracing::debug!(row, "skipping row without FRN");
                skipped += 1;
                continue;
            }

            let raw_count = record.get(self.count_idx).unwrap_or_default();
            let Some(reported_ars) = parse_count(raw_count) else {
                tracing::warn!(row, frn, raw_count, "unreadable AR count; skipping");
                skipped += 1;
                continue;
            };
            if reported_ars < min_ar_count {
                skipped += 1;
                continue;
            }

            jobs.push(HarvestJob {
                row,
                frn: frn.to_owned(),
                reported_ars,
            });
        }

        (jobs, skipped)
    }

    /// The `ARDetails` cell of data row `row`, if the row exists.
    #[must_use]
    pub fn details(&self, row: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(self.details_idx))
    }

    fn set_details(&mut self, row: usize, value: &str) {
        let idx = self.details_idx;
        if let Some(record) = self.rows.get_mut(row) {
            let mut updated = StringRecord::with_capacity(record.as_slice().len(), record.len());
            for (i, field) in record.iter().enumerate() {
                updated.push_field(if i == idx { value } else { field });
            }
            *record = updated;
        }
    }

    /// Writes the table to `destination` through a sibling temp file and a
    /// rename, so readers never observe a half-written file.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Io`] or [`RegisterError::Csv`] if the file
    /// cannot be written.
    pub fn write_atomic(&self, destination: &Path) -> Result<(), RegisterError> {
        let tmp = temp_path(destination);
        let io_err = |path: &Path| {
            let path = path.display().to_string();
            move |source| RegisterError::Io { path, source }
        };

        let file = File::create(&tmp).map_err(io_err(&tmp))?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().map_err(io_err(&tmp))?;
        drop(writer);

        std::fs::rename(&tmp, destination).map_err(io_err(destination))
    }
}

/// Fetches AR lists for every eligible row of `input` and writes the
/// completed table to `output` (which may be the same path).
///
/// Individual fetch failures are logged and counted; they never stop the
/// run. The output is rewritten after every successful fetch.
///
/// # Errors
///
/// Returns an error if the input cannot be read or the output cannot be
/// written.
pub async fn harvest<S: RegisterSource>(
    source: &S,
    input: &Path,
    output: &Path,
    config: HarvestConfig,
) -> Result<HarvestSummary, RegisterError> {
    let table = HarvestTable::load(input)?;
    let (jobs, skipped) = table.plan(config.min_ar_count);
    tracing::info!(
        rows = table.len(),
        eligible = jobs.len(),
        skipped,
        max_concurrent = config.max_concurrent,
        "starting harvest"
    );

    // Materialise the output up front so it exists even if nothing is fetched.
    table.write_atomic(output)?;

    let attempted = jobs.len();
    let max_concurrent = config.max_concurrent.max(1);
    let (tx, rx) = mpsc::channel::<Fetched>(max_concurrent);

    let fetch = async move {
        stream::iter(jobs)
            .map(|job| async move {
                let result = source.appointed_representatives(&job.frn).await;
                Fetched { job, result }
            })
            .buffer_unordered(max_concurrent)
            .map(Ok::<_, mpsc::error::SendError<Fetched>>)
            .try_for_each(|fetched| {
                let tx = tx.clone();
                async move { tx.send(fetched).await }
            })
            .await
            .unwrap_or_else(|_| {
                tracing::debug!("writer has stopped; abandoning remaining lookups");
            });
    };
    let write = write_results(table, output.to_path_buf(), rx);

    let ((), tally) = tokio::join!(fetch, write);
    let tally = tally?;

    let summary = HarvestSummary {
        attempted,
        succeeded: tally.succeeded,
        failed: tally.failed,
        skipped,
    };
    if summary.failed > 0 {
        tracing::warn!(
            failed = summary.failed,
            attempted = summary.attempted,
            "some firms could not be fetched"
        );
    }
    tracing::info!(
        attempted = summary.attempted,
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        output = %output.display(),
        "harvest complete"
    );
    Ok(summary)
}

struct Fetched {
    job: HarvestJob,
    result: Result<Vec<ArDetail>, RegisterError>,
}

#[derive(Default)]
struct Tally {
    succeeded: usize,
    failed: usize,
}

/// Sole owner of the table while workers run.
async fn write_results(
    mut table: HarvestTable,
    output: PathBuf,
    mut rx: mpsc::Receiver<Fetched>,
) -> Result<Tally, RegisterError> {
    let mut tally = Tally::default();

    while let Some(Fetched { job, result }) = rx.recv().await {
        match result {
            Ok(details) => {
                let encoded =
                    serde_json::to_string(&details).map_err(|e| RegisterError::Serialize {
                        frn: job.frn.clone(),
                        source: e,
                    })?;
                table.set_details(job.row, &encoded);
                table.write_atomic(&output)?;
                tally.succeeded += 1;
                tracing::info!(
                    frn = %job.frn,
                    reported = job.reported_ars,
                    fetched = details.len(),
                    "stored appointed representatives"
                );
            }
            Err(e) => {
                tally.failed += 1;
                tracing::warn!(frn = %job.frn, error = %e, "register lookup failed");
            }
        }
    }

    Ok(tally)
}

/// Reads a reported AR count. Accepts integral floats (`"12.0"`) as written
/// by spreadsheet exports.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return Some(n);
    }
    let value = trimmed.parse::<f64>().ok()?;
    let integral = value.is_finite() && value.fract().abs() < f64::EPSILON;
    (integral && (0.0..=f64::from(u32::MAX)).contains(&value)).then(|| value as u32)
}

fn temp_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    destination.with_file_name(name)
}

#[cfg(test)]
#[path = "harvest_test.rs"]
mod tests;
