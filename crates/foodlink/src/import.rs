//! Bulk import of CSV snapshots.
//!
//! Each table is loaded from its own CSV file with a header row. Headers are
//! matched to columns case-insensitively, so `Provider_ID` fills
//! `provider_id`. A table that already holds rows is left alone, and the
//! rows of one file go in under a single transaction: a bad record leaves
//! the table as it was.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Claim, ClaimStatus, FoodListing, Provider, Receiver};
use crate::storage::{Record, Repository, Storage};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a calendar date in `YYYY-MM-DD` or `M/D/YYYY` form.
#[must_use]
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Parse a timestamp. A bare date means midnight.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| parse_date(text).and_then(|date| date.and_hms_opt(0, 0, 0)))
}

/// A record type that can be read from a CSV row.
pub trait FromCsv: Record {
    /// The row as it appears in the file.
    type Raw: DeserializeOwned;

    /// Convert a raw row, describing the problem on failure.
    ///
    /// # Errors
    ///
    /// Returns a message if a field cannot be converted.
    fn from_raw(raw: Self::Raw) -> std::result::Result<Self, String>;
}

/// Provider row with the file's field types.
#[derive(Debug, Deserialize)]
pub struct RawProvider {
    provider_id: i64,
    name: String,
    #[serde(rename = "type")]
    provider_type: Option<String>,
    address: Option<String>,
    city: Option<String>,
    contact: Option<String>,
}

impl FromCsv for Provider {
    type Raw = RawProvider;

    fn from_raw(raw: RawProvider) -> std::result::Result<Self, String> {
        Ok(Self {
            provider_id: raw.provider_id,
            name: raw.name,
            provider_type: raw.provider_type,
            address: raw.address,
            city: raw.city,
            contact: raw.contact,
        })
    }
}

/// Receiver row with the file's field types.
#[derive(Debug, Deserialize)]
pub struct RawReceiver {
    receiver_id: i64,
    name: String,
    #[serde(rename = "type")]
    receiver_type: Option<String>,
    city: Option<String>,
    contact: Option<String>,
}

impl FromCsv for Receiver {
    type Raw = RawReceiver;

    fn from_raw(raw: RawReceiver) -> std::result::Result<Self, String> {
        Ok(Self {
            receiver_id: raw.receiver_id,
            name: raw.name,
            receiver_type: raw.receiver_type,
            city: raw.city,
            contact: raw.contact,
        })
    }
}

/// Food listing row with the file's field types.
#[derive(Debug, Deserialize)]
pub struct RawFoodListing {
    food_id: i64,
    food_name: String,
    quantity: i64,
    expiry_date: String,
    provider_id: i64,
    provider_type: Option<String>,
    location: Option<String>,
    food_type: Option<String>,
    meal_type: Option<String>,
}

impl FromCsv for FoodListing {
    type Raw = RawFoodListing;

    fn from_raw(raw: RawFoodListing) -> std::result::Result<Self, String> {
        let quantity = u32::try_from(raw.quantity)
            .map_err(|_| format!("quantity {} out of range", raw.quantity))?;
        let expiry_date = parse_date(&raw.expiry_date)
            .ok_or_else(|| format!("invalid expiry date '{}'", raw.expiry_date))?;

        Ok(Self {
            food_id: raw.food_id,
            food_name: raw.food_name,
            quantity,
            expiry_date,
            provider_id: raw.provider_id,
            provider_type: raw.provider_type,
            location: raw.location,
            food_type: raw.food_type,
            meal_type: raw.meal_type,
        })
    }
}

/// Claim row with the file's field types.
#[derive(Debug, Deserialize)]
pub struct RawClaim {
    claim_id: i64,
    food_id: i64,
    receiver_id: i64,
    status: String,
    timestamp: String,
}

impl FromCsv for Claim {
    type Raw = RawClaim;

    fn from_raw(raw: RawClaim) -> std::result::Result<Self, String> {
        let status: ClaimStatus = raw.status.parse().map_err(|err| format!("{err}"))?;
        let timestamp = parse_timestamp(&raw.timestamp)
            .ok_or_else(|| format!("invalid timestamp '{}'", raw.timestamp))?;

        Ok(Self {
            claim_id: raw.claim_id,
            food_id: raw.food_id,
            receiver_id: raw.receiver_id,
            status,
            timestamp,
        })
    }
}

/// Read and convert every record of a CSV file.
///
/// # Errors
///
/// Returns [`Error::Csv`] if the file cannot be read and
/// [`Error::InvalidRecord`] for the first record that cannot be converted.
pub fn read_records<R: FromCsv>(path: &Path, delimiter: u8) -> Result<Vec<R>> {
    let csv_error = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let headers: StringRecord = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_ascii_lowercase)
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(csv_error)?;
        let line = row.position().map_or(0, csv::Position::line);
        let raw: R::Raw = row
            .deserialize(Some(&headers))
            .map_err(|err| Error::invalid_record(path, line, err.to_string()))?;
        let record = R::from_raw(raw).map_err(|message| Error::invalid_record(path, line, message))?;
        records.push(record);
    }
    Ok(records)
}

/// What happened to one table during an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// The table was empty and this many rows were inserted.
    Loaded(usize),
    /// The table already held this many rows and was left alone.
    SkippedNotEmpty(i64),
    /// The source file does not exist.
    MissingFile(PathBuf),
}

/// Load one table from a CSV file if the table is empty.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or an insert fails. In
/// either case no row of the file is kept.
pub fn load_table<R: FromCsv>(
    storage: &Storage,
    path: &Path,
    delimiter: u8,
) -> Result<ImportOutcome> {
    if !path.exists() {
        warn!("No CSV for {} at {}", R::TABLE, path.display());
        return Ok(ImportOutcome::MissingFile(path.to_path_buf()));
    }

    let existing = Repository::<R>::new(storage.connection()).count()?;
    if existing > 0 {
        info!("{} already has {existing} rows, skipping import", R::TABLE);
        return Ok(ImportOutcome::SkippedNotEmpty(existing));
    }

    debug!("Reading {} from {}", R::TABLE, path.display());
    let records = read_records::<R>(path, delimiter)?;

    let tx = storage.connection().unchecked_transaction()?;
    {
        let repository = Repository::<R>::new(&tx);
        for record in &records {
            repository.insert(record)?;
        }
    }
    tx.commit()?;

    info!("Loaded {} rows into {}", records.len(), R::TABLE);
    Ok(ImportOutcome::Loaded(records.len()))
}

/// Locations of the four CSV files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFiles {
    /// Providers file.
    pub providers: PathBuf,
    /// Receivers file.
    pub receivers: PathBuf,
    /// Food listings file.
    pub food_listings: PathBuf,
    /// Claims file.
    pub claims: PathBuf,
    /// Field delimiter.
    pub delimiter: u8,
}

/// Outcome for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableImport {
    /// Table name.
    pub table: &'static str,
    /// What happened.
    #[serde(flatten)]
    pub outcome: ImportOutcome,
}

/// Outcome of [`load_all`], one entry per table in load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Per-table outcomes.
    pub tables: Vec<TableImport>,
}

impl ImportReport {
    /// Rows inserted across all tables.
    #[must_use]
    pub fn total_loaded(&self) -> usize {
        self.tables
            .iter()
            .map(|t| match t.outcome {
                ImportOutcome::Loaded(n) => n,
                _ => 0,
            })
            .sum()
    }

    fn push<R: Record>(&mut self, outcome: ImportOutcome) {
        self.tables.push(TableImport {
            table: R::TABLE,
            outcome,
        });
    }
}

/// Load providers, receivers, food listings and claims, in that order.
///
/// Stops at the first table that fails; tables loaded before it stay loaded.
///
/// # Errors
///
/// Returns an error if any table fails to load.
pub fn load_all(storage: &Storage, files: &CsvFiles) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let d = files.delimiter;

    report.push::<Provider>(load_table::<Provider>(storage, &files.providers, d)?);
    report.push::<Receiver>(load_table::<Receiver>(storage, &files.receivers, d)?);
    report.push::<FoodListing>(load_table::<FoodListing>(storage, &files.food_listings, d)?);
    report.push::<Claim>(load_table::<Claim>(storage, &files.claims, d)?);

    info!("Import finished: {} rows loaded", report.total_loaded());
    Ok(report)
}
