//! Named analyses with generic tabular results.
//!
//! Every [`Analysis`] maps to one statement in [`super::sql`]. [`run`] binds
//! the parameters the statement needs from [`ReportParams`] and returns the
//! rows as a [`ResultSet`] of JSON cells, which is what the CLI renders.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::sql;
use crate::error::{Error, Result};

/// One of the fixed analytical questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analysis {
    /// Providers per city.
    ProvidersPerCity,
    /// Receivers per city.
    ReceiversPerCity,
    /// Provider type by total listed quantity.
    TopProviderType,
    /// Provider contacts in a city.
    ProviderContacts,
    /// Receiver with the most claims.
    TopReceiver,
    /// Quantity not yet expired.
    TotalAvailable,
    /// City with the most listings.
    TopListingCity,
    /// Food-type frequency.
    FoodTypes,
    /// Claims per listing.
    ClaimsPerFood,
    /// Provider with the most completed claims.
    TopProviderCompleted,
    /// Claim status distribution.
    ClaimStatusShare,
    /// Average claimed quantity per receiver.
    AvgQuantityPerReceiver,
    /// Most claimed meal type.
    TopMealType,
    /// Total quantity listed per provider.
    DonatedPerProvider,
    /// Expired listings nobody claimed.
    ExpiredUnclaimed,
}

/// What a statement's `?1` is bound to.
enum Binding {
    None,
    City,
    AsOf,
    Limit,
}

impl Analysis {
    /// Every analysis, in catalog order.
    pub const ALL: [Self; 15] = [
        Self::ProvidersPerCity,
        Self::ReceiversPerCity,
        Self::TopProviderType,
        Self::ProviderContacts,
        Self::TopReceiver,
        Self::TotalAvailable,
        Self::TopListingCity,
        Self::FoodTypes,
        Self::ClaimsPerFood,
        Self::TopProviderCompleted,
        Self::ClaimStatusShare,
        Self::AvgQuantityPerReceiver,
        Self::TopMealType,
        Self::DonatedPerProvider,
        Self::ExpiredUnclaimed,
    ];

    /// Catalog name, as accepted on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ProvidersPerCity => "providers-per-city",
            Self::ReceiversPerCity => "receivers-per-city",
            Self::TopProviderType => "top-provider-type",
            Self::ProviderContacts => "provider-contacts",
            Self::TopReceiver => "top-receiver",
            Self::TotalAvailable => "total-available",
            Self::TopListingCity => "top-listing-city",
            Self::FoodTypes => "food-types",
            Self::ClaimsPerFood => "claims-per-food",
            Self::TopProviderCompleted => "top-provider-completed",
            Self::ClaimStatusShare => "claim-status-share",
            Self::AvgQuantityPerReceiver => "avg-quantity-per-receiver",
            Self::TopMealType => "top-meal-type",
            Self::DonatedPerProvider => "donated-per-provider",
            Self::ExpiredUnclaimed => "expired-unclaimed",
        }
    }

    /// Human-readable heading.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::ProvidersPerCity => "Providers per city",
            Self::ReceiversPerCity => "Receivers per city",
            Self::TopProviderType => "Top provider type by quantity",
            Self::ProviderContacts => "Provider contacts by city",
            Self::TopReceiver => "Top receiver by claims",
            Self::TotalAvailable => "Total available quantity (not expired)",
            Self::TopListingCity => "City with most food listings",
            Self::FoodTypes => "Most common food types",
            Self::ClaimsPerFood => "Claims per food item",
            Self::TopProviderCompleted => "Top provider by successful claims",
            Self::ClaimStatusShare => "Percentage of claim statuses",
            Self::AvgQuantityPerReceiver => "Average quantity claimed per receiver",
            Self::TopMealType => "Most claimed meal type",
            Self::DonatedPerProvider => "Total quantity donated by each provider",
            Self::ExpiredUnclaimed => "Expired but unclaimed food items",
        }
    }

    /// The SQL statement behind this analysis.
    #[must_use]
    pub fn sql(self) -> &'static str {
        match self {
            Self::ProvidersPerCity => sql::PROVIDERS_PER_CITY,
            Self::ReceiversPerCity => sql::RECEIVERS_PER_CITY,
            Self::TopProviderType => sql::TOP_PROVIDER_TYPE_BY_QUANTITY,
            Self::ProviderContacts => sql::PROVIDER_CONTACTS_BY_CITY,
            Self::TopReceiver => sql::TOP_RECEIVER_BY_CLAIMS,
            Self::TotalAvailable => sql::TOTAL_AVAILABLE_QUANTITY,
            Self::TopListingCity => sql::TOP_LISTING_CITY,
            Self::FoodTypes => sql::FOOD_TYPE_FREQUENCY,
            Self::ClaimsPerFood => sql::CLAIMS_PER_FOOD_ITEM,
            Self::TopProviderCompleted => sql::TOP_PROVIDER_BY_COMPLETED_CLAIMS,
            Self::ClaimStatusShare => sql::CLAIM_STATUS_PERCENTAGES,
            Self::AvgQuantityPerReceiver => sql::AVERAGE_QUANTITY_PER_RECEIVER,
            Self::TopMealType => sql::TOP_CLAIMED_MEAL_TYPE,
            Self::DonatedPerProvider => sql::TOTAL_DONATED_PER_PROVIDER,
            Self::ExpiredUnclaimed => sql::EXPIRED_UNCLAIMED,
        }
    }

    fn binding(self) -> Binding {
        match self {
            Self::ProviderContacts => Binding::City,
            Self::TotalAvailable | Self::ExpiredUnclaimed => Binding::AsOf,
            Self::TopProviderType
            | Self::TopReceiver
            | Self::TopListingCity
            | Self::TopProviderCompleted
            | Self::TopMealType => Binding::Limit,
            _ => Binding::None,
        }
    }

    /// Whether the analysis needs [`ReportParams::city`].
    #[must_use]
    pub fn needs_city(self) -> bool {
        matches!(self.binding(), Binding::City)
    }

    /// Whether the result depends on [`ReportParams::as_of`].
    #[must_use]
    pub fn uses_as_of(self) -> bool {
        matches!(self.binding(), Binding::AsOf)
    }

    /// Whether the result is truncated to [`ReportParams::limit`] rows.
    #[must_use]
    pub fn uses_limit(self) -> bool {
        matches!(self.binding(), Binding::Limit)
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Analysis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|analysis| analysis.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownAnalysis(wanted.to_string()))
    }
}

/// Parameters an analysis may bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportParams {
    /// City for city lookups.
    pub city: Option<String>,
    /// Reference date for date-relative analyses.
    pub as_of: NaiveDate,
    /// Row limit for top-N rankings.
    pub limit: usize,
}

impl ReportParams {
    /// Parameters with no city and a limit of 1.
    #[must_use]
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            city: None,
            as_of,
            limit: 1,
        }
    }

    /// Set the city.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Set the row limit.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A titled table of JSON cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    /// Heading for display.
    pub title: String,
    /// Column names, in order.
    pub columns: Vec<String>,
    /// Rows, each with one cell per column.
    pub rows: Vec<Vec<JsonValue>>,
}

impl ResultSet {
    /// Build a result set from serializable rows, picking `columns` by
    /// field name. Fields missing from a row become null.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be serialized.
    pub fn from_rows<T: Serialize>(
        title: impl Into<String>,
        columns: &[&str],
        rows: &[T],
    ) -> Result<Self> {
        let mut cells = Vec::with_capacity(rows.len());
        for row in rows {
            let value = serde_json::to_value(row)?;
            cells.push(
                columns
                    .iter()
                    .map(|column| value.get(*column).cloned().unwrap_or(JsonValue::Null))
                    .collect(),
            );
        }

        Ok(Self {
            title: title.into(),
            columns: columns.iter().map(ToString::to_string).collect(),
            rows: cells,
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as JSON objects keyed by column name.
    #[must_use]
    pub fn to_objects(&self) -> Vec<serde_json::Map<String, JsonValue>> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }
}

fn json_cell(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            JsonValue::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn bind(analysis: Analysis, params: &ReportParams) -> Result<Vec<Value>> {
    let bound = match analysis.binding() {
        Binding::None => Vec::new(),
        Binding::City => {
            let city = params.city.clone().ok_or(Error::MissingParameter {
                analysis: analysis.name(),
                parameter: "city",
            })?;
            vec![Value::Text(city)]
        }
        Binding::AsOf => vec![Value::Text(params.as_of.format("%Y-%m-%d").to_string())],
        Binding::Limit => vec![Value::Integer(
            i64::try_from(params.limit).unwrap_or(i64::MAX),
        )],
    };
    Ok(bound)
}

/// Run an analysis and collect its rows.
///
/// # Errors
///
/// Returns [`Error::MissingParameter`] if the analysis needs a city and none
/// was given, or an error if the database operation fails.
pub fn run(conn: &Connection, analysis: Analysis, params: &ReportParams) -> Result<ResultSet> {
    let bound = bind(analysis, params)?;
    debug!(analysis = analysis.name(), params = bound.len(), "Running analysis");

    let mut stmt = conn.prepare(analysis.sql())?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = stmt.query(params_from_iter(bound))?;
    let mut cells = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cell_row = Vec::with_capacity(width);
        for index in 0..width {
            cell_row.push(json_cell(row.get_ref(index)?));
        }
        cells.push(cell_row);
    }

    Ok(ResultSet {
        title: analysis.title().to_string(),
        columns,
        rows: cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DeletePolicy;
    use crate::testing::{as_of, seeded_storage};
    use serde_json::json;

    fn run_seeded(analysis: Analysis, params: &ReportParams) -> ResultSet {
        let storage = seeded_storage(DeletePolicy::Cascade);
        run(storage.connection(), analysis, params).unwrap()
    }

    #[test]
    fn test_names_are_unique_and_parse_back() {
        for analysis in Analysis::ALL {
            assert_eq!(analysis.name().parse::<Analysis>().unwrap(), analysis);
            assert_eq!(analysis.to_string(), analysis.name());
        }
        let mut names: Vec<&str> = Analysis::ALL.iter().map(|a| a.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Analysis::ALL.len());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            " Total-Available ".parse::<Analysis>().unwrap(),
            Analysis::TotalAvailable
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = "best-city".parse::<Analysis>().unwrap_err();
        assert!(matches!(err, Error::UnknownAnalysis(name) if name == "best-city"));
    }

    #[test]
    fn test_every_analysis_runs_on_seed() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        let params = ReportParams::new(as_of()).with_city("Springfield");
        for analysis in Analysis::ALL {
            let result = run(storage.connection(), analysis, &params).unwrap();
            assert_eq!(result.title, analysis.title());
            assert!(!result.columns.is_empty(), "{analysis} has no columns");
            assert!(
                result.rows.iter().all(|row| row.len() == result.columns.len()),
                "{analysis} has ragged rows"
            );
        }
    }

    #[test]
    fn test_provider_contacts_requires_city() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        let err = run(
            storage.connection(),
            Analysis::ProviderContacts,
            &ReportParams::new(as_of()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingParameter {
                analysis: "provider-contacts",
                parameter: "city"
            }
        ));
    }

    #[test]
    fn test_total_available_binds_as_of() {
        let result = run_seeded(Analysis::TotalAvailable, &ReportParams::new(as_of()));
        assert_eq!(result.columns, vec!["total_available"]);
        assert_eq!(result.rows, vec![vec![json!(50)]]);
    }

    #[test]
    fn test_limit_truncates_rankings() {
        let one = run_seeded(Analysis::TopProviderType, &ReportParams::new(as_of()));
        assert_eq!(one.rows, vec![vec![json!("Restaurant"), json!(40)]]);

        let three = run_seeded(
            Analysis::TopProviderType,
            &ReportParams::new(as_of()).with_limit(3),
        );
        assert_eq!(three.len(), 3);
    }

    #[test]
    fn test_claim_status_share_cells() {
        let result = run_seeded(Analysis::ClaimStatusShare, &ReportParams::new(as_of()));
        assert_eq!(result.columns, vec!["status", "claim_count", "percentage"]);
        assert_eq!(
            result.rows[0],
            vec![json!("Completed"), json!(3), json!(60.0)]
        );
    }

    #[test]
    fn test_expired_unclaimed_cells() {
        let result = run_seeded(Analysis::ExpiredUnclaimed, &ReportParams::new(as_of()));
        assert_eq!(
            result.rows,
            vec![
                vec![json!(2), json!("Milk"), json!("2025-03-10"), json!(15)],
                vec![json!(5), json!("Salad"), json!("2025-03-14"), json!(5)],
            ]
        );
    }

    #[test]
    fn test_flags_match_bindings() {
        assert!(Analysis::ProviderContacts.needs_city());
        assert!(Analysis::ExpiredUnclaimed.uses_as_of());
        assert!(Analysis::TopMealType.uses_limit());
        assert!(!Analysis::FoodTypes.uses_limit());
        assert!(!Analysis::FoodTypes.uses_as_of());
    }

    #[derive(Serialize)]
    struct Row {
        id: i64,
        name: &'static str,
    }

    #[test]
    fn test_from_rows_picks_columns() {
        let rows = [Row { id: 1, name: "Bread" }, Row { id: 2, name: "Milk" }];
        let result = ResultSet::from_rows("Items", &["name", "id", "missing"], &rows).unwrap();

        assert_eq!(result.columns, vec!["name", "id", "missing"]);
        assert_eq!(result.rows[1], vec![json!("Milk"), json!(2), JsonValue::Null]);

        let objects = result.to_objects();
        assert_eq!(objects[0]["id"], json!(1));
        assert_eq!(objects.len(), 2);
    }
}
