//! Core record types for foodlink.
//!
//! Providers donate food listings; receivers claim them. Each type maps
//! one-to-one onto a table of the same shape (see [`crate::storage::schema`]).

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Requested but not yet picked up.
    Pending,
    /// Picked up by the receiver.
    Completed,
    /// Withdrawn by either party.
    Cancelled,
}

impl ClaimStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Completed, Self::Cancelled];

    /// The text stored in the `claims.status` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when text does not name a [`ClaimStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown claim status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ClaimStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl ToSql for ClaimStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ClaimStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

/// An organisation that donates food.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Primary key.
    pub provider_id: i64,
    /// Display name.
    pub name: String,
    /// Category such as `Restaurant` or `Supermarket`.
    #[serde(rename = "type")]
    pub provider_type: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// City the provider operates in.
    pub city: Option<String>,
    /// Phone number or other contact detail.
    pub contact: Option<String>,
}

/// An organisation or person that claims food.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    /// Primary key.
    pub receiver_id: i64,
    /// Display name.
    pub name: String,
    /// Category such as `NGO` or `Shelter`.
    #[serde(rename = "type")]
    pub receiver_type: Option<String>,
    /// City the receiver operates in.
    pub city: Option<String>,
    /// Phone number or other contact detail.
    pub contact: Option<String>,
}

/// A quantity of one food item offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodListing {
    /// Primary key.
    pub food_id: i64,
    /// What is being offered.
    pub food_name: String,
    /// Number of units offered.
    pub quantity: u32,
    /// Last day the food may be handed out.
    pub expiry_date: NaiveDate,
    /// The provider offering the food; must exist.
    pub provider_id: i64,
    /// Category of the provider, denormalised from the CSV snapshot.
    pub provider_type: Option<String>,
    /// City where the food can be collected.
    pub location: Option<String>,
    /// `Vegetarian`, `Vegan`, `Non-Vegetarian`, ...
    pub food_type: Option<String>,
    /// `Breakfast`, `Lunch`, `Dinner`, `Snacks`, ...
    pub meal_type: Option<String>,
}

/// A receiver's claim on a food listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Primary key.
    pub claim_id: i64,
    /// The claimed listing; must exist.
    pub food_id: i64,
    /// The claiming receiver; must exist.
    pub receiver_id: i64,
    /// Where the claim is in its lifecycle.
    pub status: ClaimStatus,
    /// When the claim was made.
    pub timestamp: NaiveDateTime,
}

impl FoodListing {
    /// Check whether the listing can still be handed out on `as_of`.
    #[must_use]
    pub fn is_available_on(&self, as_of: NaiveDate) -> bool {
        self.expiry_date >= as_of
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_status_display() {
        assert_eq!(ClaimStatus::Pending.to_string(), "Pending");
        assert_eq!(ClaimStatus::Completed.to_string(), "Completed");
        assert_eq!(ClaimStatus::Cancelled.to_string(), "Cancelled");
    }

    #[test]
    fn test_claim_status_parse_ignores_case_and_whitespace() {
        assert_eq!("completed".parse::<ClaimStatus>(), Ok(ClaimStatus::Completed));
        assert_eq!(" PENDING ".parse::<ClaimStatus>(), Ok(ClaimStatus::Pending));
        assert_eq!("Cancelled".parse::<ClaimStatus>(), Ok(ClaimStatus::Cancelled));
    }

    #[test]
    fn test_claim_status_parse_rejects_unknown() {
        let err = "Lost".parse::<ClaimStatus>().unwrap_err();
        assert_eq!(err, UnknownStatus("Lost".to_string()));
        assert_eq!(err.to_string(), "unknown claim status 'Lost'");
    }

    #[test]
    fn test_claim_status_sql_column() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let status: ClaimStatus = conn
            .query_row("SELECT ?1", [ClaimStatus::Completed], |row| row.get(0))
            .unwrap();
        assert_eq!(status, ClaimStatus::Completed);

        let bad: rusqlite::Result<ClaimStatus> =
            conn.query_row("SELECT 'Lost'", [], |row| row.get(0));
        assert!(bad.is_err());
    }

    #[test]
    fn test_provider_serializes_category_as_type() {
        let provider = Provider {
            provider_id: 1,
            name: "Gonzales Bakery".to_string(),
            provider_type: Some("Bakery".to_string()),
            address: None,
            city: Some("New Jessica".to_string()),
            contact: None,
        };
        let json = serde_json::to_value(&provider).unwrap();
        assert_eq!(json["type"], "Bakery");
        assert!(json.get("provider_type").is_none());
    }

    #[test]
    fn test_listing_availability() {
        let listing = FoodListing {
            food_id: 1,
            food_name: "Bread".to_string(),
            quantity: 10,
            expiry_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(),
            provider_id: 1,
            provider_type: None,
            location: None,
            food_type: None,
            meal_type: None,
        };
        assert!(listing.is_available_on(NaiveDate::from_ymd_opt(2025, 3, 17).unwrap()));
        assert!(!listing.is_available_on(NaiveDate::from_ymd_opt(2025, 3, 18).unwrap()));
    }
}
