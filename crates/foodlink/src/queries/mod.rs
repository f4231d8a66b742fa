//! Analytical queries over the donation tables.
//!
//! [`Analytics`] answers the fixed set of business questions with typed
//! rows; [`catalog`] exposes the same questions by name with generic
//! tabular results for display.
//!
//! Every query is a read-only function of the database contents plus its
//! arguments. Date-relative questions take the reference date explicitly
//! rather than reading the engine's clock.

pub mod catalog;
pub mod sql;

use chrono::NaiveDate;
use rusqlite::{Connection, Params, Row};
use serde::Serialize;

use crate::error::Result;
use crate::model::ClaimStatus;

pub use catalog::{Analysis, ReportParams, ResultSet};

/// Number of rows in a city (or location) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    /// The city; `None` groups rows without one.
    pub city: Option<String>,
    /// Rows in the group.
    pub count: i64,
}

/// Total listed quantity for one provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderTypeTotal {
    /// Provider category.
    pub provider_type: Option<String>,
    /// Sum of listing quantities.
    pub total_quantity: i64,
}

/// A name and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    /// Provider name.
    pub name: String,
    /// Contact detail.
    pub contact: Option<String>,
}

/// Claim count for one receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiverClaims {
    /// Receiver id.
    pub receiver_id: i64,
    /// Receiver name.
    pub name: String,
    /// Claims made by the receiver.
    pub total_claims: i64,
}

/// Number of listings of one food type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoodTypeCount {
    /// Food type.
    pub food_type: Option<String>,
    /// Listings of this type.
    pub count: i64,
}

/// Claim count for one listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoodClaims {
    /// Listing id.
    pub food_id: i64,
    /// Listing name.
    pub food_name: String,
    /// Claims against the listing; 0 for unclaimed listings.
    pub claims_count: i64,
}

/// Completed-claim count for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderClaims {
    /// Provider id.
    pub provider_id: i64,
    /// Provider name.
    pub name: String,
    /// Completed claims on the provider's listings.
    pub successful_claims: i64,
}

/// Share of all claims in one status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusShare {
    /// The status.
    pub status: ClaimStatus,
    /// Claims in this status.
    pub claim_count: i64,
    /// Percentage of all claims, rounded to 2 decimal places.
    pub percentage: f64,
}

/// Average claimed quantity for one receiver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiverAverage {
    /// Receiver id.
    pub receiver_id: i64,
    /// Receiver name.
    pub name: String,
    /// Mean quantity of the claimed listings, rounded to 2 decimal places.
    pub avg_quantity: f64,
}

/// Claim count for one meal type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealTypeClaims {
    /// Meal type.
    pub meal_type: Option<String>,
    /// Claims on listings of this meal type.
    pub claims_count: i64,
}

/// Total listed quantity for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDonation {
    /// Provider id.
    pub provider_id: i64,
    /// Provider name.
    pub name: String,
    /// Sum of the provider's listing quantities.
    pub total_donated: i64,
}

/// A listing past its expiry date that nobody claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiredListing {
    /// Listing id.
    pub food_id: i64,
    /// Listing name.
    pub food_name: String,
    /// Expiry date.
    pub expiry_date: NaiveDate,
    /// Quantity that went unclaimed.
    pub quantity: u32,
}

/// Values available for each listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Provider cities and listing locations.
    pub cities: Vec<String>,
    /// Provider names.
    pub providers: Vec<String>,
    /// Food types.
    pub food_types: Vec<String>,
    /// Meal types.
    pub meal_types: Vec<String>,
}

/// Equality filters for [`Analytics::filtered_listings`]. `None` matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    /// Listing location.
    pub city: Option<String>,
    /// Provider name.
    pub provider: Option<String>,
    /// Food type.
    pub food_type: Option<String>,
    /// Meal type.
    pub meal_type: Option<String>,
}

/// A listing together with the provider offering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingView {
    /// Listing id.
    pub food_id: i64,
    /// Listing name.
    pub food_name: String,
    /// Quantity on offer.
    pub quantity: u32,
    /// Expiry date.
    pub expiry_date: NaiveDate,
    /// Listing location.
    pub city: Option<String>,
    /// Food type.
    pub food_type: Option<String>,
    /// Meal type.
    pub meal_type: Option<String>,
    /// Provider id.
    pub provider_id: i64,
    /// Provider name.
    pub provider_name: String,
    /// Provider contact detail.
    pub provider_contact: Option<String>,
}

impl ListingView {
    /// Column names in display order.
    pub const COLUMNS: &'static [&'static str] = &[
        "food_id",
        "food_name",
        "quantity",
        "expiry_date",
        "city",
        "food_type",
        "meal_type",
        "provider_id",
        "provider_name",
        "provider_contact",
    ];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            food_id: row.get(0)?,
            food_name: row.get(1)?,
            quantity: row.get(2)?,
            expiry_date: row.get(3)?,
            city: row.get(4)?,
            food_type: row.get(5)?,
            meal_type: row.get(6)?,
            provider_id: row.get(7)?,
            provider_name: row.get(8)?,
            provider_contact: row.get(9)?,
        })
    }
}

/// Distinct provider contacts in a set of listings, in first-seen order.
#[must_use]
pub fn provider_contacts_in_view(listings: &[ListingView]) -> Vec<Contact> {
    let mut contacts: Vec<Contact> = Vec::new();
    for listing in listings {
        let contact = Contact {
            name: listing.provider_name.clone(),
            contact: listing.provider_contact.clone(),
        };
        if !contacts.contains(&contact) {
            contacts.push(contact);
        }
    }
    contacts
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Read-only analytical queries on a borrowed connection.
#[derive(Debug)]
pub struct Analytics<'c> {
    conn: &'c Connection,
}

impl<'c> Analytics<'c> {
    /// Create an analytics handle over a borrowed connection.
    #[must_use]
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn rows<T, P, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn strings(&self, sql: &str) -> Result<Vec<String>> {
        self.rows(sql, [], |row| row.get(0))
    }

    /// Providers per city, most first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn providers_per_city(&self) -> Result<Vec<CityCount>> {
        self.rows(sql::PROVIDERS_PER_CITY, [], |row| {
            Ok(CityCount {
                city: row.get(0)?,
                count: row.get(1)?,
            })
        })
    }

    /// Receivers per city, most first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn receivers_per_city(&self) -> Result<Vec<CityCount>> {
        self.rows(sql::RECEIVERS_PER_CITY, [], |row| {
            Ok(CityCount {
                city: row.get(0)?,
                count: row.get(1)?,
            })
        })
    }

    /// The `limit` provider types with the largest total listed quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn top_provider_types(&self, limit: usize) -> Result<Vec<ProviderTypeTotal>> {
        self.rows(
            sql::TOP_PROVIDER_TYPE_BY_QUANTITY,
            [limit_param(limit)],
            |row| {
                Ok(ProviderTypeTotal {
                    provider_type: row.get(0)?,
                    total_quantity: row.get(1)?,
                })
            },
        )
    }

    /// Provider names and contacts in `city`, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn provider_contacts(&self, city: &str) -> Result<Vec<Contact>> {
        self.rows(sql::PROVIDER_CONTACTS_BY_CITY, [city], |row| {
            Ok(Contact {
                name: row.get(0)?,
                contact: row.get(1)?,
            })
        })
    }

    /// The `limit` receivers with the most claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn top_receivers(&self, limit: usize) -> Result<Vec<ReceiverClaims>> {
        self.rows(sql::TOP_RECEIVER_BY_CLAIMS, [limit_param(limit)], |row| {
            Ok(ReceiverClaims {
                receiver_id: row.get(0)?,
                name: row.get(1)?,
                total_claims: row.get(2)?,
            })
        })
    }

    /// Total quantity of listings that have not expired on `as_of`.
    ///
    /// Listings expiring on `as_of` itself still count. Returns 0 when no
    /// listing qualifies.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn total_available(&self, as_of: NaiveDate) -> Result<i64> {
        let total = self
            .conn
            .query_row(sql::TOTAL_AVAILABLE_QUANTITY, [as_of], |row| row.get(0))?;
        Ok(total)
    }

    /// The `limit` listing locations with the most listings.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn top_listing_cities(&self, limit: usize) -> Result<Vec<CityCount>> {
        self.rows(sql::TOP_LISTING_CITY, [limit_param(limit)], |row| {
            Ok(CityCount {
                city: row.get(0)?,
                count: row.get(1)?,
            })
        })
    }

    /// Listings per food type, most common first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn food_type_frequency(&self) -> Result<Vec<FoodTypeCount>> {
        self.rows(sql::FOOD_TYPE_FREQUENCY, [], |row| {
            Ok(FoodTypeCount {
                food_type: row.get(0)?,
                count: row.get(1)?,
            })
        })
    }

    /// Claims per listing, including listings nobody claimed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn claims_per_food_item(&self) -> Result<Vec<FoodClaims>> {
        self.rows(sql::CLAIMS_PER_FOOD_ITEM, [], |row| {
            Ok(FoodClaims {
                food_id: row.get(0)?,
                food_name: row.get(1)?,
                claims_count: row.get(2)?,
            })
        })
    }

    /// The `limit` providers whose listings have the most completed claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn top_providers_by_completed_claims(&self, limit: usize) -> Result<Vec<ProviderClaims>> {
        self.rows(
            sql::TOP_PROVIDER_BY_COMPLETED_CLAIMS,
            [limit_param(limit)],
            |row| {
                Ok(ProviderClaims {
                    provider_id: row.get(0)?,
                    name: row.get(1)?,
                    successful_claims: row.get(2)?,
                })
            },
        )
    }

    /// Percentage of claims in each status present. Empty without claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn claim_status_shares(&self) -> Result<Vec<StatusShare>> {
        self.rows(sql::CLAIM_STATUS_PERCENTAGES, [], |row| {
            Ok(StatusShare {
                status: row.get(0)?,
                claim_count: row.get(1)?,
                percentage: row.get(2)?,
            })
        })
    }

    /// Average claimed listing quantity per receiver, highest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn average_quantity_per_receiver(&self) -> Result<Vec<ReceiverAverage>> {
        self.rows(sql::AVERAGE_QUANTITY_PER_RECEIVER, [], |row| {
            Ok(ReceiverAverage {
                receiver_id: row.get(0)?,
                name: row.get(1)?,
                avg_quantity: row.get(2)?,
            })
        })
    }

    /// The `limit` meal types with the most claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn top_claimed_meal_types(&self, limit: usize) -> Result<Vec<MealTypeClaims>> {
        self.rows(sql::TOP_CLAIMED_MEAL_TYPE, [limit_param(limit)], |row| {
            Ok(MealTypeClaims {
                meal_type: row.get(0)?,
                claims_count: row.get(1)?,
            })
        })
    }

    /// Total listed quantity per provider with at least one listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn total_donated_per_provider(&self) -> Result<Vec<ProviderDonation>> {
        self.rows(sql::TOTAL_DONATED_PER_PROVIDER, [], |row| {
            Ok(ProviderDonation {
                provider_id: row.get(0)?,
                name: row.get(1)?,
                total_donated: row.get(2)?,
            })
        })
    }

    /// Listings with `expiry_date < as_of` that no claim references.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn expired_unclaimed(&self, as_of: NaiveDate) -> Result<Vec<ExpiredListing>> {
        self.rows(sql::EXPIRED_UNCLAIMED, [as_of], |row| {
            Ok(ExpiredListing {
                food_id: row.get(0)?,
                food_name: row.get(1)?,
                expiry_date: row.get(2)?,
                quantity: row.get(3)?,
            })
        })
    }

    /// Distinct values for every listing filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn filter_options(&self) -> Result<FilterOptions> {
        Ok(FilterOptions {
            cities: self.strings(sql::DISTINCT_CITIES)?,
            providers: self.strings(sql::DISTINCT_PROVIDER_NAMES)?,
            food_types: self.strings(sql::DISTINCT_FOOD_TYPES)?,
            meal_types: self.strings(sql::DISTINCT_MEAL_TYPES)?,
        })
    }

    /// Listings with their provider, narrowed by `filter`, soonest expiry
    /// first and larger quantities first within a day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn filtered_listings(&self, filter: &ListingFilter) -> Result<Vec<ListingView>> {
        self.rows(
            sql::FILTERED_LISTINGS,
            (
                filter.city.as_deref(),
                filter.provider.as_deref(),
                filter.food_type.as_deref(),
                filter.meal_type.as_deref(),
            ),
            ListingView::from_row,
        )
    }
}
