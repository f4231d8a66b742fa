//! `SQLite` schema definitions for foodlink.
//!
//! The four donation tables come in two variants that differ only in what
//! happens to dependent rows when a referenced row is deleted; see
//! [`DeletePolicy`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What deleting a referenced row does to the rows that reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Dependent listings and claims are deleted with their parent.
    #[default]
    Cascade,
    /// Deleting a referenced row fails with a foreign-key violation.
    Restrict,
}

impl DeletePolicy {
    /// Text stored in the metadata table.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::Restrict => "restrict",
        }
    }

    /// Trailing clause for a foreign-key column.
    fn on_delete(self) -> &'static str {
        match self {
            Self::Cascade => " ON DELETE CASCADE",
            Self::Restrict => "",
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(Self::Cascade),
            "restrict" => Ok(Self::Restrict),
            other => Err(format!("unknown delete policy: {other}")),
        }
    }
}

/// SQL statement to create the providers table.
pub const CREATE_PROVIDERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS providers (
    provider_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT,
    address TEXT,
    city TEXT,
    contact TEXT
)
";

/// SQL statement to create the receivers table.
pub const CREATE_RECEIVERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS receivers (
    receiver_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT,
    city TEXT,
    contact TEXT
)
";

/// SQL statement to create the food listings table.
#[must_use]
pub fn create_food_listings_table(policy: DeletePolicy) -> String {
    format!(
        r"
CREATE TABLE IF NOT EXISTS food_listings (
    food_id INTEGER PRIMARY KEY,
    food_name TEXT NOT NULL,
    quantity INTEGER NOT NULL CHECK (quantity >= 0),
    expiry_date TEXT NOT NULL,
    provider_id INTEGER NOT NULL REFERENCES providers(provider_id){on_delete},
    provider_type TEXT,
    location TEXT,
    food_type TEXT,
    meal_type TEXT
)
",
        on_delete = policy.on_delete()
    )
}

/// SQL statement to create the claims table.
#[must_use]
pub fn create_claims_table(policy: DeletePolicy) -> String {
    format!(
        r"
CREATE TABLE IF NOT EXISTS claims (
    claim_id INTEGER PRIMARY KEY,
    food_id INTEGER NOT NULL REFERENCES food_listings(food_id){on_delete},
    receiver_id INTEGER NOT NULL REFERENCES receivers(receiver_id){on_delete},
    status TEXT NOT NULL CHECK (status IN ('Pending', 'Completed', 'Cancelled')),
    timestamp TEXT NOT NULL
)
",
        on_delete = policy.on_delete()
    )
}

/// Indexes on foreign keys and the columns the dashboard filters by.
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_providers_city ON providers(city)",
    "CREATE INDEX IF NOT EXISTS idx_food_listings_provider ON food_listings(provider_id)",
    "CREATE INDEX IF NOT EXISTS idx_food_listings_location ON food_listings(location)",
    "CREATE INDEX IF NOT EXISTS idx_food_listings_expiry ON food_listings(expiry_date)",
    "CREATE INDEX IF NOT EXISTS idx_claims_food ON claims(food_id)",
    "CREATE INDEX IF NOT EXISTS idx_claims_receiver ON claims(receiver_id)",
    "CREATE INDEX IF NOT EXISTS idx_claims_status ON claims(status)",
];

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// Donation tables in foreign-key order: a table only references tables
/// listed before it.
pub const TABLES: &[&str] = &["providers", "receivers", "food_listings", "claims"];

/// All schema creation statements in order.
#[must_use]
pub fn schema_statements(policy: DeletePolicy) -> Vec<String> {
    let mut statements = vec![
        CREATE_METADATA_TABLE.to_string(),
        CREATE_PROVIDERS_TABLE.to_string(),
        CREATE_RECEIVERS_TABLE.to_string(),
        create_food_listings_table(policy),
        create_claims_table(policy),
    ];
    statements.extend(CREATE_INDEXES.iter().map(|s| (*s).to_string()));
    statements
}
