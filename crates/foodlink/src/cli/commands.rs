//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Subcommand, ValueEnum};

use crate::import::{parse_date, parse_timestamp};
use crate::model::{Claim, ClaimStatus, FoodListing, Provider, Receiver};
use crate::queries::ListingFilter;

fn date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).ok_or_else(|| format!("expected YYYY-MM-DD or M/D/YYYY, got '{value}'"))
}

fn timestamp_arg(value: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(value).ok_or_else(|| format!("expected YYYY-MM-DD HH:MM[:SS], got '{value}'"))
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Directory holding the CSV files (overrides `import.data_dir`)
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Filters command arguments.
#[derive(Debug, Args)]
pub struct FiltersCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Listings command arguments.
#[derive(Debug, Args)]
pub struct ListingsCommand {
    /// Only listings collected in this city
    #[arg(long)]
    pub city: Option<String>,

    /// Only listings from this provider (by name)
    #[arg(long)]
    pub provider: Option<String>,

    /// Only listings of this food type
    #[arg(long)]
    pub food_type: Option<String>,

    /// Only listings of this meal type
    #[arg(long)]
    pub meal_type: Option<String>,

    /// Show the contacts of the matching providers instead of the listings
    #[arg(long)]
    pub contacts: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl ListingsCommand {
    /// The filter described by the arguments.
    #[must_use]
    pub fn filter(&self) -> ListingFilter {
        ListingFilter {
            city: self.city.clone(),
            provider: self.provider.clone(),
            food_type: self.food_type.clone(),
            meal_type: self.meal_type.clone(),
        }
    }
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Analysis to run (see --list)
    #[arg(required_unless_present = "list")]
    pub name: Option<String>,

    /// List the available analyses
    #[arg(long, conflicts_with = "name")]
    pub list: bool,

    /// City for provider-contacts
    #[arg(long)]
    pub city: Option<String>,

    /// Reference date for date-relative analyses (default: today)
    #[arg(long, value_parser = date_arg, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Rows shown by top-N analyses (default: report.top_limit)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Provider fields.
#[derive(Debug, Args)]
pub struct ProviderArgs {
    /// Provider ID
    #[arg(long)]
    pub id: i64,
    /// Name
    #[arg(long)]
    pub name: String,
    /// Category, e.g. Restaurant
    #[arg(long = "type")]
    pub provider_type: Option<String>,
    /// Street address
    #[arg(long)]
    pub address: Option<String>,
    /// City
    #[arg(long)]
    pub city: Option<String>,
    /// Contact detail
    #[arg(long)]
    pub contact: Option<String>,
}

impl From<ProviderArgs> for Provider {
    fn from(args: ProviderArgs) -> Self {
        Self {
            provider_id: args.id,
            name: args.name,
            provider_type: args.provider_type,
            address: args.address,
            city: args.city,
            contact: args.contact,
        }
    }
}

/// Receiver fields.
#[derive(Debug, Args)]
pub struct ReceiverArgs {
    /// Receiver ID
    #[arg(long)]
    pub id: i64,
    /// Name
    #[arg(long)]
    pub name: String,
    /// Category, e.g. NGO
    #[arg(long = "type")]
    pub receiver_type: Option<String>,
    /// City
    #[arg(long)]
    pub city: Option<String>,
    /// Contact detail
    #[arg(long)]
    pub contact: Option<String>,
}

impl From<ReceiverArgs> for Receiver {
    fn from(args: ReceiverArgs) -> Self {
        Self {
            receiver_id: args.id,
            name: args.name,
            receiver_type: args.receiver_type,
            city: args.city,
            contact: args.contact,
        }
    }
}

/// Food listing fields.
#[derive(Debug, Args)]
pub struct ListingArgs {
    /// Food ID
    #[arg(long)]
    pub id: i64,
    /// Food name
    #[arg(long)]
    pub name: String,
    /// Quantity on offer
    #[arg(long)]
    pub quantity: u32,
    /// Expiry date
    #[arg(long, value_parser = date_arg, value_name = "DATE")]
    pub expiry_date: NaiveDate,
    /// Offering provider
    #[arg(long)]
    pub provider_id: i64,
    /// Provider category
    #[arg(long)]
    pub provider_type: Option<String>,
    /// Collection city
    #[arg(long)]
    pub location: Option<String>,
    /// Food type, e.g. Vegetarian
    #[arg(long)]
    pub food_type: Option<String>,
    /// Meal type, e.g. Lunch
    #[arg(long)]
    pub meal_type: Option<String>,
}

impl From<ListingArgs> for FoodListing {
    fn from(args: ListingArgs) -> Self {
        Self {
            food_id: args.id,
            food_name: args.name,
            quantity: args.quantity,
            expiry_date: args.expiry_date,
            provider_id: args.provider_id,
            provider_type: args.provider_type,
            location: args.location,
            food_type: args.food_type,
            meal_type: args.meal_type,
        }
    }
}

/// Claim fields.
#[derive(Debug, Args)]
pub struct ClaimArgs {
    /// Claim ID
    #[arg(long)]
    pub id: i64,
    /// Claimed listing
    #[arg(long)]
    pub food_id: i64,
    /// Claiming receiver
    #[arg(long)]
    pub receiver_id: i64,
    /// Claim status
    #[arg(long, value_enum, default_value = "pending")]
    pub status: ClaimStatusArg,
    /// When the claim was made (default: now)
    #[arg(long, value_parser = timestamp_arg, value_name = "TIMESTAMP")]
    pub timestamp: Option<NaiveDateTime>,
}

impl ClaimArgs {
    /// Build the claim, stamping it with `now` if no timestamp was given.
    #[must_use]
    pub fn into_claim(self, now: NaiveDateTime) -> Claim {
        Claim {
            claim_id: self.id,
            food_id: self.food_id,
            receiver_id: self.receiver_id,
            status: self.status.into(),
            timestamp: self.timestamp.unwrap_or(now),
        }
    }
}

/// Provider commands.
#[derive(Debug, Subcommand)]
pub enum ProviderCommand {
    /// Add a provider
    Add(ProviderArgs),
    /// Add a provider or overwrite the one with the same ID
    Save(ProviderArgs),
    /// Show one provider
    Get {
        /// Provider ID
        id: i64,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List providers
    List {
        /// Only providers in this city
        #[arg(long)]
        city: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Change a provider's city
    SetCity {
        /// Provider ID
        id: i64,
        /// New city
        city: String,
    },
    /// Delete a provider
    Delete {
        /// Provider ID
        id: i64,
    },
}

/// Receiver commands.
#[derive(Debug, Subcommand)]
pub enum ReceiverCommand {
    /// Add a receiver
    Add(ReceiverArgs),
    /// Add a receiver or overwrite the one with the same ID
    Save(ReceiverArgs),
    /// Show one receiver
    Get {
        /// Receiver ID
        id: i64,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List receivers
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Change a receiver's city
    SetCity {
        /// Receiver ID
        id: i64,
        /// New city
        city: String,
    },
    /// Delete a receiver
    Delete {
        /// Receiver ID
        id: i64,
    },
}

/// Food listing commands.
#[derive(Debug, Subcommand)]
pub enum ListingCommand {
    /// Add a food listing
    Add(ListingArgs),
    /// Add a food listing or overwrite the one with the same ID
    Save(ListingArgs),
    /// Show one food listing
    Get {
        /// Food ID
        id: i64,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List food listings
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Change a listing's quantity
    SetQuantity {
        /// Food ID
        id: i64,
        /// New quantity
        quantity: u32,
    },
    /// Delete a food listing
    Delete {
        /// Food ID
        id: i64,
    },
}

/// Claim commands.
#[derive(Debug, Subcommand)]
pub enum ClaimCommand {
    /// Add a claim
    Add(ClaimArgs),
    /// Add a claim or overwrite the one with the same ID
    Save(ClaimArgs),
    /// Show one claim
    Get {
        /// Claim ID
        id: i64,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// List claims
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Change a claim's status
    SetStatus {
        /// Claim ID
        id: i64,
        /// New status
        #[arg(value_enum)]
        status: ClaimStatusArg,
    },
    /// Delete a claim
    Delete {
        /// Claim ID
        id: i64,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Claim status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClaimStatusArg {
    /// Requested, not yet picked up
    Pending,
    /// Picked up
    Completed,
    /// Withdrawn
    Cancelled,
}

impl From<ClaimStatusArg> for ClaimStatus {
    fn from(arg: ClaimStatusArg) -> Self {
        match arg {
            ClaimStatusArg::Pending => Self::Pending,
            ClaimStatusArg::Completed => Self::Completed,
            ClaimStatusArg::Cancelled => Self::Cancelled,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated values with a header line
    #[default]
    Plain,
    /// Aligned columns
    Table,
    /// JSON array of objects
    Json,
}
