//! `foodlink` - Food donation tracking over `SQLite`
//!
//! This library provides the schema, CSV loader, analytical queries and
//! row-level operations for tracking food offered by providers and claimed
//! by receivers.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod model;
pub mod queries;
pub mod storage;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{Claim, ClaimStatus, FoodListing, Provider, Receiver};
pub use queries::{Analysis, Analytics, ReportParams, ResultSet};
pub use storage::{DeletePolicy, Storage, StorageStats};
