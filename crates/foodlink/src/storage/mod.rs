//! Storage layer for foodlink.
//!
//! This module provides `SQLite`-based persistent storage for providers,
//! receivers, food listings and claims. Row access goes through the
//! per-table [`Repository`] handles; aggregate questions go through
//! [`Analytics`].

pub mod migrations;
pub mod repository;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Claim, FoodListing, Provider, Receiver};
use crate::queries::Analytics;

pub use repository::{Record, Repository};
pub use schema::DeletePolicy;

/// Storage engine for donation data.
///
/// Owns the single connection every statement runs on. Each statement
/// commits on its own; only CSV imports group statements in a transaction.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
    /// Delete policy the schema was created with.
    delete_policy: DeletePolicy,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// A new database gets the schema variant for `policy`; an existing one
    /// keeps the variant it was created with.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>, policy: DeletePolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch(
            "PRAGMA foreign_keys=ON; PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;",
        )?;

        let delete_policy = migrations::initialize_schema(&conn, policy)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn,
            delete_policy,
        })
    }

    /// Create an in-memory storage instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory(policy: DeletePolicy) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let delete_policy = migrations::initialize_schema(&conn, policy)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
            delete_policy,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The delete policy in effect for this database.
    #[must_use]
    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// CRUD access to providers.
    #[must_use]
    pub fn providers(&self) -> Repository<'_, Provider> {
        Repository::new(&self.conn)
    }

    /// CRUD access to receivers.
    #[must_use]
    pub fn receivers(&self) -> Repository<'_, Receiver> {
        Repository::new(&self.conn)
    }

    /// CRUD access to food listings.
    #[must_use]
    pub fn listings(&self) -> Repository<'_, FoodListing> {
        Repository::new(&self.conn)
    }

    /// CRUD access to claims.
    #[must_use]
    pub fn claims(&self) -> Repository<'_, Claim> {
        Repository::new(&self.conn)
    }

    /// Read-only analytical queries.
    #[must_use]
    pub fn analytics(&self) -> Analytics<'_> {
        Analytics::new(&self.conn)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            providers: self.providers().count()?,
            receivers: self.receivers().count()?,
            food_listings: self.listings().count()?,
            claims: self.claims().count()?,
            delete_policy: self.delete_policy,
            db_size_bytes,
        })
    }
}

/// Row counts and database facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Rows in `providers`.
    pub providers: i64,
    /// Rows in `receivers`.
    pub receivers: i64,
    /// Rows in `food_listings`.
    pub food_listings: i64,
    /// Rows in `claims`.
    pub claims: i64,
    /// Delete policy the schema was created with.
    pub delete_policy: DeletePolicy,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
