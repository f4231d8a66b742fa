//! Database migration system for foodlink.
//!
//! Handles schema versioning and records which [`DeletePolicy`] the donation
//! tables were created with, since `CREATE TABLE IF NOT EXISTS` never
//! rewrites an existing table's foreign keys.

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::schema::{schema_statements, DeletePolicy};

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Key used to store the delete policy in the metadata table.
const DELETE_POLICY_KEY: &str = "delete_policy";

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist, runs pending
/// migrations, and returns the delete policy in effect. For an existing
/// database that is the recorded policy, whatever `policy` says.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails.
pub fn initialize_schema(conn: &Connection, policy: DeletePolicy) -> Result<DeletePolicy> {
    let existing_tables = table_exists(conn, "food_listings")?;

    for statement in schema_statements(policy) {
        conn.execute(&statement, [])?;
    }

    let effective = match get_metadata(conn, DELETE_POLICY_KEY)? {
        Some(value) => {
            let stored: DeletePolicy = value
                .parse()
                .map_err(|message| Error::DatabaseMigration { message })?;
            if stored != policy {
                warn!(
                    "Database was created with delete policy '{}'; ignoring configured '{}'",
                    stored, policy
                );
            }
            stored
        }
        None => {
            if existing_tables {
                warn!(
                    "Existing schema has no recorded delete policy, recording '{}'",
                    policy
                );
            }
            set_metadata(conn, DELETE_POLICY_KEY, policy.as_str())?;
            policy
        }
    };

    let version = get_schema_version(conn)?;
    if version < CURRENT_VERSION {
        run_migrations(conn, version)?;
    }

    debug!("Schema ready (version {}, delete policy {})", CURRENT_VERSION, effective);
    Ok(effective)
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn get_metadata(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (key, value),
    )?;
    Ok(())
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (fresh database).
fn get_schema_version(conn: &Connection) -> Result<i32> {
    match get_metadata(conn, VERSION_KEY)? {
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        None => Ok(0),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    set_metadata(conn, VERSION_KEY, &version.to_string())
}

/// Run migrations from the given version to the current version.
fn run_migrations(conn: &Connection, from_version: i32) -> Result<()> {
    let mut current = from_version;

    while current < CURRENT_VERSION {
        current += 1;
        run_migration(conn, current)?;
        info!("Migrated schema to version {}", current);
    }

    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        }),
    }
}

/// Version 1 is the base schema created by `schema_statements`.
fn migrate_v1(conn: &Connection) -> Result<()> {
    set_schema_version(conn, 1)
}
