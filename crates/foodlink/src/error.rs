//! Error types for foodlink.
//!
//! This module defines all error types used throughout the foodlink crate.
//! Failures raised by the database engine (duplicate keys, dangling
//! references, check constraints) are carried as-is so callers can show
//! them to the user.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for foodlink operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database statement failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Import Errors ===
    /// The CSV reader failed.
    #[error("failed to read CSV {path}: {source}")]
    Csv {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: csv::Error,
    },

    /// A CSV record could not be converted into a row.
    #[error("invalid record in {path} at line {line}: {message}")]
    InvalidRecord {
        /// The file being read.
        path: PathBuf,
        /// Line number of the record (1-based, header is line 1).
        line: u64,
        /// Description of the problem.
        message: String,
    },

    // === Query Errors ===
    /// No analysis is registered under this name.
    #[error("unknown analysis '{0}'")]
    UnknownAnalysis(String),

    /// An analysis was run without a parameter it requires.
    #[error("analysis '{analysis}' requires the '{parameter}' parameter")]
    MissingParameter {
        /// Name of the analysis.
        analysis: &'static str,
        /// Name of the missing parameter.
        parameter: &'static str,
    },

    /// No row exists with the given identifier.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of row that was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: i64,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for foodlink operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a malformed CSV record error.
    #[must_use]
    pub fn invalid_record(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Check if the engine rejected a write because of a constraint
    /// (primary key, foreign key, `CHECK` or `NOT NULL`).
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::DatabaseQuery(err) => {
                err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
            }
            _ => false,
        }
    }

    /// Check if this error is a not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint_error() -> Error {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t VALUES (1);")
            .unwrap();
        conn.execute("INSERT INTO t VALUES (1)", []).unwrap_err().into()
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("provider", 42);
        assert_eq!(err.to_string(), "provider 42 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_invalid_record_display() {
        let err = Error::invalid_record("/data/claims.csv", 7, "unknown claim status 'Lost'");
        let msg = err.to_string();
        assert!(msg.contains("/data/claims.csv"));
        assert!(msg.contains("line 7"));
        assert!(msg.contains("Lost"));
    }

    #[test]
    fn test_duplicate_key_is_constraint_violation() {
        let err = constraint_error();
        assert!(matches!(err, Error::DatabaseQuery(_)));
        assert!(err.is_constraint_violation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_syntax_error_is_not_constraint_violation() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: Error = conn.execute("SELEC 1", []).unwrap_err().into();
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_unknown_analysis_display() {
        let err = Error::UnknownAnalysis("best-city".to_string());
        assert_eq!(err.to_string(), "unknown analysis 'best-city'");
    }

    #[test]
    fn test_missing_parameter_display() {
        let err = Error::MissingParameter {
            analysis: "provider-contacts",
            parameter: "city",
        };
        let msg = err.to_string();
        assert!(msg.contains("provider-contacts"));
        assert!(msg.contains("city"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "top_limit must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("top_limit"));
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/db.sqlite"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/db.sqlite"));
        }
    }
}
