//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented contracts over the contribution store.
//! - Isolate SQL details from sync orchestration and API callers.
//!
//! # Invariants
//! - Writes validate their input before SQL mutations.
//! - Repositories only accept connections migrated to the latest schema.
//! - Storage failures are surfaced unmodified; nothing retries internally.

pub mod catalog_repo;
pub mod contribution_repo;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::catalog::CatalogValidationError;
use crate::model::contribution::ContributionValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contribution and catalog persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Contribution fact failed validation; nothing was written.
    Validation(ContributionValidationError),
    /// Catalog record failed validation; nothing was written.
    CatalogValidation(CatalogValidationError),
    /// Underlying SQLite error, including constraint violations.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CatalogValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "contribution repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "contribution repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid contribution data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::CatalogValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ContributionValidationError> for RepoError {
    fn from(value: ContributionValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CatalogValidationError> for RepoError {
    fn from(value: CatalogValidationError) -> Self {
        Self::CatalogValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// True when SQLite rejected the write on a constraint (foreign key,
    /// not-null, unique).
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _))) => {
                err.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}

const REQUIRED_TABLES: [&str; 4] = ["projects", "repositories", "contributors", "contributions"];

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
