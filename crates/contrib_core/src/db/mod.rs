//! Contribution store handle: bootstrap and schema.
//!
//! A store is one SQLite file (or an in-memory database in tests) holding
//! the catalog tables and the `contributions` table. Callers get a
//! `Connection` back only after pragmas are set and every migration in
//! [`migrations`] has been applied; repositories re-check the schema version
//! before touching data.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The store was written by a newer build; refusing to guess its layout.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// SQLite kept another journal mode (e.g. on a filesystem without
    /// shared-memory support), so list reads could block on a sync run.
    JournalModeRejected {
        requested: &'static str,
        actual: String,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "contribution store: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "contribution store is at schema v{db_version}; this build understands up to v{latest_supported}"
            ),
            Self::JournalModeRejected { requested, actual } => write!(
                f,
                "contribution store refused journal_mode={requested} (stayed `{actual}`)"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::JournalModeRejected { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
