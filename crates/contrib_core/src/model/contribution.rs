//! Contribution fact model.
//!
//! # Responsibility
//! - Define the complete record one collection run reports per contribution.
//! - Validate facts before they reach SQL.
//!
//! # Invariants
//! - `url` is the natural key and must be non-empty.
//! - `run_id` is non-empty; the pruning pass relies on it.
//! - `updated_at` parses as a point in time (see [`parse_updated_at`]).
//! - Facts are full replacements: every field is written on every observation.

use crate::model::catalog::{ContributorId, RepositoryId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store-assigned surrogate key of a contribution row.
pub type ContributionId = i64;

/// Identifier shared by every fact observed during one collection run.
pub type RunId = String;

/// Generates a fresh run identifier (UUID v4 text).
pub fn new_run_id() -> RunId {
    Uuid::new_v4().to_string()
}

/// Parses `updated_at` text into a UTC instant.
///
/// Accepts RFC 3339 with any offset, `YYYY-MM-DDTHH:MM:SS[.f]` read as UTC,
/// and a bare `YYYY-MM-DD` read as UTC midnight.
pub fn parse_updated_at(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

/// One observed contribution, as supplied by the collection process.
///
/// Everything except the store-assigned `id` is present, because upsert
/// overwrites the whole row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionFact {
    pub title: String,
    /// Serialized as `type` to match the column name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Natural key.
    pub url: String,
    /// ISO-8601 text, e.g. `2024-06-01` or `2024-06-01T10:00:00+02:00`.
    pub updated_at: String,
    pub activity_count: i64,
    pub repository_id: RepositoryId,
    pub contributor_id: ContributorId,
    pub run_id: RunId,
}

impl ContributionFact {
    /// Checks field-level rules that SQL constraints do not express.
    ///
    /// Foreign keys are left to the store.
    pub fn validate(&self) -> Result<(), ContributionValidationError> {
        if self.url.trim().is_empty() {
            return Err(ContributionValidationError::EmptyUrl);
        }
        if self.title.trim().is_empty() {
            return Err(ContributionValidationError::EmptyTitle {
                url: self.url.clone(),
            });
        }
        if self.run_id.trim().is_empty() {
            return Err(ContributionValidationError::EmptyRunId {
                url: self.url.clone(),
            });
        }
        if parse_updated_at(&self.updated_at).is_none() {
            return Err(ContributionValidationError::InvalidUpdatedAt {
                url: self.url.clone(),
                value: self.updated_at.clone(),
            });
        }
        if self.activity_count < 0 {
            return Err(ContributionValidationError::NegativeActivityCount {
                url: self.url.clone(),
                value: self.activity_count,
            });
        }
        Ok(())
    }
}

/// Field-level validation failures for [`ContributionFact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionValidationError {
    EmptyUrl,
    EmptyTitle { url: String },
    EmptyRunId { url: String },
    NegativeActivityCount { url: String, value: i64 },
    InvalidUpdatedAt { url: String, value: String },
}

impl Display for ContributionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "contribution url cannot be empty"),
            Self::EmptyTitle { url } => write!(f, "contribution `{url}` has an empty title"),
            Self::EmptyRunId { url } => write!(f, "contribution `{url}` has an empty run id"),
            Self::NegativeActivityCount { url, value } => write!(
                f,
                "contribution `{url}` has negative activity count {value}"
            ),
            Self::InvalidUpdatedAt { url, value } => write!(
                f,
                "contribution `{url}` has unparseable updated_at `{value}`"
            ),
        }
    }
}

impl Error for ContributionValidationError {}
