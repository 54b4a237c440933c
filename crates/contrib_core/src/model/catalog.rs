//! Catalog records referenced by contributions.
//!
//! Projects own repositories; contributors are shared across contributions.
//! The collection process creates these rows before it reports contributions.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ProjectId = i64;
pub type RepositoryId = i64;
pub type ContributorId = i64;

/// Project as reported by the collector. `name` is its natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
}

/// Repository as reported by the collector. `(owner, name)` is its natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRepository {
    pub owner: String,
    pub name: String,
    /// Fixed at creation; later upserts never move a repository.
    pub project_id: ProjectId,
}

/// Contributor as reported by the collector. `username` is its natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContributor {
    pub name: String,
    pub username: String,
    pub avatar_url: String,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<(), CatalogValidationError> {
        require_non_blank("projects.name", &self.name)
    }
}

impl NewRepository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, project_id: ProjectId) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            project_id,
        }
    }

    pub fn validate(&self) -> Result<(), CatalogValidationError> {
        require_non_blank("repositories.owner", &self.owner)?;
        require_non_blank("repositories.name", &self.name)
    }
}

impl NewContributor {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            avatar_url: avatar_url.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CatalogValidationError> {
        require_non_blank("contributors.username", &self.username)
    }
}

/// A required catalog field was blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogValidationError {
    pub field: &'static str,
}

impl Display for CatalogValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "catalog field `{}` cannot be empty", self.field)
    }
}

impl Error for CatalogValidationError {}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), CatalogValidationError> {
    if value.trim().is_empty() {
        return Err(CatalogValidationError { field });
    }
    Ok(())
}
