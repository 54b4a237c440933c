//! Catalog repository: projects, repositories and contributors.
//!
//! # Responsibility
//! - Persist the parent rows contributions reference, keyed by natural keys.
//!
//! # Invariants
//! - Re-reporting a catalog record returns its existing id.
//! - A repository's `project_id` is fixed at creation and never updated.

use crate::model::catalog::{
    ContributorId, NewContributor, NewProject, NewRepository, ProjectId, RepositoryId,
};
use crate::repo::{ensure_connection_ready, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for catalog upserts.
pub trait CatalogRepository {
    fn upsert_project(&self, project: &NewProject) -> RepoResult<ProjectId>;
    fn upsert_repository(&self, repository: &NewRepository) -> RepoResult<RepositoryId>;
    fn upsert_contributor(&self, contributor: &NewContributor) -> RepoResult<ContributorId>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn upsert_project(&self, project: &NewProject) -> RepoResult<ProjectId> {
        project.validate()?;
        let id = self.conn.query_row(
            "INSERT INTO projects (name) VALUES (?1)
             ON CONFLICT(name) DO UPDATE SET name = excluded.name
             RETURNING id;",
            [project.name.as_str()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn upsert_repository(&self, repository: &NewRepository) -> RepoResult<RepositoryId> {
        repository.validate()?;
        // No-op update so RETURNING yields the id; project_id stays untouched.
        let id = self.conn.query_row(
            "INSERT INTO repositories (owner, name, project_id) VALUES (?1, ?2, ?3)
             ON CONFLICT(owner, name) DO UPDATE SET owner = excluded.owner
             RETURNING id;",
            params![
                repository.owner.as_str(),
                repository.name.as_str(),
                repository.project_id,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn upsert_contributor(&self, contributor: &NewContributor) -> RepoResult<ContributorId> {
        contributor.validate()?;
        let id = self.conn.query_row(
            "INSERT INTO contributors (name, username, avatar_url) VALUES (?1, ?2, ?3)
             ON CONFLICT(username) DO UPDATE SET
                name = excluded.name,
                avatar_url = excluded.avatar_url
             RETURNING id;",
            params![
                contributor.name.as_str(),
                contributor.username.as_str(),
                contributor.avatar_url.as_str(),
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}
