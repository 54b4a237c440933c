//! Contribution repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Upsert contribution facts by natural key (`url`).
//! - Prune every contribution not re-observed by the latest run.
//! - Read the hierarchical project list in one aggregate statement.
//!
//! # Invariants
//! - Upsert is a full replace: every column is overwritten on conflict.
//! - Upsert returns the same id for the same `url` on every call.
//! - After `prune_except(r)` every remaining row has `run_id = r`.
//! - Each operation is one SQL statement. The list read takes no long-lived
//!   lock, so a prune committed mid-read may or may not be reflected in it.

use crate::model::contribution::{ContributionFact, ContributionId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use crate::view::project_view::ProjectView;
use crate::view::{build_project_list, RawProjectRow};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::time::Instant;

const UPSERT_SQL: &str = "INSERT INTO contributions (
    title,
    type,
    url,
    updated_at,
    activity_count,
    repository_id,
    contributor_id,
    run_id
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(url) DO UPDATE SET
    title = excluded.title,
    type = excluded.type,
    url = excluded.url,
    updated_at = excluded.updated_at,
    activity_count = excluded.activity_count,
    repository_id = excluded.repository_id,
    contributor_id = excluded.contributor_id,
    run_id = excluded.run_id
RETURNING id;";

// Inner query: one row per repository with its contributions as a JSON array.
// Outer query: one row per project with its repositories as a JSON array.
// Outer joins keep empty parents; FILTER keeps their arrays empty instead of
// holding one all-null object.
const PROJECT_LIST_SQL: &str = "SELECT
    p.id AS id,
    p.name AS name,
    COALESCE(
        json_group_array(
            json_object(
                'id', r.id,
                'name', r.name,
                'owner', r.owner,
                'contributions', r.contributions
            )
        ) FILTER (WHERE r.id IS NOT NULL),
        '[]'
    ) AS repositories
FROM projects p
LEFT JOIN (
    SELECT
        r.id AS id,
        r.owner AS owner,
        r.name AS name,
        r.project_id AS project_id,
        COALESCE(
            json_group_array(
                json_object(
                    'id', c.id,
                    'title', c.title,
                    'type', c.type,
                    'url', c.url,
                    'updated_at', c.updated_at,
                    'activity_count', c.activity_count,
                    'contributor', json_object(
                        'id', cr.id,
                        'name', cr.name,
                        'username', cr.username,
                        'avatar_url', cr.avatar_url
                    )
                )
            ) FILTER (WHERE c.id IS NOT NULL),
            '[]'
        ) AS contributions
    FROM repositories r
    LEFT JOIN contributions c ON c.repository_id = r.id
    LEFT JOIN contributors cr ON cr.id = c.contributor_id
    GROUP BY r.id
) AS r ON r.project_id = p.id
GROUP BY p.id
ORDER BY p.id ASC;";

/// A persisted contribution with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContribution {
    pub id: ContributionId,
    pub fact: ContributionFact,
}

/// Repository interface for the contribution sync and read paths.
pub trait ContributionRepository {
    /// Inserts `fact`, or overwrites the row with the same `url`.
    ///
    /// Foreign-key violations surface as [`RepoError::Db`].
    fn upsert(&self, fact: &ContributionFact) -> RepoResult<ContributionId>;

    /// Deletes every contribution whose `run_id` differs from `run_id`.
    ///
    /// # Precondition
    /// `run_id` must be the id of the run that has just finished tagging all
    /// observed contributions. An empty or stale id deletes rows that should
    /// have survived; this cannot be detected here.
    fn prune_except(&self, run_id: &str) -> RepoResult<usize>;

    /// Builds the project list, newest activity first. Read-only.
    fn find_for_list(&self) -> RepoResult<Vec<ProjectView>>;

    /// Loads one contribution by natural key.
    fn get_by_url(&self, url: &str) -> RepoResult<Option<StoredContribution>>;
}

/// SQLite-backed contribution repository.
pub struct SqliteContributionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContributionRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ContributionRepository for SqliteContributionRepository<'_> {
    fn upsert(&self, fact: &ContributionFact) -> RepoResult<ContributionId> {
        fact.validate()?;

        let id = self.conn.query_row(
            UPSERT_SQL,
            params![
                fact.title.as_str(),
                fact.kind.as_str(),
                fact.url.as_str(),
                fact.updated_at.as_str(),
                fact.activity_count,
                fact.repository_id,
                fact.contributor_id,
                fact.run_id.as_str(),
            ],
            |row| row.get::<_, ContributionId>(0),
        )?;

        debug!(
            "event=contribution_upsert module=repo status=ok contribution_id={} run_id={}",
            id, fact.run_id
        );
        Ok(id)
    }

    fn prune_except(&self, run_id: &str) -> RepoResult<usize> {
        let started_at = Instant::now();
        match self
            .conn
            .execute("DELETE FROM contributions WHERE run_id <> ?1;", [run_id])
        {
            Ok(deleted) => {
                info!(
                    "event=contribution_prune module=repo status=ok run_id={} deleted={} duration_ms={}",
                    run_id,
                    deleted,
                    started_at.elapsed().as_millis()
                );
                Ok(deleted)
            }
            Err(err) => {
                error!(
                    "event=contribution_prune module=repo status=error run_id={} duration_ms={} error={}",
                    run_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    fn find_for_list(&self) -> RepoResult<Vec<ProjectView>> {
        let started_at = Instant::now();

        let mut stmt = self.conn.prepare(PROJECT_LIST_SQL)?;
        let rows = stmt
            .query_map([], parse_project_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let projects =
            build_project_list(rows).map_err(|err| RepoError::InvalidData(err.to_string()))?;

        debug!(
            "event=contribution_list module=repo status=ok projects={} duration_ms={}",
            projects.len(),
            started_at.elapsed().as_millis()
        );
        Ok(projects)
    }

    fn get_by_url(&self, url: &str) -> RepoResult<Option<StoredContribution>> {
        let stored = self
            .conn
            .query_row(
                "SELECT
                    id,
                    title,
                    type,
                    url,
                    updated_at,
                    activity_count,
                    repository_id,
                    contributor_id,
                    run_id
                 FROM contributions
                 WHERE url = ?1;",
                [url],
                parse_contribution_row,
            )
            .optional()?;
        Ok(stored)
    }
}

fn parse_project_row(row: &Row<'_>) -> rusqlite::Result<RawProjectRow> {
    Ok(RawProjectRow {
        id: row.get("id")?,
        name: row.get("name")?,
        repositories: row.get("repositories")?,
    })
}

fn parse_contribution_row(row: &Row<'_>) -> rusqlite::Result<StoredContribution> {
    Ok(StoredContribution {
        id: row.get("id")?,
        fact: ContributionFact {
            title: row.get("title")?,
            kind: row.get("type")?,
            url: row.get("url")?,
            updated_at: row.get("updated_at")?,
            activity_count: row.get("activity_count")?,
            repository_id: row.get("repository_id")?,
            contributor_id: row.get("contributor_id")?,
            run_id: row.get("run_id")?,
        },
    })
}
