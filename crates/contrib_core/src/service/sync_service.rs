//! Contribution sync use-case service.
//!
//! # Responsibility
//! - Record one collection run: upsert every observed fact, then prune.
//! - Guard the prune precondition (non-empty run id, facts tagged with it).
//! - Serve the read-only project list.
//!
//! # Invariants
//! - Prune runs only after every upsert of the run succeeded.
//! - Run-level checks happen before the first write.
//! - With `atomic_run`, a failed run leaves the store exactly as before.

use crate::model::contribution::{ContributionFact, RunId};
use crate::repo::contribution_repo::{ContributionRepository, SqliteContributionRepository};
use crate::repo::{RepoError, RepoResult};
use crate::view::project_view::ProjectView;
use log::{error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type SyncResult<T> = Result<T, SyncError>;

/// Errors from run-level sync orchestration.
#[derive(Debug)]
pub enum SyncError {
    /// Pruning with an empty run id would wipe every contribution.
    EmptyRunId,
    /// A fact was tagged with a different run than the one being recorded.
    RunIdMismatch {
        url: String,
        expected: RunId,
        actual: RunId,
    },
    Repo(RepoError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRunId => write!(f, "run id cannot be empty"),
            Self::RunIdMismatch {
                url,
                expected,
                actual,
            } => write!(
                f,
                "contribution `{url}` is tagged with run `{actual}`, expected `{expected}`"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyRunId => None,
            Self::RunIdMismatch { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Run-level options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Wrap all upserts and the prune of one run in a single transaction.
    ///
    /// Off by default: each upsert commits on its own.
    pub atomic_run: bool,
}

/// Outcome of one recorded run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub run_id: RunId,
    pub upserted: usize,
    pub pruned: usize,
}

/// Use-case service for recording runs and reading the project list.
pub struct ContributionSyncService<'conn> {
    conn: &'conn Connection,
    options: SyncOptions,
}

impl<'conn> ContributionSyncService<'conn> {
    pub fn new(conn: &'conn Connection, options: SyncOptions) -> Self {
        Self { conn, options }
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Upserts every fact of run `run_id`, then prunes contributions from
    /// earlier runs.
    ///
    /// # Errors
    /// - `EmptyRunId` / `RunIdMismatch` before anything is written.
    /// - `Repo` when an upsert or the prune fails; the prune is skipped if
    ///   any upsert failed.
    pub fn sync_run(&self, run_id: &str, facts: &[ContributionFact]) -> SyncResult<SyncReport> {
        check_run(run_id, facts)?;

        let started_at = Instant::now();
        info!(
            "event=sync_run module=service status=start run_id={} facts={} atomic={}",
            run_id,
            facts.len(),
            self.options.atomic_run
        );

        let outcome = if self.options.atomic_run {
            self.sync_in_transaction(run_id, facts)
        } else {
            apply_run(self.conn, run_id, facts)
        };

        match outcome {
            Ok(report) => {
                info!(
                    "event=sync_run module=service status=ok run_id={} upserted={} pruned={} duration_ms={}",
                    run_id,
                    report.upserted,
                    report.pruned,
                    started_at.elapsed().as_millis()
                );
                Ok(report)
            }
            Err(err) => {
                error!(
                    "event=sync_run module=service status=error run_id={} duration_ms={} error={}",
                    run_id,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Prunes on behalf of a collector that upserted through its own path.
    pub fn prune_stale(&self, run_id: &str) -> SyncResult<usize> {
        if run_id.trim().is_empty() {
            return Err(SyncError::EmptyRunId);
        }
        let repo = SqliteContributionRepository::try_new(self.conn)?;
        Ok(repo.prune_except(run_id)?)
    }

    /// Returns the hierarchical project list, newest activity first.
    pub fn list_projects(&self) -> RepoResult<Vec<ProjectView>> {
        SqliteContributionRepository::try_new(self.conn)?.find_for_list()
    }

    fn sync_in_transaction(
        &self,
        run_id: &str,
        facts: &[ContributionFact],
    ) -> SyncResult<SyncReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        // Dropping `tx` on the error path rolls the whole run back.
        let report = apply_run(&tx, run_id, facts)?;
        tx.commit()?;
        Ok(report)
    }
}

fn check_run(run_id: &str, facts: &[ContributionFact]) -> SyncResult<()> {
    if run_id.trim().is_empty() {
        return Err(SyncError::EmptyRunId);
    }
    if let Some(fact) = facts.iter().find(|fact| fact.run_id != run_id) {
        return Err(SyncError::RunIdMismatch {
            url: fact.url.clone(),
            expected: run_id.to_string(),
            actual: fact.run_id.clone(),
        });
    }
    Ok(())
}

fn apply_run(conn: &Connection, run_id: &str, facts: &[ContributionFact]) -> SyncResult<SyncReport> {
    let repo = SqliteContributionRepository::try_new(conn)?;
    for fact in facts {
        repo.upsert(fact)?;
    }
    let pruned = repo.prune_except(run_id)?;
    Ok(SyncReport {
        run_id: run_id.to_string(),
        upserted: facts.len(),
        pruned,
    })
}
