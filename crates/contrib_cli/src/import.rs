//! Import documents produced by a collection run.
//!
//! A document lists the catalog (projects with their repositories, and
//! contributors) plus every contribution observed. Contributions point at
//! their repository as `owner/name` and at their contributor by username.
//!
//! With `atomic`, catalog upserts, contribution upserts and the prune share
//! one transaction; without it, each statement commits on its own.

use anyhow::{bail, Context, Result};
use contrib_core::{
    CatalogRepository, ContributionFact, ContributionSyncService, ContributorId, NewContributor,
    NewProject, NewRepository, RepositoryId, SqliteCatalogRepository, SyncOptions, SyncReport,
};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportDocument {
    #[serde(default)]
    pub projects: Vec<ImportProject>,
    #[serde(default)]
    pub contributors: Vec<NewContributor>,
    #[serde(default)]
    pub contributions: Vec<ImportContribution>,
}

#[derive(Debug, Deserialize)]
pub struct ImportProject {
    pub name: String,
    #[serde(default)]
    pub repositories: Vec<ImportRepository>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRepository {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportContribution {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub updated_at: String,
    #[serde(default)]
    pub activity_count: i64,
    /// `owner/name`.
    pub repository: String,
    /// Contributor username.
    pub contributor: String,
}

pub fn read_document(path: &Path) -> Result<ImportDocument> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read import file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse import file {}", path.display()))
}

/// Records `document` as run `run_id`: catalog first, then the sync run.
pub fn run_import(
    conn: &mut Connection,
    document: &ImportDocument,
    run_id: &str,
    atomic: bool,
) -> Result<SyncReport> {
    if !atomic {
        let facts = prepare_facts(conn, document, run_id)?;
        return sync(conn, run_id, &facts);
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Dropping `tx` on any error rolls back the catalog rows as well.
    let facts = prepare_facts(&tx, document, run_id)?;
    let report = sync(&tx, run_id, &facts)?;
    tx.commit()?;
    Ok(report)
}

fn sync(conn: &Connection, run_id: &str, facts: &[ContributionFact]) -> Result<SyncReport> {
    // Atomicity, when requested, is owned by the caller's transaction.
    ContributionSyncService::new(conn, SyncOptions::default())
        .sync_run(run_id, facts)
        .with_context(|| format!("run {run_id} failed"))
}

/// Upserts the catalog and returns run-tagged facts ready for syncing.
pub fn prepare_facts(
    conn: &Connection,
    document: &ImportDocument,
    run_id: &str,
) -> Result<Vec<ContributionFact>> {
    let catalog = SqliteCatalogRepository::try_new(conn)?;

    let mut repositories: HashMap<String, RepositoryId> = HashMap::new();
    for project in &document.projects {
        let project_id = catalog
            .upsert_project(&NewProject::new(project.name.as_str()))
            .with_context(|| format!("failed to store project `{}`", project.name))?;
        for repository in &project.repositories {
            let repository_id = catalog
                .upsert_repository(&NewRepository::new(
                    repository.owner.as_str(),
                    repository.name.as_str(),
                    project_id,
                ))
                .with_context(|| {
                    format!(
                        "failed to store repository `{}/{}`",
                        repository.owner, repository.name
                    )
                })?;
            repositories.insert(
                format!("{}/{}", repository.owner, repository.name),
                repository_id,
            );
        }
    }

    let mut contributors: HashMap<&str, ContributorId> = HashMap::new();
    for contributor in &document.contributors {
        let contributor_id = catalog
            .upsert_contributor(contributor)
            .with_context(|| format!("failed to store contributor `{}`", contributor.username))?;
        contributors.insert(contributor.username.as_str(), contributor_id);
    }

    document
        .contributions
        .iter()
        .map(|contribution| {
            let Some(&repository_id) = repositories.get(&contribution.repository) else {
                bail!(
                    "contribution `{}` references unknown repository `{}`",
                    contribution.url,
                    contribution.repository
                );
            };
            let Some(&contributor_id) = contributors.get(contribution.contributor.as_str())
            else {
                bail!(
                    "contribution `{}` references unknown contributor `{}`",
                    contribution.url,
                    contribution.contributor
                );
            };
            Ok(ContributionFact {
                title: contribution.title.clone(),
                kind: contribution.kind.clone(),
                url: contribution.url.clone(),
                updated_at: contribution.updated_at.clone(),
                activity_count: contribution.activity_count,
                repository_id,
                contributor_id,
                run_id: run_id.to_string(),
            })
        })
        .collect()
}
