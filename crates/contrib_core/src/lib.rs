//! Contribution sync and hierarchical read model.
//!
//! Records contribution facts reported by collection runs, prunes facts a run
//! did not re-observe, and rebuilds the project -> repository -> contribution
//! view from SQLite on demand.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod view;

pub use config::{load_config, load_config_or_default, ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::catalog::{
    ContributorId, NewContributor, NewProject, NewRepository, ProjectId, RepositoryId,
};
pub use model::contribution::{
    new_run_id, parse_updated_at, ContributionFact, ContributionId, ContributionValidationError,
    RunId,
};
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::contribution_repo::{
    ContributionRepository, SqliteContributionRepository, StoredContribution,
};
pub use repo::{RepoError, RepoResult};
pub use service::sync_service::{
    ContributionSyncService, SyncError, SyncOptions, SyncReport, SyncResult,
};
pub use view::project_view::{
    ContributionView, ContributorView, ProjectRef, ProjectView, RepositoryRef, RepositoryView,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
