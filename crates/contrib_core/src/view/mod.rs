//! Hierarchical read model: project -> repository -> contribution.
//!
//! # Responsibility
//! - Turn flat aggregate rows into typed, nested project views.
//! - Own the translation from storage naming (snake_case) to API naming
//!   (camelCase).
//!
//! # Invariants
//! - Each stage has its own type: `RawProjectRow` -> `DecodedProject` ->
//!   `ReversedProject` -> `NormalizedProject` -> `ProjectView`.
//! - One malformed JSON fragment never fails the whole list; a row that does
//!   not fit the typed view does.
//! - The view is recomputed per call and never stored.

pub mod case;
pub mod decode;
pub mod hierarchy;
pub mod project_view;

use crate::model::catalog::ProjectId;
use hierarchy::HierarchyLevel;
use project_view::{sort_by_recent_activity, ProjectView};
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stage 1: one row of the aggregate query. `repositories` is JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProjectRow {
    pub id: ProjectId,
    pub name: String,
    pub repositories: String,
}

/// Stage 2: aggregate columns decoded at every level of the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedProject(Value);

/// Stage 3: children carry back-references to their parents.
#[derive(Debug, Clone, PartialEq)]
pub struct ReversedProject(Value);

/// Stage 4: keys rewritten to API naming.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProject(Value);

impl RawProjectRow {
    pub fn decode(self, levels: &[HierarchyLevel]) -> DecodedProject {
        let row = json!({
            "id": self.id,
            "name": self.name,
            "repositories": self.repositories,
        });
        DecodedProject(decode::unstringify_deep(row, levels))
    }
}

impl DecodedProject {
    pub fn reverse(self, levels: &[HierarchyLevel]) -> ReversedProject {
        ReversedProject(hierarchy::reverse_hierarchy(self.0, levels))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl ReversedProject {
    pub fn normalize(self) -> NormalizedProject {
        NormalizedProject(case::camel_case_keys(self.0))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl NormalizedProject {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Stage 5: binds the tree to the typed API view.
    pub fn into_view(self) -> Result<ProjectView, ViewError> {
        let id = self.0.get("id").and_then(Value::as_i64);
        let mut view: ProjectView =
            serde_json::from_value(self.0).map_err(|source| ViewError { id, source })?;
        view.sort_children();
        Ok(view)
    }
}

/// A decoded row did not match the typed project view.
#[derive(Debug)]
pub struct ViewError {
    pub id: Option<ProjectId>,
    pub source: serde_json::Error,
}

impl Display for ViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "project {id} does not match the list view: {}", self.source),
            None => write!(f, "project row does not match the list view: {}", self.source),
        }
    }
}

impl Error for ViewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Runs every stage over `rows` and returns projects newest-activity first.
pub fn build_project_list(rows: Vec<RawProjectRow>) -> Result<Vec<ProjectView>, ViewError> {
    let mut projects = rows
        .into_iter()
        .map(|row| {
            row.decode(hierarchy::PROJECT_HIERARCHY)
                .reverse(hierarchy::PROJECT_HIERARCHY)
                .normalize()
                .into_view()
        })
        .collect::<Result<Vec<_>, _>>()?;
    sort_by_recent_activity(&mut projects);
    Ok(projects)
}

#[cfg(test)]
mod tests {
    use super::{build_project_list, RawProjectRow};
    use serde_json::json;

    fn alpha_row(repositories: serde_json::Value) -> RawProjectRow {
        RawProjectRow {
            id: 1,
            name: "Alpha".to_string(),
            repositories: repositories.to_string(),
        }
    }

    #[test]
    fn stages_produce_nested_camel_case_view() {
        let contributions = json!([{
            "id": 7,
            "title": "Fix bug",
            "type": "ISSUE",
            "url": "https://x/1",
            "updated_at": "2024-06-01",
            "activity_count": 2,
            "contributor": { "id": 3, "name": "Ada", "username": "ada", "avatar_url": "ada.png" }
        }])
        .to_string();
        let row = alpha_row(json!([{
            "id": 10, "name": "core", "owner": "alpha", "contributions": contributions
        }]));

        let projects = build_project_list(vec![row]).unwrap();

        let value = serde_json::to_value(&projects).unwrap();
        assert_eq!(
            value,
            json!([{
                "id": 1,
                "name": "Alpha",
                "repositories": [{
                    "id": 10,
                    "name": "core",
                    "owner": "alpha",
                    "project": { "id": 1, "name": "Alpha" },
                    "contributions": [{
                        "id": 7,
                        "title": "Fix bug",
                        "type": "ISSUE",
                        "url": "https://x/1",
                        "updatedAt": "2024-06-01",
                        "activityCount": 2,
                        "contributor": { "id": 3, "name": "Ada", "username": "ada", "avatarUrl": "ada.png" },
                        "repository": {
                            "id": 10,
                            "name": "core",
                            "owner": "alpha",
                            "project": { "id": 1, "name": "Alpha" }
                        }
                    }]
                }]
            }])
        );
    }

    #[test]
    fn json_shaped_title_keeps_its_keys_and_order() {
        let title = "{\"user_id\":1,\"b\":2,\"a\":3}";
        let contributions = json!([{
            "id": 7,
            "title": title,
            "type": "ISSUE",
            "url": "https://x/1",
            "updated_at": "2024-06-01",
            "activity_count": 2,
            "contributor": { "id": 3, "name": "Ada", "username": "ada", "avatar_url": "ada.png" }
        }])
        .to_string();
        let row = alpha_row(json!([{
            "id": 10, "name": "core", "owner": "alpha", "contributions": contributions
        }]));

        let projects = build_project_list(vec![row]).unwrap();
        assert_eq!(projects[0].repositories[0].contributions[0].title, title);
    }

    #[test]
    fn placeholder_contribution_renders_as_empty_list() {
        let placeholder = json!([{
            "id": null, "title": null, "type": null, "url": null,
            "updated_at": null, "activity_count": null,
            "contributor": { "id": null, "name": null, "username": null, "avatar_url": null }
        }])
        .to_string();
        let row = alpha_row(json!([{
            "id": 10, "name": "core", "owner": "alpha", "contributions": placeholder
        }]));

        let projects = build_project_list(vec![row]).unwrap();
        assert!(projects[0].repositories[0].contributions.is_empty());
    }

    #[test]
    fn mismatched_row_reports_project_id() {
        let row = alpha_row(json!([{ "id": "not-a-number", "name": "core", "owner": "alpha" }]));
        let err = build_project_list(vec![row]).unwrap_err();
        assert_eq!(err.id, Some(1));
    }

    #[test]
    fn decoded_stage_keeps_storage_naming() {
        let row = alpha_row(json!([{ "id": 10, "name": "core", "owner": "alpha", "contributions": "[]" }]));
        let decoded = row.decode(super::hierarchy::PROJECT_HIERARCHY);
        assert_eq!(decoded.as_value()["repositories"][0]["contributions"], json!([]));

        let reversed = decoded.reverse(super::hierarchy::PROJECT_HIERARCHY);
        assert_eq!(
            reversed.as_value()["repositories"][0]["project"],
            json!({ "id": 1, "name": "Alpha" })
        );
    }
}
