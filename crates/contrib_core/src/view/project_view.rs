//! Typed API views for the project list.
//!
//! # Invariants
//! - Field names serialize in camelCase.
//! - Back-references (`project`, `repository`) are value copies of the parent
//!   without its children.
//! - Project order: latest contribution `updatedAt` instant descending, then
//!   `id` ascending; projects without a parseable `updatedAt` come last.

use crate::model::catalog::{ContributorId, ProjectId, RepositoryId};
use crate::model::contribution::{parse_updated_at, ContributionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: ProjectId,
    pub name: String,
    pub repositories: Vec<RepositoryView>,
}

/// Project back-reference carried by each repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: ProjectId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryView {
    pub id: RepositoryId,
    pub name: String,
    pub owner: String,
    pub contributions: Vec<ContributionView>,
    pub project: ProjectRef,
}

/// Repository back-reference carried by each contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    pub id: RepositoryId,
    pub name: String,
    pub owner: String,
    pub project: ProjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionView {
    pub id: ContributionId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub updated_at: String,
    pub activity_count: i64,
    pub contributor: ContributorView,
    pub repository: RepositoryRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorView {
    pub id: ContributorId,
    pub name: String,
    pub username: String,
    pub avatar_url: String,
}

impl ProjectView {
    /// Most recent `updatedAt` instant across all contributions of this
    /// project. Unparseable timestamps are ignored.
    pub fn latest_activity(&self) -> Option<DateTime<Utc>> {
        self.repositories
            .iter()
            .flat_map(|repository| repository.contributions.iter())
            .filter_map(ContributionView::updated_instant)
            .max()
    }

    pub fn contribution_count(&self) -> usize {
        self.repositories
            .iter()
            .map(|repository| repository.contributions.len())
            .sum()
    }

    /// Orders children deterministically: repositories by id, contributions
    /// by `updatedAt` descending then id.
    pub(crate) fn sort_children(&mut self) {
        self.repositories.sort_by_key(|repository| repository.id);
        for repository in &mut self.repositories {
            repository.contributions.sort_by(|a, b| {
                b.updated_instant()
                    .cmp(&a.updated_instant())
                    .then_with(|| a.id.cmp(&b.id))
            });
        }
    }
}

impl ContributionView {
    pub fn updated_instant(&self) -> Option<DateTime<Utc>> {
        parse_updated_at(&self.updated_at)
    }
}

/// Sorts projects by most recent activity, newest first.
///
/// Timestamps are compared as instants, so mixed UTC offsets order correctly.
pub fn sort_by_recent_activity(projects: &mut [ProjectView]) {
    projects.sort_by(compare_recent_activity);
}

fn compare_recent_activity(a: &ProjectView, b: &ProjectView) -> Ordering {
    match (a.latest_activity(), b.latest_activity()) {
        (Some(left), Some(right)) => right.cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::{sort_by_recent_activity, ProjectView};
    use crate::model::contribution::parse_updated_at;
    use serde_json::json;

    fn project(id: i64, updated_at: &[&str]) -> ProjectView {
        let contributions: Vec<_> = updated_at
            .iter()
            .enumerate()
            .map(|(index, at)| {
                let contribution_id = id * 100 + index as i64;
                json!({
                    "id": contribution_id,
                    "title": "t",
                    "type": "ISSUE",
                    "url": format!("https://x/{id}/{index}"),
                    "updatedAt": at,
                    "activityCount": 1,
                    "contributor": { "id": 1, "name": "Ada", "username": "ada", "avatarUrl": "a.png" },
                    "repository": {
                        "id": id,
                        "name": "core",
                        "owner": "o",
                        "project": { "id": id, "name": format!("p{id}") }
                    }
                })
            })
            .collect();
        serde_json::from_value(json!({
            "id": id,
            "name": format!("p{id}"),
            "repositories": [{
                "id": id,
                "name": "core",
                "owner": "o",
                "contributions": contributions,
                "project": { "id": id, "name": format!("p{id}") }
            }]
        }))
        .unwrap()
    }

    #[test]
    fn newest_activity_first_with_id_tie_break() {
        let mut projects = vec![
            project(1, &["2024-01-01"]),
            project(2, &["2024-01-03"]),
            project(3, &["2024-01-03", "2023-12-01"]),
            project(4, &[]),
        ];

        sort_by_recent_activity(&mut projects);

        let ids: Vec<_> = projects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1, 4]);
    }

    #[test]
    fn latest_activity_uses_max_across_repositories() {
        let p = project(1, &["2024-01-01", "2024-03-01", "2024-02-01"]);
        assert_eq!(
            p.latest_activity(),
            parse_updated_at("2024-03-01")
        );
        assert_eq!(p.contribution_count(), 3);
    }

    #[test]
    fn mixed_offsets_compare_as_instants() {
        // 05:00Z vs 06:00Z.
        let mut projects = vec![
            project(1, &["2024-01-01T10:00:00+05:00"]),
            project(2, &["2024-01-01T06:00:00Z"]),
        ];

        sort_by_recent_activity(&mut projects);

        let ids: Vec<_> = projects.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn unparseable_timestamps_sort_like_no_activity() {
        let mut projects = vec![project(1, &["last tuesday"]), project(2, &["2020-01-01"])];

        sort_by_recent_activity(&mut projects);

        assert_eq!(projects[0].id, 2);
        assert_eq!(projects[1].latest_activity(), None);
    }

    #[test]
    fn contributions_within_a_repository_follow_instants() {
        let mut p = project(1, &["2024-01-01T23:00:00-03:00", "2024-01-02T01:00:00Z"]);

        p.sort_children();

        let order: Vec<_> = p.repositories[0]
            .contributions
            .iter()
            .map(|contribution| contribution.id)
            .collect();
        assert_eq!(order, vec![100, 101]);
    }

    #[test]
    fn null_text_field_is_rejected() {
        let mut value = serde_json::to_value(project(1, &["2024-01-01"])).unwrap();
        value["repositories"][0]["contributions"][0]["title"] = json!(null);

        assert!(serde_json::from_value::<ProjectView>(value).is_err());
    }

    #[test]
    fn serializes_camel_case_fields() {
        let value = serde_json::to_value(project(1, &["2024-01-01"])).unwrap();
        let contribution = &value["repositories"][0]["contributions"][0];
        assert_eq!(contribution["updatedAt"], "2024-01-01");
        assert_eq!(contribution["activityCount"], 1);
        assert_eq!(contribution["type"], "ISSUE");
        assert_eq!(contribution["contributor"]["avatarUrl"], "a.png");
    }
}
