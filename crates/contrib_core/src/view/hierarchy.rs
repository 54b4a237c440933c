//! Declarative parent back-references for decoded read-model trees.
//!
//! # Responsibility
//! - Walk a tree top-down along a schema of `(children, parent_as)` levels.
//! - Give every child a value copy of its parent without the parent's
//!   children field.
//! - Drop placeholder children produced by outer-join aggregation.
//!
//! # Invariants
//! - Back-references are copies; the result holds no shared or cyclic data.
//! - A children field is always an array after reversal (`null` becomes `[]`).

use serde_json::Value;

/// One level of the hierarchy: the array field holding children, and the
/// field each child receives pointing back to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyLevel {
    pub children: &'static str,
    pub parent_as: &'static str,
}

/// project -> repositories -> contributions.
pub const PROJECT_HIERARCHY: &[HierarchyLevel] = &[
    HierarchyLevel {
        children: "repositories",
        parent_as: "project",
    },
    HierarchyLevel {
        children: "contributions",
        parent_as: "repository",
    },
];

/// Applies `levels` to one root node.
pub fn reverse_hierarchy(node: Value, levels: &[HierarchyLevel]) -> Value {
    let Some((level, rest)) = levels.split_first() else {
        return node;
    };
    let Value::Object(mut parent) = node else {
        return node;
    };

    let children = parent.remove(level.children);
    let parent_ref = Value::Object(parent.clone());

    let children = match children {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(|child| !is_placeholder(child))
            .map(|child| attach_parent(child, level.parent_as, &parent_ref))
            .map(|child| reverse_hierarchy(child, rest))
            .collect(),
        Some(other) => {
            // Not an array: leave it for the typed stage to reject.
            parent.insert(level.children.to_string(), other);
            return Value::Object(parent);
        }
    };

    parent.insert(level.children.to_string(), Value::Array(children));
    Value::Object(parent)
}

fn attach_parent(child: Value, parent_as: &str, parent_ref: &Value) -> Value {
    match child {
        Value::Object(mut map) => {
            map.insert(parent_as.to_string(), parent_ref.clone());
            Value::Object(map)
        }
        other => other,
    }
}

/// True for `null`, and for objects/arrays holding nothing but placeholders.
///
/// `json_object(...)` over an unmatched outer-join row yields an object whose
/// fields are all `null`; such entries never describe a real child.
pub fn is_placeholder(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.values().all(is_placeholder),
        Value::Array(items) => items.iter().all(is_placeholder),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_placeholder, reverse_hierarchy, HierarchyLevel, PROJECT_HIERARCHY};
    use serde_json::json;

    #[test]
    fn sets_back_references_top_down() {
        let project = json!({
            "id": 1,
            "name": "Alpha",
            "repositories": [{
                "id": 10,
                "owner": "alpha",
                "name": "core",
                "contributions": [{ "id": 100, "title": "Fix bug" }]
            }]
        });

        let reversed = reverse_hierarchy(project, PROJECT_HIERARCHY);

        let repository = &reversed["repositories"][0];
        assert_eq!(repository["project"], json!({ "id": 1, "name": "Alpha" }));

        let contribution = &repository["contributions"][0];
        assert_eq!(
            contribution["repository"],
            json!({
                "id": 10,
                "owner": "alpha",
                "name": "core",
                "project": { "id": 1, "name": "Alpha" }
            })
        );
        assert!(contribution["repository"].get("contributions").is_none());
    }

    #[test]
    fn drops_null_and_all_null_placeholders() {
        let project = json!({
            "id": 1,
            "name": "Alpha",
            "repositories": [{
                "id": 10,
                "owner": "alpha",
                "name": "core",
                "contributions": [null, { "id": null, "contributor": { "id": null } }]
            }]
        });

        let reversed = reverse_hierarchy(project, PROJECT_HIERARCHY);
        assert_eq!(reversed["repositories"][0]["contributions"], json!([]));
    }

    #[test]
    fn null_children_become_empty_arrays() {
        let project = json!({ "id": 1, "name": "Alpha", "repositories": null });
        let reversed = reverse_hierarchy(project, PROJECT_HIERARCHY);
        assert_eq!(reversed["repositories"], json!([]));
    }

    #[test]
    fn levels_are_applied_in_order_only() {
        let levels = [HierarchyLevel {
            children: "items",
            parent_as: "owner",
        }];
        let node = json!({ "id": 1, "items": [{ "id": 2, "items": [{ "id": 3 }] }] });

        let reversed = reverse_hierarchy(node, &levels);

        assert_eq!(reversed["items"][0]["owner"], json!({ "id": 1 }));
        assert!(reversed["items"][0]["items"][0].get("owner").is_none());
    }

    #[test]
    fn real_values_are_not_placeholders() {
        assert!(is_placeholder(&json!(null)));
        assert!(is_placeholder(&json!({ "a": null, "b": [null] })));
        assert!(!is_placeholder(&json!({ "a": null, "b": 0 })));
        assert!(!is_placeholder(&json!("")));
    }
}
