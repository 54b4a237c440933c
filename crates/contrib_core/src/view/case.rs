//! snake_case -> camelCase key rewriting for read-model trees.

use serde_json::Value;

/// Rewrites every object key in `value`, at any depth, to camelCase.
pub fn camel_case_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (snake_to_camel(&key), camel_case_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camel_case_keys).collect()),
        scalar => scalar,
    }
}

/// `avatar_url` -> `avatarUrl`. Leading, trailing and repeated underscores
/// are dropped.
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (index, segment) in key.split('_').filter(|s| !s.is_empty()).enumerate() {
        if index == 0 {
            out.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{camel_case_keys, snake_to_camel};
    use serde_json::json;

    #[test]
    fn converts_column_names() {
        assert_eq!(snake_to_camel("updated_at"), "updatedAt");
        assert_eq!(snake_to_camel("activity_count"), "activityCount");
        assert_eq!(snake_to_camel("avatar_url"), "avatarUrl");
        assert_eq!(snake_to_camel("id"), "id");
    }

    #[test]
    fn drops_stray_underscores() {
        assert_eq!(snake_to_camel("_private"), "private");
        assert_eq!(snake_to_camel("a__b_"), "aB");
    }

    #[test]
    fn rewrites_keys_at_every_depth() {
        let tree = json!({
            "repo_list": [{ "updated_at": "2024-01-01", "nested_obj": { "avatar_url": "x" } }],
            "plain": "snake_value"
        });

        assert_eq!(
            camel_case_keys(tree),
            json!({
                "repoList": [{ "updatedAt": "2024-01-01", "nestedObj": { "avatarUrl": "x" } }],
                "plain": "snake_value"
            })
        );
    }
}
