// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Dot-path access to nested Helm values trees.

use serde_json::{Map, Value};

/// Set `value` at a dot-delimited `path`, creating intermediate mappings as needed.
///
/// Any non-mapping value found on the way (including the root) is replaced by an
/// empty mapping. The leaf is overwritten unconditionally.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        current = ensure_object(current)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    ensure_object(current).insert(leaf.to_string(), value);
}

/// Remove the value at `path`, returning it if it was present.
pub fn remove_path(root: &mut Value, path: &str) -> Option<Value> {
    let (parent, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (get_path_mut(root, parent)?, leaf),
        None => (root, path),
    };
    parent.as_object_mut()?.remove(leaf)
}

/// Read the value at `path`.
pub fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(root, |current, segment| current.as_object()?.get(segment))
}

fn get_path_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.')
        .try_fold(root, |current, segment| current.as_object_mut()?.get_mut(segment))
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_path_creates_intermediate_mappings() {
        let mut root = json!({});
        set_path(&mut root, "a.b.c", json!(1));

        assert_eq!(root, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_set_path_single_segment() {
        let mut root = json!({});
        set_path(&mut root, "logging", json!(true));

        assert_eq!(root, json!({"logging": true}));
    }

    #[test]
    fn test_set_path_preserves_siblings() {
        let mut root = json!({"global": {"lowDataMode": true}});
        set_path(&mut root, "global.cluster", json!("demo"));

        assert_eq!(
            root,
            json!({"global": {"lowDataMode": true, "cluster": "demo"}})
        );
    }

    #[test]
    fn test_set_path_overwrites_leaf_mapping() {
        let mut root = json!({"ksm": {"enabled": {"nested": 1}}});
        set_path(&mut root, "ksm.enabled", json!(true));

        assert_eq!(root, json!({"ksm": {"enabled": true}}));
    }

    #[test]
    fn test_set_path_replaces_scalar_intermediate() {
        let mut root = json!({"prometheus": true});
        set_path(&mut root, "prometheus.enabled", json!(true));

        assert_eq!(root, json!({"prometheus": {"enabled": true}}));
    }

    #[test]
    fn test_set_path_replaces_non_object_root() {
        let mut root = Value::Null;
        set_path(&mut root, "global.cluster", json!("demo"));

        assert_eq!(root, json!({"global": {"cluster": "demo"}}));
    }

    #[test]
    fn test_set_path_is_idempotent() {
        let mut once = json!({"global": {}});
        set_path(&mut once, "global.licenseKey", json!("abc"));

        let mut twice = once.clone();
        set_path(&mut twice, "global.licenseKey", json!("abc"));

        assert_eq!(once, twice);
    }

    #[test]
    fn test_set_path_keys_with_dashes() {
        let mut root = json!({});
        set_path(&mut root, "metrics-adapter.enabled", json!(true));

        assert_eq!(root["metrics-adapter"]["enabled"], json!(true));
    }

    #[test]
    fn test_remove_path_removes_leaf_only() {
        let mut root = json!({"global": {"licenseKey": "abc", "cluster": "demo"}});

        assert_eq!(remove_path(&mut root, "global.licenseKey"), Some(json!("abc")));
        assert_eq!(root, json!({"global": {"cluster": "demo"}}));
    }

    #[test]
    fn test_remove_path_missing_is_noop() {
        let mut root = json!({"global": "scalar"});

        assert_eq!(remove_path(&mut root, "global.licenseKey"), None);
        assert_eq!(remove_path(&mut root, "other.path"), None);
        assert_eq!(root, json!({"global": "scalar"}));
    }

    #[test]
    fn test_get_path() {
        let root = json!({"pixie-chart": {"enabled": true}});

        assert_eq!(get_path(&root, "pixie-chart.enabled"), Some(&json!(true)));
        assert_eq!(get_path(&root, "pixie-chart.deployKey"), None);
        assert_eq!(get_path(&root, "pixie-chart.enabled.deeper"), None);
    }
}
