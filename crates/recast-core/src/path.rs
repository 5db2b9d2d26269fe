//! Dot-separated field paths over nested records.
//!
//! `user.address.city` walks `user` → `address` → `city`. Resolution that
//! hits a missing segment, or a non-object on the way, yields `None`
//! (absent), which is distinct from an explicit `null`.
//!
//! A top-level field whose literal name contains dots (as produced by
//! `flatten`, `group` on a dotted key, or `compute` into `"a.b"`) takes
//! precedence over the nested walk, so later steps can read back what earlier
//! steps wrote.

use serde_json::{Map, Value};

use crate::types::Record;

/// Resolve `path` against `record`. `None` means absent.
pub fn resolve<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    if let Some(v) = record.get(path) {
        return Some(v);
    }
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Resolve `path` against an arbitrary value (records only; anything else is
/// absent).
pub fn resolve_value<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    value.as_object().and_then(|record| resolve(record, path))
}

/// Copy of `record` with the top-level field `field` set to `value`.
///
/// `field` is used literally even when it contains dots; no nesting is
/// created.
pub fn assign(record: &Record, field: &str, value: Value) -> Record {
    let mut out = record.clone();
    out.insert(field.to_string(), value);
    out
}

/// Write `value` at a nested `path` inside `record`, creating intermediate
/// objects as needed. A literal top-level key equal to `path` wins, matching
/// [`resolve`].
pub fn set_path(record: &mut Record, path: &str, value: Value) {
    if !path.contains('.') || record.contains_key(path) {
        record.insert(path.to_string(), value);
        return;
    }
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };
    let mut current = record;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(inner) => inner,
            _ => return,
        };
    }
    current.insert(last.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn resolves_nested_segments() {
        let r = rec(json!({"user": {"address": {"city": "Oslo"}}}));
        assert_eq!(resolve(&r, "user.address.city"), Some(&json!("Oslo")));
        assert_eq!(resolve(&r, "user.address.zip"), None);
        assert_eq!(resolve(&r, "user.address.city.name"), None);
    }

    #[test]
    fn null_intermediate_is_absent_not_null() {
        let r = rec(json!({"user": null, "flag": null}));
        assert_eq!(resolve(&r, "user.name"), None);
        assert_eq!(resolve(&r, "flag"), Some(&Value::Null));
    }

    #[test]
    fn literal_dotted_key_wins() {
        let r = rec(json!({"user.name": "flat", "user": {"name": "nested"}}));
        assert_eq!(resolve(&r, "user.name"), Some(&json!("flat")));
    }

    #[test]
    fn empty_path_is_absent() {
        let r = rec(json!({"": 1}));
        assert_eq!(resolve(&r, ""), None);
    }

    #[test]
    fn assign_is_top_level_and_leaves_input_alone() {
        let r = rec(json!({"a": 1}));
        let out = assign(&r, "b.c", json!(2));
        assert_eq!(Value::Object(out), json!({"a": 1, "b.c": 2}));
        assert_eq!(Value::Object(r), json!({"a": 1}));
    }

    #[test]
    fn set_path_writes_nested() {
        let mut r = rec(json!({"order": {"items": [1, 2], "id": 7}}));
        set_path(&mut r, "order.items", json!(1));
        assert_eq!(Value::Object(r), json!({"order": {"items": 1, "id": 7}}));

        let mut fresh = Record::new();
        set_path(&mut fresh, "a.b", json!(true));
        assert_eq!(Value::Object(fresh), json!({"a": {"b": true}}));
    }
}
