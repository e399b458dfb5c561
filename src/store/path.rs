//! Path segments and pure path operations on `serde_json::Value`.
//!
//! These functions never touch reactive state; the store clones the snapshot
//! and applies them to the clone.

use std::fmt;

use serde_json::{Map, Value};

/// One step into a nested value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Classify a textual segment: all-digit strings are indices.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(i) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => Self::Index(i),
            _ => Self::Key(raw.to_owned()),
        }
    }

    /// The segment as an object key.
    pub fn as_key(&self) -> String {
        match self {
            Self::Key(k) => k.clone(),
            Self::Index(i) => i.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(k) => f.write_str(k),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for PathSegment {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// Render a path as `a.b.0`.
pub fn display_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(PathSegment::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Look up one step.
pub fn step<'v>(value: &'v Value, segment: &PathSegment) -> Option<&'v Value> {
    match (value, segment) {
        (Value::Object(map), seg) => map.get(&seg.as_key()),
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
        _ => None,
    }
}

/// Look up a full path. `None` if any step is missing.
pub fn get_in<'v>(value: &'v Value, path: &[PathSegment]) -> Option<&'v Value> {
    path.iter().try_fold(value, step)
}

/// How far past the end of an array a write may land. The gap is filled
/// with nulls.
pub const MAX_SPARSE_GAP: usize = 1024;

/// Set `path` to `new`, creating intermediate containers: an array when the
/// following segment is an index, an object otherwise. Non-container
/// intermediates are replaced.
///
/// Returns `false` and leaves `value` untouched when a key would index an
/// array or an index lands more than [`MAX_SPARSE_GAP`] past the end.
pub fn set_in(value: &mut Value, path: &[PathSegment], new: Value) -> bool {
    if !writable(value, path) {
        return false;
    }
    let mut current = value;
    for segment in path {
        current = match slot(current, segment) {
            Some(next) => next,
            None => return false,
        };
    }
    *current = new;
    true
}

fn writable(value: &Value, path: &[PathSegment]) -> bool {
    let mut current = Some(value);
    for segment in path {
        let fits = match (current, segment) {
            (Some(Value::Array(_)), PathSegment::Key(_)) => false,
            (Some(Value::Array(items)), PathSegment::Index(i)) => !too_sparse(items.len(), *i),
            (Some(Value::Object(_)), _) | (_, PathSegment::Key(_)) => true,
            (_, PathSegment::Index(i)) => !too_sparse(0, *i),
        };
        if !fits {
            return false;
        }
        current = current.and_then(|v| step(v, segment));
    }
    true
}

fn too_sparse(len: usize, index: usize) -> bool {
    index > len.saturating_add(MAX_SPARSE_GAP)
}

/// Delete the entry at `path`. Array elements are removed, shifting the
/// rest. Returns `false` if nothing was there.
pub fn delete_in(value: &mut Value, path: &[PathSegment]) -> bool {
    let Some((last, parents)) = path.split_last() else {
        return false;
    };
    let mut current = value;
    for segment in parents {
        current = match step_mut(current, segment) {
            Some(next) => next,
            None => return false,
        };
    }
    match (current, last) {
        (Value::Object(map), seg) => map.shift_remove(&seg.as_key()).is_some(),
        (Value::Array(items), PathSegment::Index(i)) if *i < items.len() => {
            items.remove(*i);
            true
        }
        _ => false,
    }
}

fn step_mut<'v>(value: &'v mut Value, segment: &PathSegment) -> Option<&'v mut Value> {
    match (value, segment) {
        (Value::Object(map), seg) => map.get_mut(&seg.as_key()),
        (Value::Array(items), PathSegment::Index(i)) => items.get_mut(*i),
        _ => None,
    }
}

/// The child slot for `segment`, turning a scalar `value` into a container
/// that can hold it first. Missing children are created as null.
fn slot<'v>(value: &'v mut Value, segment: &PathSegment) -> Option<&'v mut Value> {
    match (&*value, segment) {
        (Value::Object(_), _) | (Value::Array(_), PathSegment::Index(_)) => {}
        (Value::Array(_), PathSegment::Key(_)) => return None,
        (_, PathSegment::Index(_)) => *value = Value::Array(Vec::new()),
        (_, PathSegment::Key(_)) => *value = Value::Object(Map::new()),
    }
    match (value, segment) {
        (Value::Array(items), PathSegment::Index(i)) => {
            let i = *i;
            if items.len() <= i {
                if too_sparse(items.len(), i) {
                    return None;
                }
                items.resize(i + 1, Value::Null);
            }
            items.get_mut(i)
        }
        (Value::Object(map), seg) => Some(map.entry(seg.as_key()).or_insert(Value::Null)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn path(raw: &str) -> Vec<PathSegment> {
        raw.split('.').map(PathSegment::parse).collect()
    }

    #[test]
    fn parse_classifies_indices() {
        assert_eq!(PathSegment::parse("0"), PathSegment::Index(0));
        assert_eq!(PathSegment::parse("12"), PathSegment::Index(12));
        assert_eq!(PathSegment::parse("a1"), PathSegment::Key("a1".into()));
        assert_eq!(PathSegment::parse("+1"), PathSegment::Key("+1".into()));
        assert_eq!(display_path(&path("user.tags.0")), "user.tags.0");
    }

    #[test]
    fn get_in_walks_objects_and_arrays() {
        let v = json!({"user": {"tags": ["a", "b"]}});
        assert_eq!(get_in(&v, &path("user.tags.1")), Some(&json!("b")));
        assert_eq!(get_in(&v, &path("user.name")), None);
        assert_eq!(get_in(&v, &path("user.tags.x")), None);
        assert_eq!(get_in(&v, &[]), Some(&v));
    }

    #[test]
    fn set_in_creates_objects_and_arrays() {
        let mut v = json!({});
        set_in(&mut v, &path("a.b"), json!(1));
        set_in(&mut v, &path("list.2.name"), json!("x"));
        assert_eq!(
            v,
            json!({"a": {"b": 1}, "list": [null, null, {"name": "x"}]})
        );
    }

    #[test]
    fn set_in_replaces_scalars_in_the_way() {
        let mut v = json!({"a": 5});
        set_in(&mut v, &path("a.b"), json!(true));
        assert_eq!(v, json!({"a": {"b": true}}));
    }

    #[test]
    fn set_in_overwrites_leaf() {
        let mut v = json!({"a": {"b": 1, "c": 2}});
        set_in(&mut v, &path("a.b"), json!({"deep": 1}));
        assert_eq!(v, json!({"a": {"b": {"deep": 1}, "c": 2}}));
    }

    #[test]
    fn set_in_rejects_far_indices() {
        let mut v = json!({"xs": [1]});
        assert!(!set_in(&mut v, &[PathSegment::from("xs"), PathSegment::Index(usize::MAX)], json!(1)));
        assert!(!set_in(&mut v, &[PathSegment::from("xs"), PathSegment::Index(1_usize << 40)], json!(1)));
        assert!(!set_in(&mut v, &path("fresh.2000.x"), json!(1)));
        assert_eq!(v, json!({"xs": [1]}));

        assert!(set_in(&mut v, &[PathSegment::from("xs"), PathSegment::Index(3)], json!(4)));
        assert_eq!(v, json!({"xs": [1, null, null, 4]}));
    }

    #[test]
    fn set_in_leaves_arrays_alone_for_keys() {
        let mut v = json!({"xs": [1, 2]});
        assert!(!set_in(&mut v, &path("xs.name"), json!("x")));
        assert_eq!(v, json!({"xs": [1, 2]}));

        assert!(set_in(&mut v, &path("xs.0.deep"), json!("x")));
        assert_eq!(v, json!({"xs": [{"deep": "x"}, 2]}));
    }

    #[test]
    fn object_index_keys_are_not_capped() {
        let mut v = json!({"ids": {}});
        assert!(set_in(&mut v, &path("ids.5000"), json!(true)));
        assert_eq!(v, json!({"ids": {"5000": true}}));
    }

    #[test]
    fn delete_in_objects_and_arrays() {
        let mut v = json!({"a": {"b": 1, "c": 2}, "xs": [1, 2, 3]});
        assert!(delete_in(&mut v, &path("a.b")));
        assert!(delete_in(&mut v, &path("xs.0")));
        assert!(!delete_in(&mut v, &path("missing.key")));
        assert!(!delete_in(&mut v, &path("xs.9")));
        assert_eq!(v, json!({"a": {"c": 2}, "xs": [2, 3]}));
    }
}
