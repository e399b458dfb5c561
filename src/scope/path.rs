//! Safe-path resolution against a scope chain.
//!
//! Reads resolve segment by segment from the scope root and yield null as
//! soon as anything along the way is unset. Reads through reactive bindings
//! are tracked by the running effect.
//!
//! Writes resolve all but the last segment the same way. If an intermediate
//! is missing or is not an object, the write is abandoned with a warning;
//! intermediates are never created. A bare name that is not bound anywhere
//! is created in the nearest frame.

use serde_json::Value;

use super::{Binding, Handler, Scope};
use crate::expr::SafePath;
use crate::store::path::{self as store_path, PathSegment};

/// Path resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("invalid path {path:?}: {reason}")]
    Invalid { path: String, reason: String },
    #[error("cannot write {path}: {segment:?} is not an object")]
    Unreachable { path: String, segment: String },
    #[error("cannot write {path}: binding is read-only")]
    ReadOnly { path: String },
}

impl PathError {
    pub(crate) fn invalid(path: &str, err: impl ToString) -> Self {
        Self::Invalid {
            path: path.to_owned(),
            reason: err.to_string(),
        }
    }
}

fn keys(rest: &[String]) -> Vec<PathSegment> {
    rest.iter().map(|s| PathSegment::Key(s.clone())).collect()
}

/// Walk `rest` into `value`. Arrays and strings answer `length`.
fn pick(value: &Value, rest: &[String]) -> Value {
    let mut current = value;
    for (i, segment) in rest.iter().enumerate() {
        let next = store_path::step(current, &PathSegment::Key(segment.clone()));
        match next {
            Some(v) => current = v,
            None if segment == "length" && i + 1 == rest.len() => {
                return match current {
                    Value::Array(items) => Value::from(items.len()),
                    Value::String(s) => Value::from(s.chars().count()),
                    _ => Value::Null,
                };
            }
            None => return Value::Null,
        }
    }
    current.clone()
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// The value at `path`, or null. Tracked.
pub fn get_path(scope: &Scope, path: &SafePath) -> Value {
    read(scope, path.segments())
}

fn read(scope: &Scope, segments: &[String]) -> Value {
    let Some((head, rest)) = segments.split_first() else {
        return Value::Null;
    };
    let Some(binding) = scope.lookup(head) else {
        return Value::Null;
    };
    match binding {
        Binding::Value(v) => pick(&v, rest),
        Binding::Signal(signal, _) => signal.with(|v| pick(v, rest)),
        Binding::Computed(c) => c.with(|v| pick(v, rest)),
        Binding::Store(view) => {
            let snap = view.snapshot();
            store_path::get_in(&snap, view.path())
                .map(|here| pick(here, rest))
                .unwrap_or(Value::Null)
        }
        Binding::Getter(g) => pick(&g.get(), rest),
        Binding::Handler(_) => Value::Null,
        Binding::Scope(inner) => read(&inner, rest),
    }
}

/// The binding at `path`, descending only through nested scopes.
pub fn lookup_binding(scope: &Scope, path: &SafePath) -> Option<Binding> {
    let (head, rest) = path.segments().split_first()?;
    let mut binding = scope.lookup(head)?;
    for segment in rest {
        binding = match binding {
            Binding::Scope(inner) => inner.lookup(segment)?,
            _ => return None,
        };
    }
    Some(binding)
}

/// The handler bound at `path`, if any.
pub fn resolve_handler(scope: &Scope, path: &SafePath) -> Option<Handler> {
    match lookup_binding(scope, path)? {
        Binding::Handler(h) => Some(h),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Assign `value` at `path`. Failures are logged and returned; nothing is
/// written when an error is returned.
pub fn set_path(scope: &Scope, path: &SafePath, value: Value) -> Result<(), PathError> {
    let full = path.to_string();
    write(scope, path.segments(), value, &full).inspect_err(|err| {
        crate::dev_warn!("{err}");
    })
}

fn write(scope: &Scope, segments: &[String], value: Value, full: &str) -> Result<(), PathError> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(PathError::invalid(full, "empty path"));
    };
    let unreachable = |segment: &str| PathError::Unreachable {
        path: full.to_owned(),
        segment: segment.to_owned(),
    };
    let read_only = || PathError::ReadOnly {
        path: full.to_owned(),
    };

    let Some(owner) = scope.owner_of(head) else {
        if rest.is_empty() {
            scope.insert(head.clone(), value);
            return Ok(());
        }
        return Err(unreachable(head));
    };
    let Some(binding) = owner.lookup_local(head) else {
        return Err(unreachable(head));
    };

    match binding {
        Binding::Signal(signal, setter) => {
            if rest.is_empty() {
                setter.set(value);
                return Ok(());
            }
            let mut draft = signal.get_untracked();
            check_reachable(&draft, head, rest).map_err(|s| unreachable(&s))?;
            store_path::set_in(&mut draft, &keys(rest), value);
            setter.set(draft);
            Ok(())
        }
        Binding::Store(view) => {
            if rest.is_empty() {
                view.replace(value);
                return Ok(());
            }
            let here = view.get_in_untracked(&[]);
            check_reachable(&here, head, rest).map_err(|s| unreachable(&s))?;
            view.set_in(&keys(rest), value);
            Ok(())
        }
        Binding::Value(mut draft) => {
            if rest.is_empty() {
                scope.insert(head.clone(), value);
                return Ok(());
            }
            check_reachable(&draft, head, rest).map_err(|s| unreachable(&s))?;
            store_path::set_in(&mut draft, &keys(rest), value);
            owner.insert(head.clone(), draft);
            Ok(())
        }
        Binding::Scope(inner) if !rest.is_empty() => write(&inner, rest, value, full),
        Binding::Scope(_) | Binding::Computed(_) | Binding::Getter(_) | Binding::Handler(_) => {
            Err(read_only())
        }
    }
}

/// Every intermediate of `rest` below `root` must exist and be an object.
/// Returns the first segment that is not.
fn check_reachable(root: &Value, head: &str, rest: &[String]) -> Result<(), String> {
    let Some((_, parents)) = rest.split_last() else {
        return Ok(());
    };
    let mut current = root;
    let mut name = head;
    for segment in parents {
        let Value::Object(map) = current else {
            return Err(name.to_owned());
        };
        match map.get(segment) {
            Some(next) => current = next,
            None => return Err(segment.clone()),
        }
        name = segment;
    }
    if current.is_object() {
        Ok(())
    } else {
        Err(name.to_owned())
    }
}
