//! Path-addressed views into a store.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use super::path::{self, PathSegment};
use super::Snapshot;
use crate::reactive::{ReadSignal, WriteSignal};

struct StoreInner {
    read: ReadSignal<Snapshot>,
    write: WriteSignal<Snapshot>,
    /// Child view paths handed out for the current snapshot.
    cache: RefCell<PathCache>,
}

#[derive(Default)]
struct PathCache {
    snapshot: Option<Snapshot>,
    paths: HashMap<Vec<PathSegment>, Rc<[PathSegment]>>,
}

/// A view of the store at one path. Cheap to clone.
///
/// Views never own data: every read resolves against the store's current
/// snapshot, so a view obtained before a write sees the written value.
#[derive(Clone)]
pub struct StoreView {
    inner: Rc<StoreInner>,
    path: Rc<[PathSegment]>,
}

/// Result of reading one key through a view.
#[derive(Debug, Clone)]
pub enum StoreEntry {
    /// The key holds an object or array.
    View(StoreView),
    /// The key holds a primitive, or nothing (null).
    Value(Value),
}

impl StoreEntry {
    /// The plain value: a view is resolved to its current contents.
    pub fn into_value(self) -> Value {
        match self {
            Self::View(view) => view.get(),
            Self::Value(v) => v,
        }
    }
}

impl fmt::Debug for StoreView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreView")
            .field("path", &path::display_path(&self.path))
            .finish()
    }
}

impl StoreView {
    pub(super) fn root(read: ReadSignal<Snapshot>, write: WriteSignal<Snapshot>) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                read,
                write,
                cache: RefCell::new(PathCache::default()),
            }),
            path: Rc::from(Vec::new()),
        }
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Same store, same path, and handed out for the same snapshot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner) && Rc::ptr_eq(&self.path, &other.path)
    }

    /// Whether both views belong to the same store.
    pub fn same_store(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -----------------------------------------------------------------------
    // Reads (tracked)
    // -----------------------------------------------------------------------

    /// The current snapshot. Subscribes the running effect.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.read.get()
    }

    /// The value at this view's path, or null.
    pub fn get(&self) -> Value {
        self.get_in(&[])
    }

    /// The value at `rest` below this view, or null.
    pub fn get_in(&self, rest: &[PathSegment]) -> Value {
        self.inner.read.with(|snap| {
            path::get_in(snap, &self.path)
                .and_then(|here| path::get_in(here, rest))
                .cloned()
                .unwrap_or(Value::Null)
        })
    }

    /// Like [`get_in`](Self::get_in), without subscribing.
    pub fn get_in_untracked(&self, rest: &[PathSegment]) -> Value {
        let snap = self.inner.read.get_untracked();
        path::get_in(&snap, &self.path)
            .and_then(|here| path::get_in(here, rest))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Read one key: a cached child view for containers, the value otherwise.
    pub fn read(&self, key: impl Into<PathSegment>) -> StoreEntry {
        let key = key.into();
        let is_container = self.inner.read.with(|snap| {
            path::get_in(snap, &self.path)
                .and_then(|here| path::step(here, &key))
                .is_some_and(|v| v.is_object() || v.is_array())
        });
        if is_container {
            StoreEntry::View(self.at(key))
        } else {
            StoreEntry::Value(self.get_in(std::slice::from_ref(&key)))
        }
    }

    /// The child view at `key`, whether or not anything is there yet.
    pub fn at(&self, key: impl Into<PathSegment>) -> StoreView {
        let mut child = self.path.to_vec();
        child.push(key.into());
        let current = self.inner.read.get_untracked();
        let mut cache = self.inner.cache.borrow_mut();
        if !cache.snapshot.as_ref().is_some_and(|s| s.ptr_eq(&current)) {
            cache.snapshot = Some(current);
            cache.paths.clear();
        }
        let path = cache
            .paths
            .entry(child.clone())
            .or_insert_with(|| Rc::from(child))
            .clone();
        StoreView {
            inner: self.inner.clone(),
            path,
        }
    }

    /// Keys of the object (or indices of the array) at this path.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read.with(|snap| match path::get_in(snap, &self.path) {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            Some(Value::Array(items)) => (0..items.len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.read.with(|snap| match path::get_in(snap, &self.path) {
            Some(Value::Object(map)) => map.len(),
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of effects subscribed to the store.
    pub fn observer_count(&self) -> usize {
        self.inner.read.observer_count()
    }

    // -----------------------------------------------------------------------
    // Writes (copy-on-write)
    // -----------------------------------------------------------------------

    /// Set `key` below this view, creating missing intermediates.
    /// Returns `false` (and leaves the store untouched) if the write was
    /// rejected; see [`path::set_in`].
    pub fn set(&self, key: impl Into<PathSegment>, value: Value) -> bool {
        self.set_in(&[key.into()], value)
    }

    /// Set `rest` below this view, creating missing intermediates.
    pub fn set_in(&self, rest: &[PathSegment], value: Value) -> bool {
        let mut full = self.path.to_vec();
        full.extend_from_slice(rest);
        let written = self.commit(|draft| path::set_in(draft, &full, value));
        if !written {
            crate::dev_warn!("store write to {} rejected", path::display_path(&full));
        }
        written
    }

    /// Replace the value at this view's own path.
    pub fn replace(&self, value: Value) -> bool {
        self.set_in(&[], value)
    }

    /// Delete `key` below this view. Returns `false` (and leaves the store
    /// untouched) if nothing was there.
    pub fn delete(&self, key: impl Into<PathSegment>) -> bool {
        let mut full = self.path.to_vec();
        full.push(key.into());
        self.commit(|draft| path::delete_in(draft, &full))
    }

    /// Clone the snapshot, apply `edit`, and publish the clone if `edit`
    /// reports a change.
    fn commit(&self, edit: impl FnOnce(&mut Value) -> bool) -> bool {
        let mut draft = Value::clone(&self.inner.read.get_untracked());
        if !edit(&mut draft) {
            return false;
        }
        self.inner.write.set(Snapshot::new(draft));
        true
    }
}
