//! Stores: nested reactive state with copy-on-write snapshots.
//!
//! A store is one signal holding an immutable [`Snapshot`] of a
//! `serde_json::Value`. Every write clones the snapshot, mutates the clone,
//! and replaces the signal's value with a new root, so identity comparison
//! on the signal always detects the change and earlier snapshots never
//! change under a reader.
//!
//! Reads go through a path-addressed [`StoreView`]. Any tracked read
//! subscribes to the whole store.
//!
//! ```ignore
//! let (user, set_user) = rx.create_store(json!({"name": "Ada", "tags": []}));
//! user.set("name", json!("Grace"));
//! set_user.update(produce(|draft| draft["tags"] = json!(["admin"])));
//! assert_eq!(user.at("tags").get(), json!(["admin"]));
//! ```

pub mod path;
pub mod view;

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde_json::Value;

use crate::reactive::{Reactor, WriteSignal};

pub use path::PathSegment;
pub use view::{StoreEntry, StoreView};

/// One immutable version of a store's contents. Equality is identity.
#[derive(Clone)]
pub struct Snapshot(Rc<Value>);

impl Snapshot {
    pub fn new(value: Value) -> Self {
        Self(Rc::new(value))
    }

    /// Whether both snapshots are the same version.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Deref for Snapshot {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({})", self.0)
    }
}

/// Whole-store setter.
#[derive(Clone)]
pub struct SetStore {
    write: WriteSignal<Snapshot>,
}

impl fmt::Debug for SetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetStore").finish_non_exhaustive()
    }
}

impl SetStore {
    /// Replace the whole contents.
    pub fn set(&self, next: Value) {
        self.write.set(Snapshot::new(next));
    }

    /// Replace the contents with `f(current)`. Pair with [`produce`] for
    /// in-place style edits.
    pub fn update(&self, f: impl FnOnce(&Value) -> Value) {
        self.write.update(|snap| Snapshot::new(f(snap)));
    }
}

impl Reactor {
    /// Create a store over `initial`.
    pub fn create_store(&self, initial: Value) -> (StoreView, SetStore) {
        let (read, write) = self.create_signal(Snapshot::new(initial));
        (StoreView::root(read, write.clone()), SetStore { write })
    }
}

/// Turn an in-place `mutator` into an updater for [`SetStore::update`]: the
/// previous value is deep-cloned and the clone is mutated and returned.
pub fn produce(mutator: impl FnOnce(&mut Value)) -> impl FnOnce(&Value) -> Value {
    move |prev| {
        let mut draft = prev.clone();
        mutator(&mut draft);
        draft
    }
}
