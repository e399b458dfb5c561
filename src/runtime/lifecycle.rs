//! Component lifecycle: disposer lists, the setup slot, and the mount log.
//!
//! A [`DisposerList`] collects the teardown of everything a mount created
//! (effects, listeners, timers, nested lists). Disposing runs them in strict
//! reverse order of registration.
//!
//! The [`LifecycleTracker`] records which roots are mounted and accumulates
//! [`LifecycleEvent`]s that tests and tools can drain.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::dom::NodeId;
use crate::error::isolate;
use crate::reactive::Dispose;

// ---------------------------------------------------------------------------
// DisposerList
// ---------------------------------------------------------------------------

type Disposer = Box<dyn FnOnce()>;

/// An ordered list of teardown callbacks. Cheap to clone; clones share the
/// list.
#[derive(Clone, Default)]
pub struct DisposerList(Rc<RefCell<Vec<Disposer>>>);

impl fmt::Debug for DisposerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisposerList")
            .field("len", &self.len())
            .finish()
    }
}

impl DisposerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, f: impl FnOnce() + 'static) {
        self.0.borrow_mut().push(Box::new(f));
    }

    /// Register an effect's dispose handle.
    pub fn push_effect(&self, dispose: Dispose) {
        self.push(move || dispose.dispose());
    }

    /// A child list, disposed along with this one. The child can be
    /// disposed and refilled any number of times in between.
    pub fn nested(&self) -> DisposerList {
        let child = DisposerList::new();
        let handle = child.clone();
        self.push(move || handle.dispose_all());
        child
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every disposer, last registered first. A panicking disposer is
    /// logged and the rest still run. Disposers registered while disposing
    /// are run too.
    pub fn dispose_all(&self) {
        loop {
            let next = self.0.borrow_mut().pop();
            let Some(disposer) = next else {
                break;
            };
            isolate("disposer", disposer);
        }
    }
}

// ---------------------------------------------------------------------------
// SetupSlot
// ---------------------------------------------------------------------------

/// The disposer list of the component whose factory is running, if any.
#[derive(Default)]
pub(crate) struct SetupSlot(RefCell<Option<DisposerList>>);

impl SetupSlot {
    /// Make `list` current until the guard drops; the previous list is
    /// restored afterwards, so nested setups unwind correctly.
    pub(crate) fn enter(&self, list: DisposerList) -> SetupGuard<'_> {
        let previous = self.0.replace(Some(list));
        SetupGuard {
            slot: self,
            previous,
        }
    }

    pub(crate) fn current(&self) -> Option<DisposerList> {
        self.0.borrow().clone()
    }
}

pub(crate) struct SetupGuard<'a> {
    slot: &'a SetupSlot,
    previous: Option<DisposerList>,
}

impl Drop for SetupGuard<'_> {
    fn drop(&mut self) {
        *self.slot.0.borrow_mut() = self.previous.take();
    }
}

// ---------------------------------------------------------------------------
// LifecycleEvent / LifecycleTracker
// ---------------------------------------------------------------------------

/// A component root changing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Mount { root: NodeId, name: String },
    Unmount { root: NodeId, name: String },
}

/// Mounted roots plus the pending event log.
#[derive(Debug, Default)]
pub struct LifecycleTracker {
    mounted: IndexSet<NodeId>,
    pending: Vec<LifecycleEvent>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mount. No event if `root` was already mounted.
    pub fn on_mount(&mut self, root: NodeId, name: &str) {
        if self.mounted.insert(root) {
            self.pending.push(LifecycleEvent::Mount {
                root,
                name: name.to_owned(),
            });
        }
    }

    /// Record an unmount. No event if `root` was not mounted.
    pub fn on_unmount(&mut self, root: NodeId, name: &str) {
        if self.mounted.shift_remove(&root) {
            self.pending.push(LifecycleEvent::Unmount {
                root,
                name: name.to_owned(),
            });
        }
    }

    pub fn is_mounted(&self, root: NodeId) -> bool {
        self.mounted.contains(&root)
    }

    /// Mounted roots in mount order.
    pub fn mounted_roots(&self) -> Vec<NodeId> {
        self.mounted.iter().copied().collect()
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted.len()
    }

    /// Drain the pending events.
    pub fn take_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }
}
