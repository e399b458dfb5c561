//! Effects, cleanups, and computed values.
//!
//! # Effects
//!
//! An effect is a closure that re-runs whenever any signal it read during its
//! last run changes:
//!
//! ```ignore
//! let rx = Reactor::new();
//! let (count, set_count) = rx.create_signal(0);
//! let dispose = rx.create_effect(move || {
//!     println!("count = {}", count.get());
//! });
//! set_count.set(1); // prints "count = 1"
//! dispose.dispose();
//! ```
//!
//! # Computed
//!
//! A computed value is a read-only signal kept in sync by an internal effect:
//!
//! ```ignore
//! let doubled = rx.create_computed(move || count.get() * 2);
//! assert_eq!(doubled.get(), 2);
//! ```
//!
//! # Batching
//!
//! Use [`Reactor::batch`] to group writes so each affected effect runs once:
//!
//! ```ignore
//! rx.batch(|| {
//!     set_a.set(1);
//!     set_b.set(2);
//! });
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::runtime::{EffectId, Reactor};
use super::signal::{ReadSignal, WriteSignal};

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

/// A teardown callback returned from an effect run.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Box::new(f))
    }

    pub(crate) fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}

/// What an effect body may return.
pub trait IntoCleanup {
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

// ---------------------------------------------------------------------------
// Dispose
// ---------------------------------------------------------------------------

/// Handle that stops an effect. Idempotent.
#[derive(Clone)]
pub struct Dispose {
    reactor: Reactor,
    id: EffectId,
}

impl Dispose {
    pub(crate) fn new(reactor: Reactor, id: EffectId) -> Self {
        Self { reactor, id }
    }

    /// Run the effect's final cleanup and unsubscribe it from every signal.
    /// After this the effect never runs again.
    pub fn dispose(&self) {
        self.reactor.dispose_effect(self.id);
    }

    pub fn is_disposed(&self) -> bool {
        !self.reactor.is_live(self.id)
    }

    pub fn id(&self) -> EffectId {
        self.id
    }
}

impl fmt::Debug for Dispose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispose")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Computed
// ---------------------------------------------------------------------------

/// A read-only signal derived from other reactive state.
pub struct Computed<T: 'static> {
    read: ReadSignal<T>,
    dispose: Dispose,
}

impl<T: 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
            dispose: self.dispose.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("effect", &self.dispose.id())
            .finish()
    }
}

impl<T: 'static> Computed<T> {
    /// Read the current value, subscribing the running effect.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.read.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.read.with(f)
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.read.get_untracked()
    }

    /// The backing signal.
    pub fn signal(&self) -> &ReadSignal<T> {
        &self.read
    }

    /// Stop recomputing. The last value stays readable.
    pub fn dispose(&self) {
        self.dispose.dispose();
    }
}

impl Reactor {
    /// Create a computed value: `f` re-runs whenever a dependency changes and
    /// its result is written into a backing signal, which cascades to any
    /// effect reading the computed value.
    pub fn create_computed<T: PartialEq + 'static>(
        &self,
        mut f: impl FnMut() -> T + 'static,
    ) -> Computed<T> {
        let slot: Rc<RefCell<Option<(ReadSignal<T>, WriteSignal<T>)>>> =
            Rc::new(RefCell::new(None));
        let slot_c = slot.clone();
        let rx = self.clone();
        let dispose = self.create_effect(move || {
            let next = f();
            let write = slot_c.borrow().as_ref().map(|(_, w)| w.clone());
            match write {
                Some(write) => write.set(next),
                None => *slot_c.borrow_mut() = Some(rx.create_signal(next)),
            }
        });
        let read = slot
            .borrow()
            .as_ref()
            .map(|(r, _)| r.clone())
            .expect("computed effect runs synchronously on creation");
        Computed { read, dispose }
    }
}
