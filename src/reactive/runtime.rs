//! The reactor: explicit owner of effect state, the tracking slot, and the
//! batch queue.
//!
//! There is no hidden global. Every signal and effect carries a handle to the
//! [`Reactor`] it was created by, and the "currently running effect" pointer
//! and "current batch queue" are single slots inside it. Each nesting level
//! (an effect run, `untrack`, `batch`) saves the previous slot value and
//! restores it through a drop guard, so the slots are correct even when a
//! callback unwinds.
//!
//! Single-threaded and synchronous: effects re-run inside the call stack of
//! the write that invalidated them.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;
use slotmap::{new_key_type, SlotMap};

use super::effect::{Cleanup, Dispose, IntoCleanup};
use crate::error::isolate;

new_key_type! {
    /// Identifies an effect inside its [`Reactor`].
    pub struct EffectId;
}

/// The set of effects observing one signal, in subscription order.
pub(crate) type ObserverSet = RefCell<IndexSet<EffectId>>;

type EffectFn = Box<dyn FnMut() -> Option<Cleanup>>;

/// Re-runs allowed for one notification before the effect is considered
/// runaway and left stale.
const MAX_RERUNS: usize = 100;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

struct EffectSlot {
    /// Taken out while the effect runs, so a re-entrant notification for the
    /// same effect finds `None` and marks it pending instead of recursing.
    callback: Option<EffectFn>,
    /// Notified while running; the run loop goes again before returning.
    pending: bool,
    /// Returned by the previous run.
    cleanup: Option<Cleanup>,
    /// Observer sets this effect is currently registered in.
    deps: Vec<Weak<ObserverSet>>,
}

struct ReactorState {
    effects: SlotMap<EffectId, EffectSlot>,
    tracking: Option<EffectId>,
    batch: Option<IndexSet<EffectId>>,
}

/// Handle to a reactive graph. Cheap to clone.
#[derive(Clone)]
pub struct Reactor {
    state: Rc<RefCell<ReactorState>>,
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.borrow();
        f.debug_struct("Reactor")
            .field("effects", &st.effects.len())
            .field("tracking", &st.tracking)
            .field("batching", &st.batch.is_some())
            .finish()
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor {
    /// Create an empty reactive graph.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(ReactorState {
                effects: SlotMap::with_key(),
                tracking: None,
                batch: None,
            })),
        }
    }

    /// Number of live (not disposed) effects.
    pub fn effect_count(&self) -> usize {
        self.state.borrow().effects.len()
    }

    /// Whether a read right now would be recorded as a dependency.
    pub fn is_tracking(&self) -> bool {
        self.state.borrow().tracking.is_some()
    }

    /// Whether a batch is open.
    pub fn is_batching(&self) -> bool {
        self.state.borrow().batch.is_some()
    }

    // -----------------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------------

    /// Create an effect. `f` runs immediately; any signal it reads becomes a
    /// dependency, and a write to one of them re-runs it.
    ///
    /// `f` may return a [`Cleanup`] (or `Option<Cleanup>`), which runs right
    /// before the next run and on dispose.
    pub fn create_effect<R: IntoCleanup>(&self, mut f: impl FnMut() -> R + 'static) -> Dispose {
        let id = self.state.borrow_mut().effects.insert(EffectSlot {
            callback: Some(Box::new(move || f().into_cleanup())),
            cleanup: None,
            deps: Vec::new(),
            pending: false,
        });
        self.run_effect(id);
        Dispose::new(self.clone(), id)
    }

    /// Run an effect, repeating while it was notified during its own run.
    ///
    /// A notification for an effect that is already on the stack only marks
    /// it pending; the outermost run picks that up once the body returns.
    pub(crate) fn run_effect(&self, id: EffectId) {
        {
            let mut st = self.state.borrow_mut();
            match st.effects.get_mut(id) {
                Some(slot) if slot.callback.is_none() => {
                    slot.pending = true;
                    return;
                }
                Some(_) => {}
                None => return,
            }
        }
        for _ in 0..=MAX_RERUNS {
            self.run_once(id);
            if !self.take_pending(id) {
                return;
            }
        }
        crate::dev_warn!("effect kept invalidating itself; gave up after {MAX_RERUNS} re-runs");
    }

    fn take_pending(&self, id: EffectId) -> bool {
        let mut st = self.state.borrow_mut();
        st.effects
            .get_mut(id)
            .is_some_and(|slot| std::mem::take(&mut slot.pending))
    }

    /// One pass: previous cleanup, unsubscribe, tracked body.
    fn run_once(&self, id: EffectId) {
        let cleanup = {
            let mut st = self.state.borrow_mut();
            match st.effects.get_mut(id) {
                Some(slot) if slot.callback.is_some() => slot.cleanup.take(),
                _ => return,
            }
        };
        if let Some(cleanup) = cleanup {
            isolate("effect cleanup", || cleanup.run());
        }

        // The cleanup may have disposed us.
        let (callback, deps) = {
            let mut st = self.state.borrow_mut();
            let Some(slot) = st.effects.get_mut(id) else {
                return;
            };
            let Some(callback) = slot.callback.take() else {
                return;
            };
            (callback, std::mem::take(&mut slot.deps))
        };
        unsubscribe(id, deps);

        let returned = {
            let mut run = RunScope {
                reactor: self,
                id,
                callback: Some(callback),
            };
            let _tracking = TrackingScope::enter(self, Some(id));
            run.invoke()
        };

        if let Some(cleanup) = returned {
            let orphaned = {
                let mut st = self.state.borrow_mut();
                match st.effects.get_mut(id) {
                    Some(slot) => {
                        slot.cleanup = Some(cleanup);
                        None
                    }
                    None => Some(cleanup),
                }
            };
            // Disposed during its own run: the final cleanup is due now.
            if let Some(cleanup) = orphaned {
                isolate("effect cleanup", || cleanup.run());
            }
        }
    }

    /// Dispose an effect: run its cleanup and unsubscribe it everywhere.
    /// Disposing twice is a no-op.
    pub(crate) fn dispose_effect(&self, id: EffectId) {
        let Some(slot) = self.state.borrow_mut().effects.remove(id) else {
            return;
        };
        unsubscribe(id, slot.deps);
        if let Some(cleanup) = slot.cleanup {
            isolate("effect cleanup", || cleanup.run());
        }
    }

    pub(crate) fn is_live(&self, id: EffectId) -> bool {
        self.state.borrow().effects.contains_key(id)
    }

    // -----------------------------------------------------------------------
    // Tracking
    // -----------------------------------------------------------------------

    /// Record the running effect (if any) as an observer of `observers`.
    pub(crate) fn track(&self, observers: &Rc<ObserverSet>) {
        let mut st = self.state.borrow_mut();
        let Some(id) = st.tracking else {
            return;
        };
        let Some(slot) = st.effects.get_mut(id) else {
            return;
        };
        if observers.borrow_mut().insert(id) {
            slot.deps.push(Rc::downgrade(observers));
        }
        debug_assert!(
            slot.deps
                .iter()
                .filter(|dep| dep.as_ptr() == Rc::as_ptr(observers))
                .count()
                == 1,
            "effect recorded the same observer set twice"
        );
    }

    /// Run (or queue, inside a batch) every effect observing `observers`.
    ///
    /// The set is snapshotted first: effects re-subscribe while running, and
    /// an effect created by one of them must not run in this pass.
    pub(crate) fn notify(&self, observers: &Rc<ObserverSet>) {
        let snapshot: Vec<EffectId> = observers.borrow().iter().copied().collect();
        if snapshot.is_empty() {
            return;
        }
        {
            let mut st = self.state.borrow_mut();
            if let Some(queue) = st.batch.as_mut() {
                queue.extend(snapshot);
                return;
            }
        }
        for id in snapshot {
            self.run_effect(id);
        }
    }

    // -----------------------------------------------------------------------
    // batch / untrack
    // -----------------------------------------------------------------------

    /// Run `f`, deferring every effect re-run triggered inside it until the
    /// outermost batch returns. Each queued effect runs once.
    ///
    /// Nested batches merge into the enclosing queue. If `f` unwinds, the
    /// slot is restored and the queue is dropped without flushing.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        let prev = self.state.borrow_mut().batch.replace(IndexSet::new());
        let mut scope = BatchScope {
            reactor: self,
            prev: Some(prev),
        };
        let result = f();
        if let Some(queue) = scope.close() {
            for id in queue {
                self.run_effect(id);
            }
        }
        result
    }

    /// Run `f` with dependency recording suspended.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        let _scope = TrackingScope::enter(self, None);
        f()
    }
}

fn unsubscribe(id: EffectId, deps: Vec<Weak<ObserverSet>>) {
    for dep in deps {
        if let Some(observers) = dep.upgrade() {
            observers.borrow_mut().shift_remove(&id);
        }
    }
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Swaps the tracking slot and restores it on drop.
struct TrackingScope<'a> {
    reactor: &'a Reactor,
    prev: Option<EffectId>,
}

impl<'a> TrackingScope<'a> {
    fn enter(reactor: &'a Reactor, next: Option<EffectId>) -> Self {
        let prev = std::mem::replace(&mut reactor.state.borrow_mut().tracking, next);
        Self { reactor, prev }
    }
}

impl Drop for TrackingScope<'_> {
    fn drop(&mut self) {
        self.reactor.state.borrow_mut().tracking = self.prev;
    }
}

/// Puts an effect's callback back into its slot after the run, unless the
/// effect was disposed meanwhile.
struct RunScope<'a> {
    reactor: &'a Reactor,
    id: EffectId,
    callback: Option<EffectFn>,
}

impl RunScope<'_> {
    fn invoke(&mut self) -> Option<Cleanup> {
        self.callback.as_mut().and_then(|cb| cb())
    }
}

impl Drop for RunScope<'_> {
    fn drop(&mut self) {
        let callback = self.callback.take();
        let mut st = self.reactor.state.borrow_mut();
        if let Some(slot) = st.effects.get_mut(self.id) {
            slot.callback = callback;
        }
    }
}

struct BatchScope<'a> {
    reactor: &'a Reactor,
    prev: Option<Option<IndexSet<EffectId>>>,
}

impl BatchScope<'_> {
    /// Restore the enclosing queue. Returns the collected queue when this was
    /// the outermost batch, otherwise merges it into the parent.
    fn close(&mut self) -> Option<IndexSet<EffectId>> {
        let prev = self.prev.take()?;
        let mut st = self.reactor.state.borrow_mut();
        let queue = std::mem::replace(&mut st.batch, prev).unwrap_or_default();
        match st.batch.as_mut() {
            Some(parent) => {
                parent.extend(queue);
                None
            }
            None => Some(queue),
        }
    }
}

impl Drop for BatchScope<'_> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
