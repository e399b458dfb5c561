//! Signals: observable values with automatic dependency tracking.
//!
//! A signal is split into a read half and a write half. Reading inside an
//! effect subscribes the effect; writing a value that differs from the
//! current one re-runs every subscriber.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

use super::runtime::{ObserverSet, Reactor};

struct SignalInner<T> {
    value: RefCell<T>,
    observers: Rc<ObserverSet>,
}

impl Reactor {
    /// Create a reactive signal with the given initial value.
    ///
    /// Returns a `(ReadSignal<T>, WriteSignal<T>)` pair.
    pub fn create_signal<T: 'static>(&self, initial: T) -> (ReadSignal<T>, WriteSignal<T>) {
        let inner = Rc::new(SignalInner {
            value: RefCell::new(initial),
            observers: Rc::new(RefCell::new(IndexSet::new())),
        });
        (
            ReadSignal {
                inner: inner.clone(),
                reactor: self.clone(),
            },
            WriteSignal {
                inner,
                reactor: self.clone(),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// ReadSignal
// ---------------------------------------------------------------------------

/// Read half of a signal.
pub struct ReadSignal<T: 'static> {
    inner: Rc<SignalInner<T>>,
    reactor: Reactor,
}

impl<T: 'static> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            reactor: self.reactor.clone(),
        }
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSignal")
            .field("value", &*self.inner.value.borrow())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl<T: 'static> ReadSignal<T> {
    /// Read the current value, subscribing the running effect (if any).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Read by reference without cloning. Still subscribes the running effect.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.reactor.track(&self.inner.observers);
        let value = self.inner.value.borrow();
        f(&value)
    }

    /// Read the current value without subscribing.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Number of effects currently subscribed.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// Whether both handles point at the same signal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }
}

// ---------------------------------------------------------------------------
// WriteSignal
// ---------------------------------------------------------------------------

/// Write half of a signal.
pub struct WriteSignal<T: 'static> {
    inner: Rc<SignalInner<T>>,
    reactor: Reactor,
}

impl<T: 'static> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            reactor: self.reactor.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for WriteSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSignal")
            .field("observers", &self.inner.observers.borrow().len())
            .finish()
    }
}

impl<T: PartialEq + 'static> WriteSignal<T> {
    /// Replace the value. Subscribers re-run only if the new value differs.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.reactor.notify(&self.inner.observers);
    }

    /// Compute the next value from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.inner.value.borrow());
        self.set(next);
    }
}

impl<T: 'static> WriteSignal<T> {
    /// Mutate in place and notify unconditionally.
    pub fn update_in_place(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.value.borrow_mut());
        self.reactor.notify(&self.inner.observers);
    }

    /// Whether this writes the signal `read` reads.
    pub fn writes(&self, read: &ReadSignal<T>) -> bool {
        Rc::ptr_eq(&self.inner, &read.inner)
    }
}
