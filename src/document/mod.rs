//! The document: a shared handle around the [`Dom`] plus its event loop.
//!
//! [`Document`] is what the runtime and directives hold. It owns:
//!
//! - the node arena ([`Document::dom`] / [`Document::dom_mut`]);
//! - event dispatch along the bubble path ([`Document::dispatch`]);
//! - a microtask queue and virtual-clock timers ([`Document::tick`],
//!   [`Document::advance`]);
//! - mutation observer callbacks, delivered at microtask checkpoints;
//! - the ready state (`Loading` until [`Document::finish_loading`]).
//!
//! User callbacks (listeners, tasks, timers, observers) always run with no
//! borrow of the document held, and a panic in one is isolated and logged.

pub mod event_loop;

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::SecondaryMap;

use crate::dom::{Dom, Event, MutationRecord, NodeId, ObservationId, ParseError};
use crate::error::isolate;
use event_loop::{EventLoop, Task, TimerFn};

pub use event_loop::TimerId;

/// Mutation observer callback.
pub type ObserverFn = Rc<dyn Fn(Vec<MutationRecord>)>;

/// Loading state of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Complete,
}

struct DocumentInner {
    dom: RefCell<Dom>,
    body: NodeId,
    event_loop: RefCell<EventLoop>,
    ready: Cell<ReadyState>,
    ready_callbacks: RefCell<Vec<Task>>,
    observers: RefCell<SecondaryMap<ObservationId, ObserverFn>>,
}

/// Shared handle to a document. Cheap to clone.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

/// Non-owning handle, for callbacks stored inside the document itself.
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    pub fn upgrade(&self) -> Option<Document> {
        self.inner.upgrade().map(|inner| Document { inner })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("dom", &*self.inner.dom.borrow())
            .field("ready", &self.inner.ready.get())
            .field("now", &self.now())
            .finish()
    }
}

impl Document {
    /// An empty, fully loaded document with a `<body>`.
    pub fn new() -> Self {
        Self::with_state(ReadyState::Complete)
    }

    /// A document that stays `Loading` until [`finish_loading`](Self::finish_loading).
    pub fn loading() -> Self {
        Self::with_state(ReadyState::Loading)
    }

    fn with_state(ready: ReadyState) -> Self {
        let mut dom = Dom::new();
        let body = dom.create_element("body");
        dom.append_child(dom.document(), body);
        Self {
            inner: Rc::new(DocumentInner {
                dom: RefCell::new(dom),
                body,
                event_loop: RefCell::new(EventLoop::default()),
                ready: Cell::new(ready),
                ready_callbacks: RefCell::new(Vec::new()),
                observers: RefCell::new(SecondaryMap::new()),
            }),
        }
    }

    /// A loaded document whose body holds the parsed `html`.
    pub fn from_html(html: &str) -> Result<Self, ParseError> {
        let doc = Self::new();
        doc.dom_mut().append_html(doc.body(), html)?;
        Ok(doc)
    }

    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn body(&self) -> NodeId {
        self.inner.body
    }

    /// Borrow the node arena. Do not hold across calls that run user code.
    pub fn dom(&self) -> Ref<'_, Dom> {
        self.inner.dom.borrow()
    }

    pub fn dom_mut(&self) -> RefMut<'_, Dom> {
        self.inner.dom.borrow_mut()
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Dispatch `event` at `target`: listeners on the target, then on each
    /// ancestor if the event bubbles, until propagation is stopped.
    ///
    /// Returns `false` if a listener called `prevent_default`.
    pub fn dispatch(&self, target: NodeId, event: Event) -> bool {
        let path = {
            let dom = self.dom();
            if event.bubbles() {
                dom.bubble_path(target)
            } else if dom.exists(target) {
                vec![target]
            } else {
                Vec::new()
            }
        };
        event.set_target(target);
        for node in path {
            let callbacks = self.dom().listeners_for(node, event.name());
            if callbacks.is_empty() {
                continue;
            }
            event.set_current_target(Some(node));
            for callback in callbacks {
                isolate("event listener", || callback(&event));
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        event.set_current_target(None);
        !event.is_default_prevented()
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.inner.event_loop.borrow().now()
    }

    pub fn queue_microtask(&self, task: impl FnOnce() + 'static) {
        self.inner
            .event_loop
            .borrow_mut()
            .queue_microtask(Box::new(task));
    }

    /// Run `f` once, `delay_ms` from now.
    pub fn set_timeout(&self, f: impl FnOnce() + 'static, delay_ms: u64) -> TimerId {
        let mut f = Some(f);
        let callback: TimerFn = Rc::new(RefCell::new(move || {
            if let Some(f) = f.take() {
                f();
            }
        }));
        self.inner
            .event_loop
            .borrow_mut()
            .add_timer(delay_ms, false, callback)
    }

    /// Run `f` every `every_ms` until cleared.
    pub fn set_interval(&self, f: impl FnMut() + 'static, every_ms: u64) -> TimerId {
        let callback: TimerFn = Rc::new(RefCell::new(f));
        self.inner
            .event_loop
            .borrow_mut()
            .add_timer(every_ms, true, callback)
    }

    /// Cancel a timer. Returns `false` if it already fired or was cleared.
    pub fn clear_timer(&self, id: TimerId) -> bool {
        self.inner.event_loop.borrow_mut().clear_timer(id)
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.event_loop.borrow().timer_count()
    }

    /// Microtask checkpoint: run queued microtasks, then deliver pending
    /// mutation records to their observers, until neither produces work.
    pub fn tick(&self) {
        loop {
            let mut progressed = false;
            loop {
                let task = self.inner.event_loop.borrow_mut().pop_microtask();
                let Some(task) = task else {
                    break;
                };
                isolate("microtask", task);
                progressed = true;
            }

            let pending = self.dom().pending_observations();
            for id in pending {
                let records = self.dom_mut().take_records(id);
                if records.is_empty() {
                    continue;
                }
                progressed = true;
                let callback = self.inner.observers.borrow().get(id).cloned();
                if let Some(callback) = callback {
                    isolate("mutation observer", || callback(records));
                }
            }

            if !progressed {
                break;
            }
        }
    }

    /// Move the clock forward by `ms`, firing every timer that comes due in
    /// order and running a microtask checkpoint after each.
    pub fn advance(&self, ms: u64) {
        self.tick();
        let deadline = self.now() + ms;
        loop {
            let due = self.inner.event_loop.borrow_mut().next_due(deadline);
            let Some(callback) = due else {
                break;
            };
            // An interval that re-enters `advance` from its own body is skipped.
            if let Ok(mut f) = callback.try_borrow_mut() {
                isolate("timer", || (*f)());
            }
            self.tick();
        }
        self.inner.event_loop.borrow_mut().set_now(deadline);
    }

    // -----------------------------------------------------------------------
    // Mutation observers
    // -----------------------------------------------------------------------

    /// Watch child-list changes inside `root`. Records are delivered in
    /// batches at the next [`tick`](Self::tick).
    pub fn observe(&self, root: NodeId, callback: impl Fn(Vec<MutationRecord>) + 'static) -> ObservationId {
        let id = self.dom_mut().observe(root);
        self.inner.observers.borrow_mut().insert(id, Rc::new(callback));
        id
    }

    pub fn disconnect(&self, id: ObservationId) {
        self.dom_mut().disconnect(id);
        self.inner.observers.borrow_mut().remove(id);
    }

    // -----------------------------------------------------------------------
    // Ready state
    // -----------------------------------------------------------------------

    pub fn ready_state(&self) -> ReadyState {
        self.inner.ready.get()
    }

    /// Run `f` once the document has finished loading. If it already has,
    /// `f` is queued as a microtask.
    pub fn on_ready(&self, f: impl FnOnce() + 'static) {
        match self.ready_state() {
            ReadyState::Loading => self.inner.ready_callbacks.borrow_mut().push(Box::new(f)),
            ReadyState::Complete => self.queue_microtask(f),
        }
    }

    /// Mark the document loaded and run the `on_ready` callbacks in order.
    pub fn finish_loading(&self) {
        if self.ready_state() == ReadyState::Complete {
            return;
        }
        self.inner.ready.set(ReadyState::Complete);
        let callbacks = std::mem::take(&mut *self.inner.ready_callbacks.borrow_mut());
        for callback in callbacks {
            isolate("ready callback", callback);
        }
    }
}
