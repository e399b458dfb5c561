//! Events, listener registration, and bubble path computation.
//!
//! Listeners are stored in the [`Dom`] but invoked by the document, which
//! snapshots the matching callbacks first so no DOM borrow is held while user
//! code runs.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use slotmap::new_key_type;

use super::node::NodeId;
use super::tree::Dom;

new_key_type! {
    /// Handle to one registered listener.
    pub struct ListenerId;
}

/// Listener callback.
pub type ListenerFn = Rc<dyn Fn(&Event)>;

pub(crate) struct Listener {
    pub(crate) node: NodeId,
    pub(crate) event: String,
    pub(crate) callback: ListenerFn,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

struct EventInner {
    name: String,
    detail: Value,
    bubbles: bool,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

/// A dispatched event. Clones share state, so `stop_propagation` on a clone
/// handed to a handler affects the dispatch.
#[derive(Clone)]
pub struct Event {
    inner: Rc<EventInner>,
}

impl Event {
    /// A bubbling event with a null detail.
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(name.into(), Value::Null, true)
    }

    /// An event that only reaches listeners on its target.
    pub fn non_bubbling(name: impl Into<String>) -> Self {
        Self::build(name.into(), Value::Null, false)
    }

    pub fn with_detail(self, detail: Value) -> Self {
        Self::build(self.inner.name.clone(), detail, self.inner.bubbles)
    }

    fn build(name: String, detail: Value, bubbles: bool) -> Self {
        Self {
            inner: Rc::new(EventInner {
                name,
                detail,
                bubbles,
                target: Cell::new(None),
                current_target: Cell::new(None),
                propagation_stopped: Cell::new(false),
                default_prevented: Cell::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn detail(&self) -> &Value {
        &self.inner.detail
    }

    pub fn bubbles(&self) -> bool {
        self.inner.bubbles
    }

    pub fn target(&self) -> Option<NodeId> {
        self.inner.target.get()
    }

    pub fn current_target(&self) -> Option<NodeId> {
        self.inner.current_target.get()
    }

    pub fn stop_propagation(&self) {
        self.inner.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.inner.propagation_stopped.get()
    }

    pub fn prevent_default(&self) {
        self.inner.default_prevented.set(true);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.inner.default_prevented.get()
    }

    pub(crate) fn set_target(&self, target: NodeId) {
        self.inner.target.set(Some(target));
    }

    pub(crate) fn set_current_target(&self, node: Option<NodeId>) {
        self.inner.current_target.set(node);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.inner.name)
            .field("target", &self.target())
            .field("detail", &self.inner.detail)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Listener registry
// ---------------------------------------------------------------------------

impl Dom {
    /// Attach `callback` for `event` on `node`. Listeners on one node run in
    /// registration order.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        callback: impl Fn(&Event) + 'static,
    ) -> ListenerId {
        let id = self.listeners.insert(Listener {
            node,
            event: event.to_owned(),
            callback: Rc::new(callback),
        });
        match self.listeners_by_node.get_mut(node) {
            Some(ids) => ids.push(id),
            None => {
                self.listeners_by_node.insert(node, vec![id]);
            }
        }
        id
    }

    /// Detach a listener. Returns `false` if it was already gone.
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        let Some(listener) = self.listeners.remove(id) else {
            return false;
        };
        if let Some(ids) = self.listeners_by_node.get_mut(listener.node) {
            ids.retain(|&l| l != id);
        }
        true
    }

    /// Number of listeners on `node`, optionally only for one event name.
    pub fn listener_count(&self, node: NodeId, event: Option<&str>) -> usize {
        self.listeners_by_node
            .get(node)
            .map(|ids| {
                ids.iter()
                    .filter_map(|&id| self.listeners.get(id))
                    .filter(|l| event.is_none_or(|e| l.event == e))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Total listeners in the document.
    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }

    /// Snapshot the callbacks registered on `node` for `event`.
    pub(crate) fn listeners_for(&self, node: NodeId, event: &str) -> Vec<ListenerFn> {
        self.listeners_by_node
            .get(node)
            .map(|ids| {
                ids.iter()
                    .filter_map(|&id| self.listeners.get(id))
                    .filter(|l| l.event == event)
                    .map(|l| l.callback.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Compute the bubble path from `start` up to the document (inclusive).
    ///
    /// Returns `[start, parent, grandparent, ..., document]`.
    /// If `start` does not exist in the DOM, returns an empty vec.
    pub fn bubble_path(&self, start: NodeId) -> Vec<NodeId> {
        if !self.exists(start) {
            return Vec::new();
        }
        let mut path = vec![start];
        path.extend(self.ancestors(start));
        path
    }
}
