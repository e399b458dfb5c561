//! Component scopes: the bag of state and handlers a component exposes to
//! its directives.
//!
//! A [`Scope`] is a chained environment. Each frame holds named
//! [`Binding`]s; lookups that miss the local frame fall through to the
//! parent. `x-for` creates one child frame per item so loop variables
//! shadow component state without copying it.
//!
//! ```ignore
//! let (count, set_count) = rx.create_signal(json!(0));
//! let scope = Scope::new()
//!     .with("count", (count, set_count.clone()))
//!     .with("increment", Handler::new(move |_| set_count.update(|n| json!(n.as_i64().unwrap_or(0) + 1))));
//! ```

pub mod path;
pub mod value;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::dom::{Event, NodeId};
use crate::reactive::{Cleanup, Computed, ReadSignal, WriteSignal};
use crate::store::StoreView;

pub use path::{get_path, lookup_binding, resolve_handler, set_path, PathError};
pub use value::{display, loose_eq, truthy};

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// One argument passed to a [`Handler`].
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Event(Event),
    Element(NodeId),
}

impl Arg {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<NodeId> {
        match self {
            Self::Element(id) => Some(*id),
            _ => None,
        }
    }
}

type HandlerFn = dyn Fn(&[Arg]) -> Option<Cleanup>;

/// A callable action exposed by a scope.
#[derive(Clone)]
pub struct Handler(Rc<HandlerFn>);

impl Handler {
    pub fn new(f: impl Fn(&[Arg]) + 'static) -> Self {
        Self(Rc::new(move |args| {
            f(args);
            None
        }))
    }

    /// A handler that may hand back a cleanup. `x-effect` runs the cleanup
    /// before the next run and on dispose; other callers drop it.
    pub fn with_cleanup(f: impl Fn(&[Arg]) -> Option<Cleanup> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &[Arg]) -> Option<Cleanup> {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler")
    }
}

/// A derived zero-argument reactive getter. Reads inside it are tracked by
/// whichever effect calls it.
#[derive(Clone)]
pub struct Getter(Rc<dyn Fn() -> Value>);

impl Getter {
    pub fn new(f: impl Fn() -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn get(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Getter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Getter")
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// What a scope name is bound to.
#[derive(Clone)]
pub enum Binding {
    /// Plain data. Not reactive.
    Value(Value),
    /// A read/write signal pair.
    Signal(ReadSignal<Value>, WriteSignal<Value>),
    /// A read-only derived value.
    Computed(Computed<Value>),
    /// A store view.
    Store(StoreView),
    Getter(Getter),
    Handler(Handler),
    /// A nested bag of bindings, addressed as `outer.inner`.
    Scope(Scope),
}

impl Binding {
    /// Whether reads through this binding are tracked.
    pub fn is_reactive(&self) -> bool {
        matches!(
            self,
            Self::Signal(..) | Self::Computed(_) | Self::Store(_) | Self::Getter(_)
        )
    }

    /// Effects currently subscribed, for bindings backed by a signal.
    pub fn observer_count(&self) -> Option<usize> {
        match self {
            Self::Signal(read, _) => Some(read.observer_count()),
            Self::Computed(c) => Some(c.signal().observer_count()),
            Self::Store(view) => Some(view.observer_count()),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Signal(..) => "signal",
            Self::Computed(_) => "computed",
            Self::Store(_) => "store",
            Self::Getter(_) => "getter",
            Self::Handler(_) => "handler",
            Self::Scope(_) => "scope",
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "Value({v})"),
            other => f.write_str(other.kind()),
        }
    }
}

impl From<Value> for Binding {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<(ReadSignal<Value>, WriteSignal<Value>)> for Binding {
    fn from((read, write): (ReadSignal<Value>, WriteSignal<Value>)) -> Self {
        Self::Signal(read, write)
    }
}

impl From<Computed<Value>> for Binding {
    fn from(c: Computed<Value>) -> Self {
        Self::Computed(c)
    }
}

impl From<StoreView> for Binding {
    fn from(view: StoreView) -> Self {
        Self::Store(view)
    }
}

impl From<Getter> for Binding {
    fn from(g: Getter) -> Self {
        Self::Getter(g)
    }
}

impl From<Handler> for Binding {
    fn from(h: Handler) -> Self {
        Self::Handler(h)
    }
}

impl From<Scope> for Binding {
    fn from(s: Scope) -> Self {
        Self::Scope(s)
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

struct ScopeFrame {
    bindings: RefCell<IndexMap<String, Binding>>,
    parent: Option<Scope>,
}

/// A chained environment of named bindings. Cheap to clone; clones share
/// frames.
#[derive(Clone)]
pub struct Scope(Rc<ScopeFrame>);

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("bindings", &*self.0.bindings.borrow())
            .field("parent", &self.0.parent)
            .finish()
    }
}

impl Scope {
    /// An empty root frame.
    pub fn new() -> Self {
        Self(Rc::new(ScopeFrame {
            bindings: RefCell::new(IndexMap::new()),
            parent: None,
        }))
    }

    /// Bind `name` in this frame (builder).
    pub fn with(self, name: impl Into<String>, binding: impl Into<Binding>) -> Self {
        self.insert(name, binding);
        self
    }

    /// Bind `name` in this frame, replacing any local binding.
    pub fn insert(&self, name: impl Into<String>, binding: impl Into<Binding>) {
        self.0
            .bindings
            .borrow_mut()
            .insert(name.into(), binding.into());
    }

    /// An empty frame whose lookups fall through to `self`.
    pub fn child(&self) -> Scope {
        Self(Rc::new(ScopeFrame {
            bindings: RefCell::new(IndexMap::new()),
            parent: Some(self.clone()),
        }))
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    /// Look `name` up along the chain.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.owner_of(name).and_then(|frame| frame.lookup_local(name))
    }

    /// Look `name` up in this frame only.
    pub fn lookup_local(&self, name: &str) -> Option<Binding> {
        self.0.bindings.borrow().get(name).cloned()
    }

    /// The nearest frame along the chain that binds `name`.
    pub fn owner_of(&self, name: &str) -> Option<Scope> {
        let mut frame = Some(self);
        while let Some(current) = frame {
            if current.0.bindings.borrow().contains_key(name) {
                return Some(current.clone());
            }
            frame = current.parent();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.owner_of(name).is_some()
    }

    /// Names bound in this frame, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.bindings.borrow().keys().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
