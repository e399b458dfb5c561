//! Directives: attribute-driven bindings between the DOM and a scope.
//!
//! A [`Binder`] is invoked once for every element of a hydrated subtree. It
//! inspects the element through its [`BinderContext`], and for each
//! directive it recognises creates effects and listeners whose teardown goes
//! on the context's disposer list.
//!
//! Built-in binders, in the order they run on each element:
//!
//! | attribute        | module          |
//! |------------------|-----------------|
//! | `x-on:<event>`   | [`on`]          |
//! | `x-debug`        | [`debug`]       |
//! | `x-show`         | [`show`]        |
//! | `x-text`         | [`text`]        |
//! | `x-model`        | [`model`]       |
//! | `x-bind:<attr>`  | [`bind`]        |
//! | `x-effect`       | [`effect`]      |
//! | `x-if`           | [`conditional`] |
//! | `x-for`          | [`list`]        |

pub mod bind;
pub mod conditional;
pub mod debug;
pub mod effect;
pub mod list;
pub mod model;
pub mod on;
pub mod show;
pub mod text;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::app::{Sting, WeakSting};
use crate::document::{Document, WeakDocument};
use crate::dom::{Dom, Event, NodeId};
use crate::error::StingError;
use crate::expr::SafePath;
use crate::reactive::{IntoCleanup, Reactor};
use crate::runtime::lifecycle::DisposerList;
use crate::scope::{self, Scope};

/// A directive binder.
pub type Binder = Rc<dyn Fn(&BinderContext<'_>) -> Result<(), StingError>>;

/// The built-in binders in dispatch order.
pub(crate) fn builtins(with_debug: bool) -> Vec<(&'static str, Binder)> {
    type BindFn = fn(&BinderContext<'_>) -> Result<(), StingError>;
    let table: [(&'static str, BindFn); 9] = [
        ("x-on", on::bind),
        ("x-debug", debug::bind),
        ("x-show", show::bind),
        ("x-text", text::bind),
        ("x-model", model::bind),
        ("x-bind", bind::bind),
        ("x-effect", effect::bind),
        ("x-if", conditional::bind),
        ("x-for", list::bind),
    ];
    table
        .into_iter()
        .filter(|(name, _)| with_debug || *name != "x-debug")
        .map(|(name, f)| (name, Rc::new(f) as Binder))
        .collect()
}

/// Everything a binder may touch while binding one element.
pub struct BinderContext<'a> {
    pub(crate) sting: &'a Sting,
    pub(crate) el: NodeId,
    pub(crate) scope: &'a Scope,
    pub(crate) disposers: &'a DisposerList,
}

impl BinderContext<'_> {
    /// The element being bound.
    pub fn el(&self) -> NodeId {
        self.el
    }

    pub fn scope(&self) -> &Scope {
        self.scope
    }

    pub fn sting(&self) -> &Sting {
        self.sting
    }

    pub fn document(&self) -> &Document {
        self.sting.document()
    }

    pub fn reactor(&self) -> &Reactor {
        self.sting.reactor()
    }

    /// Where teardown for this element goes.
    pub fn disposers(&self) -> &DisposerList {
        self.disposers
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.document().dom().attr(self.el, name).map(str::to_owned)
    }

    /// `(suffix, value)` for every attribute named `prefix<suffix>`.
    pub fn attrs_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        let dom = self.document().dom();
        let Some(data) = dom.get(self.el) else {
            return Vec::new();
        };
        data.attributes
            .iter()
            .filter_map(|(name, value)| {
                name.strip_prefix(prefix)
                    .map(|suffix| (suffix.to_owned(), value.clone()))
            })
            .collect()
    }

    /// Lower-cased tag name, empty for non-elements.
    pub fn tag(&self) -> String {
        self.document()
            .dom()
            .get(self.el)
            .map(|d| d.tag.clone())
            .unwrap_or_default()
    }

    /// Parse `expr` as a safe path. An invalid path is an error in
    /// development builds; release builds skip the binding (`Ok(None)`).
    pub fn safe_path(&self, directive: &str, expr: &str) -> Result<Option<SafePath>, StingError> {
        match SafePath::parse(expr) {
            Ok(path) => Ok(Some(path)),
            Err(_) => {
                crate::dev_ensure!(
                    false,
                    StingError::InvalidPath {
                        directive: directive.to_owned(),
                        expr: expr.to_owned(),
                    }
                );
                Ok(None)
            }
        }
    }

    /// Tracked read of `path` against this element's scope.
    pub fn get_path(&self, path: &SafePath) -> Value {
        scope::get_path(self.scope, path)
    }

    /// Write `path`. Failures are logged by the resolver and otherwise
    /// ignored.
    pub fn set_path(&self, path: &SafePath, value: Value) {
        let _ = scope::set_path(self.scope, path, value);
    }

    /// Create an effect owned by this element's mount.
    pub fn effect<R: IntoCleanup>(&self, f: impl FnMut() -> R + 'static) {
        let dispose = self.reactor().create_effect(f);
        self.disposers.push_effect(dispose);
    }

    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        self.reactor().untrack(f)
    }

    /// Listen for `event` on this element until the mount is torn down.
    pub fn listen(&self, event: &str, callback: impl Fn(&Event) + 'static) {
        let id = self
            .document()
            .dom_mut()
            .add_event_listener(self.el, event, callback);
        let doc = self.document().downgrade();
        self.disposers.push(move || {
            if let Some(doc) = doc.upgrade() {
                doc.dom_mut().remove_event_listener(id);
            }
        });
    }

    /// A weak handle to the document, for closures stored in the document
    /// or the reactor.
    pub fn weak_document(&self) -> WeakDocument {
        self.document().downgrade()
    }

    /// Apply the binding pass to a subtree inserted by a directive. Nested
    /// component roots inside it are left to the mutation observer.
    pub fn hydrate(&self, root: NodeId, scope: &Scope, disposers: &DisposerList) -> Result<(), StingError> {
        self.sting.hydrate(root, scope, disposers)
    }
}

// ---------------------------------------------------------------------------
// Template helpers for x-if / x-for
// ---------------------------------------------------------------------------

/// The content fragment of the `<template>` carrying `directive`, or a
/// warning and `None` on any other element.
pub(crate) fn template_content(ctx: &BinderContext<'_>, directive: &str) -> Option<NodeId> {
    let dom = ctx.document().dom();
    let data = dom.get(ctx.el())?;
    if !data.is_tag("template") {
        crate::dev_warn!("{directive} is only supported on <template>, not <{}>", data.tag);
        return None;
    }
    data.template_content
}

/// Clone `content` and insert its top-level nodes into `parent` before
/// `reference`. Returns the inserted nodes in order.
pub(crate) fn instantiate(
    dom: &mut Dom,
    content: NodeId,
    parent: NodeId,
    reference: Option<NodeId>,
) -> Vec<NodeId> {
    let Some(copy) = dom.clone_subtree(content) else {
        return Vec::new();
    };
    let nodes = dom.children(copy).to_vec();
    dom.insert_before(parent, copy, reference);
    dom.destroy(copy);
    nodes
}

/// Discard every node in `nodes`, emptying it.
pub(crate) fn remove_all(sting: &WeakSting, nodes: &RefCell<Vec<NodeId>>) {
    let drained: Vec<NodeId> = nodes.borrow_mut().drain(..).collect();
    if let Some(sting) = sting.upgrade() {
        {
            let mut dom = sting.document().dom_mut();
            for node in drained {
                dom.discard(node);
            }
        }
        sting.release_discarded();
    }
}
