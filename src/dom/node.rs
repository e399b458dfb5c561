//! Node types: NodeId, NodeKind, NodeData.

use indexmap::{IndexMap, IndexSet};
use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Nodes reachable from it are connected.
    Document,
    Element,
    Text,
    Comment,
    /// A detached container; inserting it moves its children instead.
    Fragment,
}

/// Data associated with a single DOM node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Lower-cased tag name. Empty for non-elements.
    pub tag: String,
    /// Attributes in source order.
    pub attributes: IndexMap<String, String>,
    /// Payload of text and comment nodes.
    pub text: String,
    /// The `value` property of form controls, once written.
    pub value: Option<String>,
    /// The `checked` property, once written.
    pub checked: Option<bool>,
    /// Content fragment of a `<template>` element.
    pub template_content: Option<NodeId>,
    /// Directive idempotency marks.
    bound: IndexSet<String>,
}

impl NodeData {
    fn with_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            tag: String::new(),
            attributes: IndexMap::new(),
            text: String::new(),
            value: None,
            checked: None,
            template_content: None,
            bound: IndexSet::new(),
        }
    }

    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::with_kind(NodeKind::Element)
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::with_kind(NodeKind::Text)
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::with_kind(NodeKind::Comment)
        }
    }

    pub fn fragment() -> Self {
        Self::with_kind(NodeKind::Fragment)
    }

    pub(crate) fn document() -> Self {
        Self::with_kind(NodeKind::Document)
    }

    /// Set an attribute (builder).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Whether this is an element with the given tag.
    pub fn is_tag(&self, tag: &str) -> bool {
        self.is_element() && self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute, keeping the order of the rest.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.shift_remove(name)
    }

    /// Record that a directive bound `key` on this element.
    /// Returns `false` if it was already bound.
    pub fn mark_bound(&mut self, key: impl Into<String>) -> bool {
        self.bound.insert(key.into())
    }

    pub fn unmark_bound(&mut self, key: &str) -> bool {
        self.bound.shift_remove(key)
    }

    pub fn is_bound(&self, key: &str) -> bool {
        self.bound.contains(key)
    }

    /// The `checked` property, falling back to the attribute.
    pub fn is_checked(&self) -> bool {
        self.checked.unwrap_or_else(|| self.has_attr("checked"))
    }

    /// Copy for cloning into a new subtree: binding marks are not carried.
    pub(crate) fn shallow_clone(&self) -> Self {
        Self {
            bound: IndexSet::new(),
            template_content: None,
            ..self.clone()
        }
    }
}
