//! Tree operations: create, insert, detach, clone, walk.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::event::{Listener, ListenerId};
use super::mutation::{MutationRecord, Observation, ObservationId};
use super::node::{NodeData, NodeId, NodeKind};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The document tree, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that detaching is O(siblings) and lookup is O(1).
///
/// Detaching a node ([`remove`](Self::remove)) keeps it alive so it can be
/// re-inserted elsewhere. Freeing is explicit: [`destroy`](Self::destroy)
/// frees a subtree now, [`discard`](Self::discard) detaches and defers the
/// free to [`collect_garbage`](Self::collect_garbage).
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    document: NodeId,
    discarded: Vec<NodeId>,
    pub(crate) observations: SlotMap<ObservationId, Observation>,
    pub(crate) listeners: SlotMap<ListenerId, Listener>,
    pub(crate) listeners_by_node: SecondaryMap<NodeId, Vec<ListenerId>>,
}

impl Dom {
    /// Create a DOM holding only the document node.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let document = nodes.insert(NodeData::document());
        let mut children = SecondaryMap::new();
        children.insert(document, Vec::new());
        Self {
            nodes,
            children,
            parent: SecondaryMap::new(),
            document,
            discarded: Vec::new(),
            observations: SlotMap::with_key(),
            listeners: SlotMap::with_key(),
            listeners_by_node: SecondaryMap::new(),
        }
    }

    /// The document node. Everything reachable from it is connected.
    pub fn document(&self) -> NodeId {
        self.document
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Create a detached node. `<template>` elements get an empty content
    /// fragment.
    pub fn create(&mut self, mut data: NodeData) -> NodeId {
        if data.is_tag("template") && data.template_content.is_none() {
            let content = self.nodes.insert(NodeData::fragment());
            self.children.insert(content, Vec::new());
            data.template_content = Some(content);
        }
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create(NodeData::element(tag))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.create(NodeData::text(text))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.create(NodeData::comment(text))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.create(NodeData::fragment())
    }

    // -----------------------------------------------------------------------
    // Insertion / removal
    // -----------------------------------------------------------------------

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` into `parent` before `reference` (append if `None` or
    /// if `reference` is not a child of `parent`).
    ///
    /// A child that already has a parent is detached first. Inserting a
    /// fragment moves its children and leaves the fragment empty.
    ///
    /// # Panics
    ///
    /// Panics (debug) if the insertion would create a cycle.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if !self.exists(parent) || !self.exists(child) {
            return;
        }
        debug_assert!(
            !self.contains(child, parent),
            "inserting a node into its own subtree"
        );

        let moved = if self.kind(child) == Some(NodeKind::Fragment) {
            let kids = self.children(child).to_vec();
            if let Some(siblings) = self.children.get_mut(child) {
                siblings.clear();
            }
            for &kid in &kids {
                self.parent.remove(kid);
            }
            kids
        } else {
            self.detach(child);
            vec![child]
        };
        if moved.is_empty() {
            return;
        }

        let siblings = match self.children.get_mut(parent) {
            Some(siblings) => siblings,
            None => return,
        };
        let mut at = reference
            .and_then(|r| siblings.iter().position(|&s| s == r))
            .unwrap_or(siblings.len());
        for &node in &moved {
            siblings.insert(at, node);
            at += 1;
        }
        for &node in &moved {
            self.parent.insert(node, parent);
        }
        self.record(parent, moved, Vec::new());
    }

    /// Detach `id` from its parent. The node stays alive and can be
    /// re-inserted. Returns `false` if it had no parent.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.detach(id).is_some()
    }

    /// Detach `id` and free it at the next [`collect_garbage`](Self::collect_garbage)
    /// unless it has been re-attached by then.
    pub fn discard(&mut self, id: NodeId) {
        self.detach(id);
        if self.exists(id) {
            self.discarded.push(id);
        }
    }

    /// Free every discarded subtree that is still detached.
    /// Returns the number of nodes freed.
    pub fn collect_garbage(&mut self) -> usize {
        let before = self.nodes.len();
        for id in std::mem::take(&mut self.discarded) {
            if self.exists(id) && self.parent(id).is_none() {
                self.destroy(id);
            }
        }
        before - self.nodes.len()
    }

    /// Detach and free `id` with all its descendants, their template
    /// contents, and their listeners.
    pub fn destroy(&mut self, id: NodeId) {
        if !self.exists(id) || id == self.document {
            return;
        }
        self.detach(id);

        let mut to_free = VecDeque::new();
        to_free.push_back(id);
        while let Some(current) = to_free.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_free.extend(kids);
            }
            self.parent.remove(current);
            if let Some(ids) = self.listeners_by_node.remove(current) {
                for lid in ids {
                    self.listeners.remove(lid);
                }
            }
            if let Some(data) = self.nodes.remove(current) {
                if let Some(content) = data.template_content {
                    to_free.push_back(content);
                }
            }
        }
    }

    fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent.remove(id)?;
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.retain(|&child| child != id);
        }
        self.record(parent, Vec::new(), vec![id]);
        Some(parent)
    }

    /// Remove every child of `id`, discarding them.
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.discard(child);
        }
    }

    /// Deep-clone `id` (template contents included) into a new detached
    /// subtree. Listeners and binding marks are not copied.
    pub fn clone_subtree(&mut self, id: NodeId) -> Option<NodeId> {
        let data = self.get(id)?.shallow_clone();
        let content = self.get(id).and_then(|d| d.template_content);
        let copy = self.nodes.insert(data);
        self.children.insert(copy, Vec::new());
        if let Some(content) = content {
            let content_copy = self.clone_subtree(content);
            if let Some(d) = self.nodes.get_mut(copy) {
                d.template_content = content_copy;
            }
        }
        for child in self.children(id).to_vec() {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.parent.insert(child_copy, copy);
                if let Some(kids) = self.children.get_mut(copy) {
                    kids.push(child_copy);
                }
            }
        }
        Some(copy)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.get(c).is_some_and(NodeData::is_element))
            .collect()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let at = siblings.iter().position(|&s| s == id)?;
        siblings.get(at + 1).copied()
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself; it starts with the
    /// immediate parent and ends at the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `id` is reachable from the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.document, id)
    }

    /// Whether `node` is `root` or one of its descendants.
    pub fn contains(&self, root: NodeId, node: NodeId) -> bool {
        if !self.exists(node) {
            return false;
        }
        let mut current = Some(node);
        while let Some(c) = current {
            if c == root {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(|d| d.kind)
    }

    /// Number of live nodes, the document node included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no children.
    pub fn is_empty(&self) -> bool {
        self.children(self.document).is_empty()
    }

    /// Whether the node is still alive in the arena.
    pub fn exists(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            let kids = self.children(current);
            for &child in kids.iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Breadth-first traversal starting from `start`.
    pub fn walk_breadth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current) {
                queue.push_back(child);
            }
        }
        result
    }

    // -----------------------------------------------------------------------
    // Content accessors
    // -----------------------------------------------------------------------

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(data) = self.get_mut(id) {
            data.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(data) = self.get_mut(id) {
            data.remove_attr(name);
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.get(id) {
            Some(data) if matches!(data.kind, NodeKind::Text | NodeKind::Comment) => {
                data.text.clone()
            }
            Some(_) => self
                .walk_depth_first(id)
                .into_iter()
                .filter_map(|n| self.get(n))
                .filter(|d| d.kind == NodeKind::Text)
                .map(|d| d.text.as_str())
                .collect(),
            None => String::new(),
        }
    }

    /// Replace the children of `id` with a single text node. Text nodes are
    /// updated in place.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        match self.kind(id) {
            Some(NodeKind::Text | NodeKind::Comment) => {
                if let Some(data) = self.get_mut(id) {
                    data.text = text.to_owned();
                }
            }
            Some(_) => {
                if let [only] = self.children(id) {
                    let only = *only;
                    if self.kind(only) == Some(NodeKind::Text) {
                        if let Some(data) = self.get_mut(only) {
                            data.text = text.to_owned();
                        }
                        return;
                    }
                }
                self.clear_children(id);
                if !text.is_empty() {
                    let node = self.create_text(text);
                    self.append_child(id, node);
                }
            }
            None => {}
        }
    }

    /// One property of the inline `style` attribute.
    pub fn style_property(&self, id: NodeId, name: &str) -> Option<String> {
        let style = self.attr(id, "style")?;
        parse_style(style)
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Set (or with `None`, remove) one property of the inline `style`
    /// attribute. An empty style attribute is dropped.
    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: Option<&str>) {
        let mut props = self.attr(id, "style").map(parse_style).unwrap_or_default();
        match (props.iter().position(|(k, _)| k == name), value) {
            (Some(at), Some(v)) => props[at].1 = v.to_owned(),
            (None, Some(v)) => props.push((name.to_owned(), v.to_owned())),
            (Some(at), None) => {
                props.remove(at);
            }
            (None, None) => {}
        }
        if props.is_empty() {
            self.remove_attr(id, "style");
        } else {
            let joined = props
                .iter()
                .map(|(k, v)| format!("{k}: {v};"))
                .collect::<Vec<_>>()
                .join(" ");
            self.set_attr(id, "style", &joined);
        }
    }

    /// The current `value` of a form control.
    ///
    /// Falls back to the `value` attribute, the text of a `<textarea>`, or
    /// the selected option of a `<select>`.
    pub fn form_value(&self, id: NodeId) -> String {
        let Some(data) = self.get(id) else {
            return String::new();
        };
        if let Some(value) = &data.value {
            return value.clone();
        }
        match data.tag.as_str() {
            "textarea" => self.text_content(id),
            "select" => {
                let options: Vec<NodeId> = self
                    .walk_depth_first(id)
                    .into_iter()
                    .filter(|&n| self.get(n).is_some_and(|d| d.is_tag("option")))
                    .collect();
                options
                    .iter()
                    .copied()
                    .find(|&o| self.get(o).is_some_and(|d| d.has_attr("selected")))
                    .or_else(|| options.first().copied())
                    .map(|o| self.option_value(o))
                    .unwrap_or_default()
            }
            "input" if data.attr("type").is_some_and(|t| t == "checkbox" || t == "radio") => {
                data.attr("value").unwrap_or("on").to_owned()
            }
            _ => data.attr("value").unwrap_or_default().to_owned(),
        }
    }

    /// Write the `value` property. Returns `false` when it was already equal.
    pub fn set_form_value(&mut self, id: NodeId, value: &str) -> bool {
        if self.form_value(id) == value {
            return false;
        }
        if let Some(data) = self.get_mut(id) {
            data.value = Some(value.to_owned());
        }
        true
    }

    pub fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_owned(),
            None => self.text_content(option).trim().to_owned(),
        }
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(NodeData::is_checked)
    }

    /// Write the `checked` property. Returns `false` when it was already equal.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> bool {
        match self.get_mut(id) {
            Some(data) if data.is_checked() != checked => {
                data.checked = Some(checked);
                true
            }
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Mutation records
    // -----------------------------------------------------------------------

    fn record(&mut self, target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) {
        let interested: Vec<ObservationId> = self
            .observations
            .iter()
            .filter(|(_, obs)| self.contains(obs.root, target))
            .map(|(oid, _)| oid)
            .collect();
        for oid in interested {
            if let Some(obs) = self.observations.get_mut(oid) {
                obs.records.push(MutationRecord {
                    target,
                    added: added.clone(),
                    removed: removed.clone(),
                });
            }
        }
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .field("observations", &self.observations.len())
            .finish()
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim();
            (!k.is_empty()).then(|| (k.to_owned(), v.trim().to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small test tree under the document:
    /// ```text
    ///       root
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Dom, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.create_element("main");
        let a = dom.create_element("section");
        let b = dom.create_element("aside");
        let c = dom.create_element("button");
        let d = dom.create_text("label");
        dom.append_child(dom.document(), root);
        dom.append_child(root, a);
        dom.append_child(root, b);
        dom.append_child(a, c);
        dom.append_child(a, d);
        (dom, root, a, b, c, d)
    }

    #[test]
    fn append_sets_parent_and_children() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.parent(a), Some(root));
        assert_eq!(dom.parent(c), Some(a));
        assert_eq!(dom.children(root), &[a, b]);
        assert_eq!(dom.children(a), &[c, d]);
        assert_eq!(dom.element_children(a), vec![c]);
    }

    #[test]
    fn ancestors_end_at_document() {
        let (dom, root, a, _b, c, _d) = build_tree();
        assert_eq!(dom.ancestors(c), vec![a, root, dom.document()]);
    }

    #[test]
    fn insert_before_reference() {
        let (mut dom, root, a, b, ..) = build_tree();
        let x = dom.create_element("hr");
        dom.insert_before(root, x, Some(b));
        assert_eq!(dom.children(root), &[a, x, b]);
        assert_eq!(dom.next_sibling(x), Some(b));
        assert_eq!(dom.next_sibling(b), None);
    }

    #[test]
    fn inserting_attached_node_moves_it() {
        let (mut dom, root, a, b, c, d) = build_tree();
        dom.append_child(b, c);
        assert_eq!(dom.parent(c), Some(b));
        assert_eq!(dom.children(a), &[d]);
        assert_eq!(dom.ancestors(c), vec![b, root, dom.document()]);
    }

    #[test]
    fn fragment_insertion_moves_children() {
        let (mut dom, root, a, b, ..) = build_tree();
        let frag = dom.create_fragment();
        let x = dom.create_element("p");
        let y = dom.create_element("p");
        dom.append_child(frag, x);
        dom.append_child(frag, y);
        dom.insert_before(root, frag, Some(b));
        assert_eq!(dom.children(root), &[a, x, y, b]);
        assert!(dom.children(frag).is_empty());
        assert_eq!(dom.parent(x), Some(root));
    }

    #[test]
    fn remove_detaches_but_keeps_node() {
        let (mut dom, root, a, b, c, _d) = build_tree();
        assert!(dom.remove(a));
        assert!(!dom.remove(a));
        assert!(dom.exists(a));
        assert!(dom.exists(c));
        assert!(!dom.is_connected(c));
        assert_eq!(dom.children(root), &[b]);
        dom.append_child(b, a);
        assert!(dom.is_connected(c));
    }

    #[test]
    fn destroy_frees_subtree() {
        let (mut dom, root, a, b, c, d) = build_tree();
        let before = dom.len();
        dom.destroy(a);
        assert!(!dom.exists(a));
        assert!(!dom.exists(c));
        assert!(!dom.exists(d));
        assert_eq!(dom.children(root), &[b]);
        assert_eq!(dom.len(), before - 3);
    }

    #[test]
    fn discard_then_collect_frees_detached_only() {
        let (mut dom, root, a, b, ..) = build_tree();
        dom.discard(a);
        dom.discard(b);
        dom.append_child(root, b);
        let freed = dom.collect_garbage();
        assert_eq!(freed, 3);
        assert!(!dom.exists(a));
        assert!(dom.exists(b));
    }

    #[test]
    fn template_gets_content_fragment() {
        let mut dom = Dom::new();
        let t = dom.create_element("template");
        let content = dom.get(t).and_then(|d| d.template_content);
        assert!(content.is_some_and(|c| dom.kind(c) == Some(NodeKind::Fragment)));
    }

    #[test]
    fn clone_subtree_is_deep_and_detached() {
        let (mut dom, _root, a, _b, c, _d) = build_tree();
        dom.set_attr(c, "id", "go");
        if let Some(data) = dom.get_mut(c) {
            data.mark_bound("x-on");
        }
        let copy = dom.clone_subtree(a).expect("exists");
        assert_ne!(copy, a);
        assert_eq!(dom.parent(copy), None);
        let kids = dom.children(copy).to_vec();
        assert_eq!(kids.len(), 2);
        assert_eq!(dom.attr(kids[0], "id"), Some("go"));
        assert!(!dom.get(kids[0]).is_some_and(|d| d.is_bound("x-on")));
        assert_eq!(dom.text_content(copy), "label");
    }

    #[test]
    fn clone_template_copies_content() {
        let mut dom = Dom::new();
        let t = dom.create_element("template");
        let content = dom.get(t).and_then(|d| d.template_content).expect("content");
        let li = dom.create_element("li");
        dom.append_child(content, li);
        let copy = dom.clone_subtree(t).expect("exists");
        let copy_content = dom.get(copy).and_then(|d| d.template_content).expect("content");
        assert_ne!(copy_content, content);
        assert_eq!(dom.children(copy_content).len(), 1);
    }

    #[test]
    fn contains_is_inclusive() {
        let (dom, root, a, b, c, _d) = build_tree();
        assert!(dom.contains(root, c));
        assert!(dom.contains(a, a));
        assert!(!dom.contains(b, c));
    }

    #[test]
    fn text_content_roundtrip() {
        let (mut dom, _root, a, _b, _c, _d) = build_tree();
        assert_eq!(dom.text_content(a), "label");
        dom.set_text_content(a, "replaced");
        assert_eq!(dom.children(a).len(), 1);
        assert_eq!(dom.text_content(a), "replaced");
        dom.set_text_content(a, "again");
        assert_eq!(dom.text_content(a), "again");
    }

    #[test]
    fn style_property_updates() {
        let (mut dom, root, ..) = build_tree();
        dom.set_attr(root, "style", "color: red; display: flex");
        assert_eq!(dom.style_property(root, "display").as_deref(), Some("flex"));
        dom.set_style_property(root, "display", Some("none"));
        assert_eq!(dom.attr(root, "style"), Some("color: red; display: none;"));
        dom.set_style_property(root, "display", None);
        dom.set_style_property(root, "color", None);
        assert_eq!(dom.attr(root, "style"), None);
    }

    #[test]
    fn form_value_defaults() {
        let mut dom = Dom::new();
        let input = dom.create(NodeData::element("input").with_attr("value", "a"));
        assert_eq!(dom.form_value(input), "a");
        assert!(dom.set_form_value(input, "b"));
        assert!(!dom.set_form_value(input, "b"));
        assert_eq!(dom.form_value(input), "b");

        let select = dom.create_element("select");
        let one = dom.create(NodeData::element("option").with_attr("value", "1"));
        let two = dom.create(
            NodeData::element("option")
                .with_attr("value", "2")
                .with_attr("selected", ""),
        );
        dom.append_child(select, one);
        dom.append_child(select, two);
        assert_eq!(dom.form_value(select), "2");
    }

    #[test]
    fn checked_property() {
        let mut dom = Dom::new();
        let cb = dom.create(NodeData::element("input").with_attr("type", "checkbox"));
        assert!(!dom.is_checked(cb));
        assert!(dom.set_checked(cb, true));
        assert!(!dom.set_checked(cb, true));
        assert!(dom.is_checked(cb));
    }

    #[test]
    fn walk_orders() {
        let (dom, root, a, b, c, d) = build_tree();
        assert_eq!(dom.walk_depth_first(root), vec![root, a, c, d, b]);
        assert_eq!(dom.walk_breadth_first(root), vec![root, a, b, c, d]);
        assert_eq!(dom.walk_depth_first(a), vec![a, c, d]);
    }

    #[test]
    fn default_is_empty_document() {
        let dom = Dom::default();
        assert!(dom.is_empty());
        assert_eq!(dom.len(), 1);
        assert!(dom.is_connected(dom.document()));
    }
}
