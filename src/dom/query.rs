//! DOM queries: by attribute, by tag, by `data-testid`; predicate matching.
//!
//! All queries walk the tree under a root in document order, so results are
//! deterministic and detached nodes are never returned unless the root
//! itself is detached.

use super::node::{NodeData, NodeId};
use super::tree::Dom;

impl Dom {
    /// All elements under `root` (inclusive) matching `predicate`, in
    /// document order.
    pub fn query_all(&self, root: NodeId, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        self.walk_depth_first(root)
            .into_iter()
            .filter(|&id| {
                self.get(id)
                    .is_some_and(|data| data.is_element() && predicate(data))
            })
            .collect()
    }

    /// All elements under `root` (inclusive) carrying attribute `name`.
    pub fn query_by_attr(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.query_all(root, |data| data.has_attr(name))
    }

    /// The first element under `root` whose attribute `name` equals `value`.
    pub fn query_by_attr_value(&self, root: NodeId, name: &str, value: &str) -> Option<NodeId> {
        self.query_all(root, |data| data.attr(name) == Some(value))
            .into_iter()
            .next()
    }

    /// All elements under `root` with the given tag.
    pub fn query_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.query_all(root, |data| data.is_tag(tag))
    }

    /// The element carrying `data-testid="<id>"` anywhere in the document.
    pub fn query_by_test_id(&self, id: &str) -> Option<NodeId> {
        self.query_by_attr_value(self.document(), "data-testid", id)
    }

    /// Find the first element with `id="<id>"` in the document.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query_by_attr_value(self.document(), "id", id)
    }
}
