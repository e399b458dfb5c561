//! Child-list mutation observation.
//!
//! An observation covers one root. Every insertion or detach whose parent is
//! inside the root at the time of the change appends a [`MutationRecord`].
//! Records accumulate until taken; delivery to callbacks is the document's
//! job.

use slotmap::new_key_type;

use super::node::NodeId;
use super::tree::Dom;

new_key_type! {
    /// Handle to one registered observation.
    pub struct ObservationId;
}

/// One child-list change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The parent whose children changed.
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug)]
pub(crate) struct Observation {
    pub(crate) root: NodeId,
    pub(crate) records: Vec<MutationRecord>,
}

impl Dom {
    /// Start recording child-list changes inside `root`.
    pub fn observe(&mut self, root: NodeId) -> ObservationId {
        self.observations.insert(Observation {
            root,
            records: Vec::new(),
        })
    }

    /// Drain the pending records of one observation.
    pub fn take_records(&mut self, id: ObservationId) -> Vec<MutationRecord> {
        self.observations
            .get_mut(id)
            .map(|obs| std::mem::take(&mut obs.records))
            .unwrap_or_default()
    }

    /// Observations that have records waiting.
    pub fn pending_observations(&self) -> Vec<ObservationId> {
        self.observations
            .iter()
            .filter(|(_, obs)| !obs.records.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// Stop recording. Pending records are dropped.
    pub fn disconnect(&mut self, id: ObservationId) {
        self.observations.remove(id);
    }
}
