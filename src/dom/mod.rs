//! Headless DOM: slotmap-backed node arena with attribute queries, listeners,
//! mutation records, and an HTML fragment parser.

pub mod event;
pub mod mutation;
pub mod node;
pub mod parse;
pub mod query;
pub mod serialize;
pub mod tree;

pub use event::{Event, ListenerFn, ListenerId};
pub use mutation::{MutationRecord, ObservationId};
pub use node::{NodeData, NodeId, NodeKind};
pub use parse::{parse_fragment, ParseError};
pub use tree::Dom;
