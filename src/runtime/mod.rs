//! Component runtime: registries, mount bookkeeping, and teardown.

pub mod lifecycle;
pub mod mount;
pub mod registry;

pub use lifecycle::{DisposerList, LifecycleEvent, LifecycleTracker};
pub use registry::{DirectiveId, Factory};
