//! Reactive state: signals, effects, computed values.
//!
//! Fine-grained, synchronous, single-threaded. All state lives in an explicit
//! [`Reactor`]; there is no global runtime.
//!
//! - [`Reactor::create_signal`]: a read/write signal pair.
//! - [`Reactor::create_effect`]: auto-tracking side effect.
//! - [`Reactor::create_computed`]: derived read-only signal.
//! - [`Reactor::batch`]: coalesce writes into one notification pass.
//! - [`Reactor::untrack`]: read without subscribing.

pub mod effect;
pub mod runtime;
pub mod signal;

pub use effect::{Cleanup, Computed, Dispose, IntoCleanup};
pub use runtime::{EffectId, Reactor};
pub use signal::{ReadSignal, WriteSignal};
