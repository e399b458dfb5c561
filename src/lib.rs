//! # sting
//!
//! Signals, stores, and attribute directives bound to a headless DOM.
//!
//! sting keeps DOM nodes synchronised with reactive state without a virtual
//! DOM or a template compiler. Components are plain factories that return a
//! [`Scope`] of signals, stores, and handlers; markup refers to them by path
//! through `x-*` attributes.
//!
//! ## Core Systems
//!
//! - **[`reactive`]**: signals, effects, computed values, batching
//! - **[`store`]**: nested copy-on-write state behind one signal
//! - **[`scope`]**: component scopes and safe path resolution
//! - **[`expr`]**: the restricted expression grammar directives accept
//! - **[`directive`]**: the binder protocol and the built-in directives
//! - **[`runtime`]**: component registry, mount/unmount, lifecycle
//! - **[`dom`]** / **[`document`]**: the headless DOM and its event loop
//! - **[`app`]**: the [`Sting`] handle tying everything together
//! - **[`testing`]**: the [`Pilot`](testing::Pilot) test driver
//!
//! ```ignore
//! use sting::{json, Handler, Scope, Sting};
//!
//! let sting = Sting::from_html(r#"
//!     <div x-data="counter">
//!       <span x-text="count"></span>
//!       <button x-on:click="increment">+</button>
//!     </div>"#)?;
//! sting.register_component("counter", |s| {
//!     let (count, set_count) = s.create_signal(json!(0));
//!     let inc = set_count.clone();
//!     Scope::new()
//!         .with("count", (count, set_count))
//!         .with("increment", Handler::new(move |_| {
//!             inc.update(|n| json!(n.as_i64().unwrap_or(0) + 1))
//!         }))
//! })?;
//! ```

// Foundation
pub mod error;
pub mod expr;

// Reactivity
pub mod reactive;
pub mod store;

// DOM
pub mod document;
pub mod dom;

// Binding
pub mod directive;
pub mod scope;

// Application
pub mod app;
pub mod runtime;

// Test support
pub mod testing;

pub use app::{PluginApi, Sting, StingConfig, Unregister, WeakSting};
pub use directive::{Binder, BinderContext};
pub use document::{Document, ReadyState};
pub use dom::{Event, NodeId};
pub use error::StingError;
pub use reactive::{Cleanup, Computed, Dispose, ReadSignal, Reactor, WriteSignal};
pub use runtime::LifecycleEvent;
pub use scope::{Arg, Binding, Getter, Handler, Scope};
pub use serde_json::{json, Value};
pub use store::{produce, SetStore, StoreView};
