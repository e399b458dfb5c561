//! The [`Sting`] handle: component registry, runtime, and reactive
//! primitives behind one cheap-to-clone value.
//!
//! ```ignore
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
//!         .with("increment", Handler::new(move |_| inc.update(|n| json!(n.as_i64().unwrap_or(0) + 1))))
//! })?;
//! sting.document().tick(); // auto-start runs as a microtask
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;
use slotmap::SecondaryMap;

use crate::directive::{self, BinderContext};
use crate::document::{Document, ReadyState, TimerId};
use crate::dom::{NodeId, ObservationId};
use crate::error::StingError;
use crate::reactive::{Computed, Dispose, IntoCleanup, ReadSignal, Reactor, WriteSignal};
use crate::runtime::lifecycle::{DisposerList, LifecycleEvent, LifecycleTracker, SetupSlot};
use crate::runtime::registry::{ComponentRegistry, DirectiveId, DirectiveRegistry};
use crate::scope::Scope;
use crate::store::{self, SetStore, StoreView};

// ---------------------------------------------------------------------------
// StingConfig
// ---------------------------------------------------------------------------

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct StingConfig {
    /// Start on the first component registration (one microtask later, or
    /// once the document has loaded).
    pub auto_start: bool,
    /// Mount and unmount component roots added to or removed from the DOM.
    pub observe_mutations: bool,
    /// Register `x-debug` (debug builds only).
    pub debug_directive: bool,
}

impl Default for StingConfig {
    fn default() -> Self {
        Self {
            auto_start: true,
            observe_mutations: true,
            debug_directive: true,
        }
    }
}

impl StingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_start(mut self, on: bool) -> Self {
        self.auto_start = on;
        self
    }

    pub fn with_observe_mutations(mut self, on: bool) -> Self {
        self.observe_mutations = on;
        self
    }

    pub fn with_debug_directive(mut self, on: bool) -> Self {
        self.debug_directive = on;
        self
    }
}

// ---------------------------------------------------------------------------
// Sting
// ---------------------------------------------------------------------------

/// A live component mount.
pub(crate) struct Mount {
    pub(crate) name: String,
    pub(crate) scope: Scope,
    pub(crate) disposers: DisposerList,
}

pub(crate) struct StingInner {
    pub(crate) config: StingConfig,
    pub(crate) document: Document,
    pub(crate) reactor: Reactor,
    pub(crate) components: RefCell<ComponentRegistry>,
    pub(crate) directives: RefCell<DirectiveRegistry>,
    pub(crate) mounts: RefCell<SecondaryMap<NodeId, Mount>>,
    pub(crate) lifecycle: RefCell<LifecycleTracker>,
    pub(crate) setup: SetupSlot,
    /// Set while started.
    pub(crate) root: Cell<Option<NodeId>>,
    pub(crate) observation: Cell<Option<ObservationId>>,
    pub(crate) start_queued: Cell<bool>,
}

/// The runtime handle. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct Sting {
    pub(crate) inner: Rc<StingInner>,
}

/// Non-owning handle, for closures stored in the document or reactor.
#[derive(Clone)]
pub struct WeakSting {
    inner: Weak<StingInner>,
}

impl WeakSting {
    pub fn upgrade(&self) -> Option<Sting> {
        self.inner.upgrade().map(|inner| Sting { inner })
    }
}

impl fmt::Debug for Sting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sting")
            .field("config", &self.inner.config)
            .field("components", &*self.inner.components.borrow())
            .field("directives", &*self.inner.directives.borrow())
            .field("mounted", &self.inner.lifecycle.borrow().mounted_count())
            .field("started", &self.is_started())
            .finish()
    }
}

impl Default for Sting {
    fn default() -> Self {
        Self::new()
    }
}

impl Sting {
    /// A runtime over an empty, loaded document.
    pub fn new() -> Self {
        Self::with_config(StingConfig::default())
    }

    pub fn with_config(config: StingConfig) -> Self {
        Self::with_document(Document::new(), config)
    }

    /// A runtime over an existing document.
    pub fn with_document(document: Document, config: StingConfig) -> Self {
        let mut directives = DirectiveRegistry::default();
        let with_debug = config.debug_directive && cfg!(debug_assertions);
        for (name, binder) in directive::builtins(with_debug) {
            directives.register(name, binder);
        }
        Self {
            inner: Rc::new(StingInner {
                config,
                document,
                reactor: Reactor::new(),
                components: RefCell::new(ComponentRegistry::default()),
                directives: RefCell::new(directives),
                mounts: RefCell::new(SecondaryMap::new()),
                lifecycle: RefCell::new(LifecycleTracker::new()),
                setup: SetupSlot::default(),
                root: Cell::new(None),
                observation: Cell::new(None),
                start_queued: Cell::new(false),
            }),
        }
    }

    /// A runtime over a loaded document whose body holds `html`.
    pub fn from_html(html: &str) -> Result<Self, StingError> {
        Ok(Self::with_document(
            Document::from_html(html)?,
            StingConfig::default(),
        ))
    }

    pub fn downgrade(&self) -> WeakSting {
        WeakSting {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn reactor(&self) -> &Reactor {
        &self.inner.reactor
    }

    pub fn config(&self) -> &StingConfig {
        &self.inner.config
    }

    pub fn is_started(&self) -> bool {
        self.inner.root.get().is_some()
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    /// Register (or replace) the factory for `name`.
    ///
    /// Before start, the first registration schedules the automatic start.
    /// After start, unmounted roots naming `name` are mounted right away.
    pub fn register_component(
        &self,
        name: &str,
        factory: impl Fn(&Sting) -> Scope + 'static,
    ) -> Result<(), StingError> {
        let name = name.trim();
        crate::dev_ensure!(!name.is_empty(), StingError::EmptyComponentName);
        let replaced = self
            .inner
            .components
            .borrow_mut()
            .register(name, Rc::new(factory));
        tracing::debug!(target: "sting", name, replaced, "component registered");

        if self.is_started() {
            self.mount_pending(name);
        } else if self.inner.config.auto_start {
            self.queue_auto_start();
        }
        Ok(())
    }

    fn queue_auto_start(&self) {
        if self.inner.start_queued.replace(true) {
            return;
        }
        let weak = self.downgrade();
        self.document().queue_microtask(move || {
            let Some(sting) = weak.upgrade() else {
                return;
            };
            match sting.document().ready_state() {
                ReadyState::Complete => sting.auto_start(),
                ReadyState::Loading => {
                    let weak = sting.downgrade();
                    sting.document().on_ready(move || {
                        if let Some(sting) = weak.upgrade() {
                            sting.auto_start();
                        }
                    });
                }
            }
        });
    }

    fn auto_start(&self) {
        // `stop()` in between cancels.
        if !self.inner.start_queued.get() {
            return;
        }
        if let Err(err) = self.start(None) {
            tracing::error!(target: "sting", "automatic start failed: {err}");
        }
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.inner.components.borrow().contains(name.trim())
    }

    /// Names of the registered binders, in dispatch order.
    pub fn directive_names(&self) -> Vec<String> {
        self.inner.directives.borrow().names()
    }

    /// Whether `el` is a mounted component root.
    pub fn is_mounted(&self, el: NodeId) -> bool {
        self.inner.mounts.borrow().contains_key(el)
    }

    /// The scope of the component mounted at `el`.
    pub fn scope_of(&self, el: NodeId) -> Option<Scope> {
        self.inner.mounts.borrow().get(el).map(|m| m.scope.clone())
    }

    /// Drain the mount/unmount log.
    pub fn lifecycle_events(&self) -> Vec<LifecycleEvent> {
        self.inner.lifecycle.borrow_mut().take_events()
    }

    // -----------------------------------------------------------------------
    // Directives and plugins
    // -----------------------------------------------------------------------

    /// Add a binder, run after the built-ins on every hydrated element.
    pub fn register_directive(
        &self,
        binder: impl Fn(&BinderContext<'_>) -> Result<(), StingError> + 'static,
    ) -> Unregister {
        let id = self
            .inner
            .directives
            .borrow_mut()
            .register("custom", Rc::new(binder));
        Unregister {
            sting: self.downgrade(),
            id,
        }
    }

    /// Hand `plugin` the extension API.
    pub fn use_plugin(&self, plugin: impl FnOnce(&PluginApi<'_>)) {
        plugin(&PluginApi { sting: self });
    }

    // -----------------------------------------------------------------------
    // Lifecycle helpers
    // -----------------------------------------------------------------------

    /// Run `f` when the component whose factory is running unmounts.
    ///
    /// Outside a factory this is an error in debug builds; release builds
    /// drop `f`.
    pub fn on_cleanup(&self, f: impl FnOnce() + 'static) -> Result<(), StingError> {
        match self.inner.setup.current() {
            Some(list) => {
                list.push(f);
                Ok(())
            }
            None => {
                crate::dev_ensure!(false, StingError::CleanupOutsideMount);
                Ok(())
            }
        }
    }

    /// `set_interval` cancelled when the current component unmounts.
    pub fn set_interval_safe(
        &self,
        f: impl FnMut() + 'static,
        every_ms: u64,
    ) -> Result<TimerId, StingError> {
        let current = self.inner.setup.current();
        crate::dev_ensure!(current.is_some(), StingError::CleanupOutsideMount);
        let id = self.document().set_interval(f, every_ms);
        self.cancel_on_cleanup(current, id);
        Ok(id)
    }

    /// `set_timeout` cancelled when the current component unmounts.
    pub fn set_timeout_safe(
        &self,
        f: impl FnOnce() + 'static,
        delay_ms: u64,
    ) -> Result<TimerId, StingError> {
        let current = self.inner.setup.current();
        crate::dev_ensure!(current.is_some(), StingError::CleanupOutsideMount);
        let id = self.document().set_timeout(f, delay_ms);
        self.cancel_on_cleanup(current, id);
        Ok(id)
    }

    fn cancel_on_cleanup(&self, list: Option<DisposerList>, id: TimerId) {
        if let Some(list) = list {
            let doc = self.document().downgrade();
            list.push(move || {
                if let Some(doc) = doc.upgrade() {
                    doc.clear_timer(id);
                }
            });
        }
    }

    // -----------------------------------------------------------------------
    // Reactive primitives
    //
    // Effects and computeds created while a factory runs are disposed with
    // that component.
    // -----------------------------------------------------------------------

    pub fn create_signal<T: 'static>(&self, initial: T) -> (ReadSignal<T>, WriteSignal<T>) {
        self.inner.reactor.create_signal(initial)
    }

    pub fn create_effect<R: IntoCleanup>(&self, f: impl FnMut() -> R + 'static) -> Dispose {
        let dispose = self.inner.reactor.create_effect(f);
        if let Some(list) = self.inner.setup.current() {
            list.push_effect(dispose.clone());
        }
        dispose
    }

    pub fn create_computed<T: PartialEq + 'static>(
        &self,
        f: impl FnMut() -> T + 'static,
    ) -> Computed<T> {
        let computed = self.inner.reactor.create_computed(f);
        if let Some(list) = self.inner.setup.current() {
            let handle = computed.clone();
            list.push(move || handle.dispose());
        }
        computed
    }

    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.reactor.batch(f)
    }

    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.reactor.untrack(f)
    }

    pub fn create_store(&self, initial: Value) -> (StoreView, SetStore) {
        self.inner.reactor.create_store(initial)
    }

    /// See [`store::produce`].
    pub fn produce(mutator: impl FnOnce(&mut Value)) -> impl FnOnce(&Value) -> Value {
        store::produce(mutator)
    }
}

// ---------------------------------------------------------------------------
// Extension handles
// ---------------------------------------------------------------------------

/// Removes a binder registered with [`Sting::register_directive`].
#[derive(Clone)]
pub struct Unregister {
    sting: WeakSting,
    id: DirectiveId,
}

impl fmt::Debug for Unregister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Unregister").field(&self.id).finish()
    }
}

impl Unregister {
    /// Returns `false` if the binder was already removed.
    pub fn unregister(&self) -> bool {
        self.sting
            .upgrade()
            .is_some_and(|s| s.inner.directives.borrow_mut().unregister(self.id))
    }
}

/// What a plugin may do.
pub struct PluginApi<'a> {
    sting: &'a Sting,
}

impl PluginApi<'_> {
    pub fn register_directive(
        &self,
        binder: impl Fn(&BinderContext<'_>) -> Result<(), StingError> + 'static,
    ) -> Unregister {
        self.sting.register_directive(binder)
    }

    pub fn sting(&self) -> &Sting {
        self.sting
    }
}
