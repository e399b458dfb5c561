//! Component factories and directive binders, keyed for lookup and removal.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::app::Sting;
use crate::directive::Binder;
use crate::scope::Scope;

/// Builds a component's scope. Runs once per mount.
pub type Factory = Rc<dyn Fn(&Sting) -> Scope>;

/// Name → factory. Re-registering a name replaces the factory.
#[derive(Default)]
pub(crate) struct ComponentRegistry {
    factories: IndexMap<String, Factory>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

impl ComponentRegistry {
    /// Returns `true` if an earlier factory was replaced.
    pub(crate) fn register(&mut self, name: &str, factory: Factory) -> bool {
        self.factories.insert(name.to_owned(), factory).is_some()
    }

    pub(crate) fn get(&self, name: &str) -> Option<Factory> {
        self.factories.get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

/// Handle of a registered binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectiveId(u64);

/// Binders in registration order.
#[derive(Default)]
pub(crate) struct DirectiveRegistry {
    binders: IndexMap<DirectiveId, (String, Binder)>,
    next: u64,
}

impl fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.binders.values().map(|(name, _)| name))
            .finish()
    }
}

impl DirectiveRegistry {
    pub(crate) fn register(&mut self, name: &str, binder: Binder) -> DirectiveId {
        let id = DirectiveId(self.next);
        self.next += 1;
        self.binders.insert(id, (name.to_owned(), binder));
        id
    }

    pub(crate) fn unregister(&mut self, id: DirectiveId) -> bool {
        self.binders.shift_remove(&id).is_some()
    }

    /// Snapshot of the binders, so hydration never holds the registry.
    pub(crate) fn binders(&self) -> Vec<(String, Binder)> {
        self.binders.values().cloned().collect()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.binders.values().map(|(name, _)| name.clone()).collect()
    }
}
