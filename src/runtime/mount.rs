//! Start, stop, mount, unmount, and the binding pass.
//!
//! A component root is an element carrying `x-data="<name>"`. Mounting runs
//! the registered factory with the root's disposer list current, then walks
//! the root's subtree and hands every element to every binder. Nested roots
//! are skipped by the walk; they mount on their own, either from `start` or
//! from the mutation observer once a directive inserts them.

use crate::app::{Mount, Sting};
use crate::directive::BinderContext;
use crate::dom::{MutationRecord, NodeId};
use crate::error::{isolate, StingError};
use crate::runtime::lifecycle::DisposerList;
use crate::scope::Scope;

impl Sting {
    /// Mount every component root under `root` (the body by default), in
    /// document order, and begin observing mutations if configured.
    ///
    /// Calling `start` on a started runtime does nothing.
    pub fn start(&self, root: Option<NodeId>) -> Result<(), StingError> {
        if self.is_started() {
            return Ok(());
        }
        let root = root.unwrap_or_else(|| self.document().body());
        self.inner.root.set(Some(root));
        self.inner.start_queued.set(true);

        if self.inner.config.observe_mutations {
            let weak = self.downgrade();
            let id = self.document().observe(root, move |records| {
                if let Some(sting) = weak.upgrade() {
                    sting.on_mutations(records);
                }
            });
            self.inner.observation.set(Some(id));
        }

        let roots = self.document().dom().query_by_attr(root, "x-data");
        tracing::debug!(target: "sting", candidates = roots.len(), "starting");
        for el in roots {
            self.mount_component(el)?;
        }
        Ok(())
    }

    /// Free discarded nodes now unless the mutation observer will, after it
    /// has seen their removal records.
    pub(crate) fn release_discarded(&self) {
        if self.inner.observation.get().is_none() {
            let freed = self.document().dom_mut().collect_garbage();
            tracing::trace!(target: "sting", freed, "released discarded nodes");
        }
    }

    /// Stop observing and unmount every component, most recent first.
    pub fn stop(&self) {
        if let Some(id) = self.inner.observation.take() {
            self.document().disconnect(id);
        }
        let mounted = self.inner.lifecycle.borrow().mounted_roots();
        for el in mounted.into_iter().rev() {
            self.unmount_component(el);
        }
        self.inner.root.set(None);
        self.inner.start_queued.set(false);
        self.document().dom_mut().collect_garbage();
        tracing::debug!(target: "sting", "stopped");
    }

    /// Mount the component rooted at `el`.
    ///
    /// Returns `Ok(false)` if `el` is already mounted or no factory is
    /// registered under its name. A factory that panics leaves `el`
    /// unmounted.
    pub fn mount_component(&self, el: NodeId) -> Result<bool, StingError> {
        if self.is_mounted(el) {
            return Ok(false);
        }
        let name = self
            .document()
            .dom()
            .attr(el, "x-data")
            .map(|n| n.trim().to_owned());
        let Some(name) = name else {
            crate::dev_ensure!(false, StingError::MissingComponentName);
            return Ok(false);
        };
        crate::dev_ensure!(!name.is_empty(), StingError::EmptyComponentName);
        if name.is_empty() {
            return Ok(false);
        }
        let factory = self.inner.components.borrow().get(&name);
        let Some(factory) = factory else {
            crate::dev_warn!("no component registered as {name:?}");
            return Ok(false);
        };

        let disposers = DisposerList::new();
        let scope = {
            let _setup = self.inner.setup.enter(disposers.clone());
            isolate(&format!("component {name:?} factory"), || factory(self))
        };
        let Some(scope) = scope else {
            disposers.dispose_all();
            return Ok(false);
        };
        if let Err(err) = self.bind_subtree(el, &scope, &disposers, true) {
            disposers.dispose_all();
            return Err(err);
        }

        self.inner.mounts.borrow_mut().insert(
            el,
            Mount {
                name: name.clone(),
                scope,
                disposers,
            },
        );
        self.inner.lifecycle.borrow_mut().on_mount(el, &name);
        tracing::debug!(target: "sting", component = %name, "mounted");
        Ok(true)
    }

    /// Tear down the component at `el`. Returns `false` if it was not
    /// mounted.
    pub fn unmount_component(&self, el: NodeId) -> bool {
        let mount = self.inner.mounts.borrow_mut().remove(el);
        let Some(mount) = mount else {
            return false;
        };
        mount.disposers.dispose_all();
        self.inner.lifecycle.borrow_mut().on_unmount(el, &mount.name);
        tracing::debug!(target: "sting", component = %mount.name, "unmounted");
        true
    }

    /// Bind a subtree a directive inserted. Component roots inside it are
    /// skipped.
    pub(crate) fn hydrate(
        &self,
        root: NodeId,
        scope: &Scope,
        disposers: &DisposerList,
    ) -> Result<(), StingError> {
        self.bind_subtree(root, scope, disposers, false)
    }

    fn bind_subtree(
        &self,
        root: NodeId,
        scope: &Scope,
        disposers: &DisposerList,
        is_component_root: bool,
    ) -> Result<(), StingError> {
        // Snapshot first: binders insert nodes (x-if, x-for) that hydrate
        // themselves.
        let elements = {
            let dom = self.document().dom();
            let mut out = Vec::new();
            let mut stack = vec![root];
            while let Some(node) = stack.pop() {
                let Some(data) = dom.get(node) else {
                    continue;
                };
                if data.is_element() {
                    let own_root = is_component_root && node == root;
                    if data.has_attr("x-data") && !own_root {
                        continue;
                    }
                    out.push(node);
                }
                stack.extend(dom.children(node).iter().rev().copied());
            }
            out
        };

        let binders = self.inner.directives.borrow().binders();
        for el in elements {
            if !self.document().dom().exists(el) {
                continue;
            }
            let ctx = BinderContext {
                sting: self,
                el,
                scope,
                disposers,
            };
            for (name, binder) in &binders {
                if let Some(Err(err)) = isolate(name, || binder(&ctx)) {
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Mount unmounted roots naming `name`, after a late registration.
    pub(crate) fn mount_pending(&self, name: &str) {
        let Some(root) = self.inner.root.get() else {
            return;
        };
        let pending = self
            .document()
            .dom()
            .query_all(root, |data| data.attr("x-data").map(str::trim) == Some(name));
        for el in pending {
            if let Err(err) = self.mount_component(el) {
                tracing::error!(target: "sting", "mounting {name:?}: {err}");
            }
        }
    }

    /// Unmount roots that left the tree, then mount roots that entered it.
    fn on_mutations(&self, records: Vec<MutationRecord>) {
        let Some(root) = self.inner.root.get() else {
            return;
        };
        let removed: Vec<NodeId> = records.iter().flat_map(|r| r.removed.iter().copied()).collect();
        let added: Vec<NodeId> = records.iter().flat_map(|r| r.added.iter().copied()).collect();

        if !removed.is_empty() {
            let mounted = self.inner.lifecycle.borrow().mounted_roots();
            let gone: Vec<NodeId> = {
                let dom = self.document().dom();
                mounted
                    .into_iter()
                    .filter(|&m| {
                        !dom.is_connected(m)
                            && (!dom.exists(m)
                                || removed.iter().any(|&r| r == m || dom.contains(r, m)))
                    })
                    .collect()
            };
            for el in gone.into_iter().rev() {
                self.unmount_component(el);
            }
        }

        for node in added {
            let candidates = {
                let dom = self.document().dom();
                if !dom.exists(node) || !dom.is_connected(node) || !dom.contains(root, node) {
                    continue;
                }
                dom.query_by_attr(node, "x-data")
            };
            for el in candidates {
                if self.is_mounted(el) {
                    continue;
                }
                if let Err(err) = self.mount_component(el) {
                    tracing::error!(target: "sting", "mounting inserted component: {err}");
                }
            }
        }

        self.document().dom_mut().collect_garbage();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::StingConfig;
    use crate::runtime::lifecycle::LifecycleEvent;
    use crate::scope::Handler;
    use std::cell::Cell;
    use std::rc::Rc;

    fn manual(html: &str) -> Sting {
        let sting = Sting::with_config(StingConfig::new().with_auto_start(false));
        sting
            .document()
            .dom_mut()
            .append_html(sting.document().body(), html)
            .expect("valid html");
        sting
    }

    fn by_id(sting: &Sting, id: &str) -> NodeId {
        sting.document().dom().get_element_by_id(id).expect("element")
    }

    #[test]
    fn mount_and_unmount_are_idempotent() {
        let sting = manual(r#"<div id="c" x-data="c"></div>"#);
        sting.register_component("c", |_| Scope::new()).expect("valid");
        let el = by_id(&sting, "c");
        assert!(sting.mount_component(el).expect("mounts"));
        assert!(!sting.mount_component(el).expect("no-op"));
        assert!(sting.unmount_component(el));
        assert!(!sting.unmount_component(el));
        assert_eq!(
            sting.lifecycle_events(),
            vec![
                LifecycleEvent::Mount { root: el, name: "c".into() },
                LifecycleEvent::Unmount { root: el, name: "c".into() },
            ]
        );
    }

    #[test]
    fn unknown_component_stays_unmounted_until_registered() {
        let sting = manual(r#"<div id="c" x-data="late"></div>"#);
        sting.start(None).expect("starts");
        let el = by_id(&sting, "c");
        assert!(!sting.is_mounted(el));
        sting.register_component("late", |_| Scope::new()).expect("valid");
        assert!(sting.is_mounted(el));
    }

    #[test]
    fn panicking_factory_leaves_root_unmounted() {
        let sting = manual(r#"<div id="c" x-data="bad"></div>"#);
        sting
            .register_component("bad", |_| panic!("factory failed"))
            .expect("valid");
        let el = by_id(&sting, "c");
        assert!(!sting.mount_component(el).expect("isolated"));
        assert!(!sting.is_mounted(el));
    }

    #[test]
    fn factory_cleanups_run_on_unmount() {
        let sting = manual(r#"<div id="c" x-data="c"></div>"#);
        let cleaned = Rc::new(Cell::new(0));
        let flag = cleaned.clone();
        sting
            .register_component("c", move |s| {
                let flag = flag.clone();
                s.on_cleanup(move || flag.set(flag.get() + 1)).expect("inside setup");
                Scope::new()
            })
            .expect("valid");
        let el = by_id(&sting, "c");
        sting.mount_component(el).expect("mounts");
        sting.unmount_component(el);
        sting.unmount_component(el);
        assert_eq!(cleaned.get(), 1);
    }

    #[test]
    fn nested_roots_are_not_bound_by_the_parent() {
        let sting = manual(
            r#"<div id="outer" x-data="outer">
                 <span id="own" x-text="label"></span>
                 <div id="inner" x-data="inner"><span id="theirs" x-text="label"></span></div>
               </div>"#,
        );
        sting
            .register_component("outer", |_| Scope::new().with("label", serde_json::json!("outer")))
            .expect("valid");
        sting
            .register_component("inner", |_| Scope::new().with("label", serde_json::json!("inner")))
            .expect("valid");
        sting.start(None).expect("starts");
        let dom = sting.document().dom();
        assert_eq!(dom.text_content(by_id(&sting, "own")), "outer");
        assert_eq!(dom.text_content(by_id(&sting, "theirs")), "inner");
    }

    #[test]
    fn removed_roots_unmount_and_inserted_roots_mount() {
        let sting = manual(r#"<div id="host"></div>"#);
        sting.register_component("c", |_| Scope::new()).expect("valid");
        sting.start(None).expect("starts");
        let host = by_id(&sting, "host");

        sting
            .document()
            .dom_mut()
            .append_html(host, r#"<section><div id="c" x-data="c"></div></section>"#)
            .expect("valid html");
        sting.document().tick();
        let el = by_id(&sting, "c");
        assert!(sting.is_mounted(el));

        sting.document().dom_mut().clear_children(host);
        sting.document().tick();
        assert!(!sting.is_mounted(el));
    }

    #[test]
    fn stop_unmounts_in_reverse_order() {
        let sting = manual(r#"<div id="a" x-data="c"></div><div id="b" x-data="c"></div>"#);
        sting
            .register_component("c", |_| Scope::new().with("noop", Handler::new(|_| {})))
            .expect("valid");
        sting.start(None).expect("starts");
        let (a, b) = (by_id(&sting, "a"), by_id(&sting, "b"));
        sting.lifecycle_events();
        sting.stop();
        assert!(!sting.is_started());
        assert_eq!(
            sting.lifecycle_events(),
            vec![
                LifecycleEvent::Unmount { root: b, name: "c".into() },
                LifecycleEvent::Unmount { root: a, name: "c".into() },
            ]
        );
    }

    #[cfg(debug_assertions)]
    #[test]
    fn invalid_path_fails_the_mount() {
        let sting = manual(r#"<div id="c" x-data="c"><span x-text="a + b"></span></div>"#);
        sting.register_component("c", |_| Scope::new()).expect("valid");
        let el = by_id(&sting, "c");
        assert!(matches!(
            sting.mount_component(el),
            Err(StingError::InvalidPath { .. })
        ));
        assert!(!sting.is_mounted(el));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn mounting_a_plain_element_is_an_error() {
        let sting = manual(r#"<div id="plain"></div>"#);
        let el = by_id(&sting, "plain");
        assert!(matches!(
            sting.mount_component(el),
            Err(StingError::MissingComponentName)
        ));
    }
}
