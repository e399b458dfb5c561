//! `<template x-if="path">`: render the template's content after the
//! template while the value is truthy.
//!
//! Entering the present state clones the content, inserts it after the
//! anchor, and hydrates it into a nested disposer list. Leaving it disposes
//! that list and discards the inserted nodes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::dom::NodeId;
use crate::error::StingError;
use crate::scope::{get_path, truthy};

use super::{instantiate, remove_all, template_content, BinderContext};

pub(crate) fn bind(ctx: &BinderContext<'_>) -> Result<(), StingError> {
    let Some(expr) = ctx.attr("x-if") else {
        return Ok(());
    };
    let Some(content) = template_content(ctx, "x-if") else {
        return Ok(());
    };
    let Some(path) = ctx.safe_path("x-if", &expr)? else {
        return Ok(());
    };

    let anchor = ctx.el();
    let inserted: Rc<RefCell<Vec<NodeId>>> = Rc::default();
    {
        let inserted = inserted.clone();
        let sting = ctx.sting().downgrade();
        ctx.disposers().push(move || remove_all(&sting, &inserted));
    }
    let children = ctx.disposers().nested();

    let present = Cell::new(false);
    let scope = ctx.scope().clone();
    let weak = ctx.sting().downgrade();
    ctx.effect(move || {
        let show = truthy(&get_path(&scope, &path));
        if show == present.get() {
            return;
        }
        let Some(sting) = weak.upgrade() else {
            return;
        };
        if !show {
            present.set(false);
            children.dispose_all();
            remove_all(&weak, &inserted);
            tracing::trace!(target: "sting", "x-if {expr}: removed");
            return;
        }
        sting.reactor().untrack(|| {
            let nodes = {
                let mut dom = sting.document().dom_mut();
                let Some(parent) = dom.parent(anchor) else {
                    crate::dev_warn!("x-if {expr}: template has no parent; nothing inserted");
                    return;
                };
                let reference = dom.next_sibling(anchor);
                instantiate(&mut dom, content, parent, reference)
            };
            present.set(true);
            inserted.borrow_mut().extend(nodes.iter().copied());
            for node in nodes {
                if let Err(err) = sting.hydrate(node, &scope, &children) {
                    tracing::error!(target: "sting", "x-if {expr}: {err}");
                }
            }
            tracing::trace!(target: "sting", "x-if {expr}: inserted");
        });
    });
    Ok(())
}
