//! `<template x-for="item in list">` / `<template x-for="(item, index) in list">`.
//!
//! Every change rebuilds the whole list: the previous instances are
//! disposed and discarded, then one instance per current item is inserted
//! after the template, in order, each hydrated with a child scope binding
//! the item (and index).

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::dom::NodeId;
use crate::error::StingError;
use crate::expr::ForExpr;
use crate::scope::get_path;

use super::{instantiate, remove_all, template_content, BinderContext};

pub(crate) fn bind(ctx: &BinderContext<'_>) -> Result<(), StingError> {
    let Some(expr) = ctx.attr("x-for") else {
        return Ok(());
    };
    let Some(content) = template_content(ctx, "x-for") else {
        return Ok(());
    };
    let parsed = match ForExpr::parse(&expr) {
        Ok(parsed) => parsed,
        Err(err) => {
            crate::dev_warn!("x-for: malformed expression {expr:?}: {err}");
            return Ok(());
        }
    };

    let anchor = ctx.el();
    let inserted: Rc<RefCell<Vec<NodeId>>> = Rc::default();
    {
        let inserted = inserted.clone();
        let sting = ctx.sting().downgrade();
        ctx.disposers().push(move || remove_all(&sting, &inserted));
    }
    let children = ctx.disposers().nested();

    let scope = ctx.scope().clone();
    let weak = ctx.sting().downgrade();
    ctx.effect(move || {
        let items = entries(get_path(&scope, &parsed.list));
        let Some(sting) = weak.upgrade() else {
            return;
        };
        sting.reactor().untrack(|| {
            children.dispose_all();
            remove_all(&weak, &inserted);
            let doc = sting.document();

            let (parent, reference) = {
                let dom = doc.dom();
                (dom.parent(anchor), dom.next_sibling(anchor))
            };
            let Some(parent) = parent else {
                return;
            };
            for (item, index) in items {
                let frame = scope.child().with(parsed.item.as_str(), item);
                if let Some(name) = &parsed.index {
                    frame.insert(name.as_str(), index);
                }
                let nodes = instantiate(&mut doc.dom_mut(), content, parent, reference);
                inserted.borrow_mut().extend(nodes.iter().copied());
                for node in nodes {
                    if let Err(err) = sting.hydrate(node, &frame, &children) {
                        tracing::error!(target: "sting", "x-for {expr}: {err}");
                    }
                }
            }
        });
    });
    Ok(())
}

/// `(item, index)` pairs: array elements with their position, object
/// values with their key, or `1..=n` for a number.
fn entries(list: Value) -> Vec<(Value, Value)> {
    match list {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (item, Value::from(i)))
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, item)| (item, Value::String(key)))
            .collect(),
        Value::Number(n) => {
            let count = n.as_u64().unwrap_or(0);
            (0..count)
                .map(|i| (Value::from(i + 1), Value::from(i)))
                .collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn entries_of_each_shape() {
        assert_eq!(
            entries(json!(["a", "b"])),
            vec![(json!("a"), json!(0)), (json!("b"), json!(1))]
        );
        assert_eq!(
            entries(json!({"x": 1, "y": 2})),
            vec![(json!(1), json!("x")), (json!(2), json!("y"))]
        );
        assert_eq!(entries(json!(2)), vec![(json!(1), json!(0)), (json!(2), json!(1))]);
        assert!(entries(Value::Null).is_empty());
        assert!(entries(json!("abc")).is_empty());
    }
}
