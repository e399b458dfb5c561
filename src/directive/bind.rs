//! `x-bind:<attr>="path"`: mirror a value into an attribute or property.

use serde_json::Value;

use crate::dom::{Dom, NodeId};
use crate::error::StingError;
use crate::scope::{display, get_path, truthy};

use super::BinderContext;

const PREFIX: &str = "x-bind:";

/// Attributes whose presence is the value.
const BOOLEAN_ATTRS: [&str; 5] = ["disabled", "checked", "selected", "readonly", "required"];

pub(crate) fn bind(ctx: &BinderContext<'_>) -> Result<(), StingError> {
    for (name, expr) in ctx.attrs_with_prefix(PREFIX) {
        if name.is_empty() || expr.trim().is_empty() {
            crate::dev_warn!("x-bind needs an attribute name and an expression, got {PREFIX}{name}={expr:?}");
            continue;
        }
        let Some(path) = ctx.safe_path(&format!("{PREFIX}{name}"), &expr)? else {
            continue;
        };
        let el = ctx.el();
        let scope = ctx.scope().clone();
        let doc = ctx.weak_document();
        ctx.effect(move || {
            let value = get_path(&scope, &path);
            if let Some(doc) = doc.upgrade() {
                apply(&mut doc.dom_mut(), el, &name, &value);
            }
        });
    }
    Ok(())
}

/// Write `value` into attribute `name` of `el`.
pub fn apply(dom: &mut Dom, el: NodeId, name: &str, value: &Value) {
    let is_form_control = dom
        .get(el)
        .is_some_and(|d| matches!(d.tag.as_str(), "input" | "textarea" | "select"));

    if BOOLEAN_ATTRS.contains(&name) {
        let on = truthy(value);
        if on {
            dom.set_attr(el, name, "");
        } else {
            dom.remove_attr(el, name);
        }
        if name == "checked" {
            dom.set_checked(el, on);
        }
        return;
    }

    match name {
        "value" if is_form_control => {
            dom.set_form_value(el, &display(value));
        }
        "class" => match class_list(value) {
            Some(class) => dom.set_attr(el, "class", &class),
            None => dom.remove_attr(el, "class"),
        },
        "style" => match style_text(value) {
            Some(style) => dom.set_attr(el, "style", &style),
            None => dom.remove_attr(el, "style"),
        },
        _ => match value {
            Value::Null | Value::Bool(false) => dom.remove_attr(el, name),
            other => dom.set_attr(el, name, &display(other)),
        },
    }
}

/// Strings as given, arrays space-joined, objects by their truthy keys.
fn class_list(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(display)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Value::Object(map) => Some(
            map.iter()
                .filter(|(_, on)| truthy(on))
                .map(|(k, _)| k.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        other => Some(display(other)),
    }
}

/// Strings as given; objects as `k: v;` pairs, skipping null and false.
fn style_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Object(map) => {
            let text = map
                .iter()
                .filter(|(_, v)| !matches!(v, Value::Null | Value::Bool(false)))
                .map(|(k, v)| format!("{k}: {};", display(v)))
                .collect::<Vec<_>>()
                .join(" ");
            (!text.is_empty()).then_some(text)
        }
        other => Some(display(other)),
    }
}
