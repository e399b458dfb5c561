//! `x-model="path"`: two-way binding for form controls.
//!
//! The effect mirrors scope state into the control, writing only when the
//! rendered value differs; the listener writes the control back into the
//! scope. A write from the listener re-runs the effect, which then finds the
//! control already up to date, so the pair settles in one pass.

use serde_json::Value;

use crate::error::StingError;
use crate::scope::{display, get_path, loose_eq, set_path, truthy};

use super::BinderContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Checkbox,
    Radio,
    Select,
    Number,
    Text,
}

pub(crate) fn bind(ctx: &BinderContext<'_>) -> Result<(), StingError> {
    let Some(expr) = ctx.attr("x-model") else {
        return Ok(());
    };
    let tag = ctx.tag();
    let control = match tag.as_str() {
        "select" => Control::Select,
        "textarea" => Control::Text,
        "input" => match ctx.attr("type").map(|t| t.to_ascii_lowercase()).as_deref() {
            Some("checkbox") => Control::Checkbox,
            Some("radio") => Control::Radio,
            Some("number" | "range") => Control::Number,
            _ => Control::Text,
        },
        other => {
            crate::dev_warn!("x-model is only supported on input, textarea and select, not <{other}>");
            return Ok(());
        }
    };
    let Some(path) = ctx.safe_path("x-model", &expr)? else {
        return Ok(());
    };

    let el = ctx.el();
    let scope = ctx.scope().clone();
    let doc = ctx.weak_document();
    {
        let path = path.clone();
        let scope = scope.clone();
        let doc = doc.clone();
        ctx.effect(move || {
            let value = get_path(&scope, &path);
            let Some(doc) = doc.upgrade() else {
                return;
            };
            let mut dom = doc.dom_mut();
            match control {
                Control::Checkbox => {
                    dom.set_checked(el, truthy(&value));
                }
                Control::Radio => {
                    let own = dom.form_value(el);
                    dom.set_checked(el, loose_eq(&value, &own));
                }
                // "1." and "2.50" parse to the value already held; rewriting
                // the control would eat what is being typed.
                Control::Number => {
                    if number_or_string(dom.form_value(el)) != value {
                        dom.set_form_value(el, &display(&value));
                    }
                }
                Control::Select | Control::Text => {
                    dom.set_form_value(el, &display(&value));
                }
            }
        });
    }

    let event = match control {
        Control::Text | Control::Number => "input",
        Control::Checkbox | Control::Radio | Control::Select => "change",
    };
    ctx.listen(event, move |_| {
        let Some(doc) = doc.upgrade() else {
            return;
        };
        let next = {
            let dom = doc.dom();
            match control {
                Control::Checkbox => Some(Value::Bool(dom.is_checked(el))),
                Control::Radio => dom
                    .is_checked(el)
                    .then(|| Value::String(dom.form_value(el))),
                Control::Number => Some(number_or_string(dom.form_value(el))),
                Control::Select | Control::Text => Some(Value::String(dom.form_value(el))),
            }
        };
        if let Some(next) = next {
            let _ = set_path(&scope, &path, next);
        }
    });
    Ok(())
}

fn number_or_string(raw: String) -> Value {
    if let Ok(i) = raw.trim().parse::<i64>() {
        return Value::from(i);
    }
    match raw.trim().parse::<f64>() {
        Ok(f) if f.is_finite() => Value::from(f),
        _ => Value::String(raw),
    }
}
