//! `x-text="path"`: keep the element's text content equal to the value.

use crate::error::StingError;
use crate::scope::{display, get_path};

use super::BinderContext;

pub(crate) fn bind(ctx: &BinderContext<'_>) -> Result<(), StingError> {
    let Some(expr) = ctx.attr("x-text") else {
        return Ok(());
    };
    let Some(path) = ctx.safe_path("x-text", &expr)? else {
        return Ok(());
    };
    let el = ctx.el();
    let scope = ctx.scope().clone();
    let doc = ctx.weak_document();
    ctx.effect(move || {
        let text = display(&get_path(&scope, &path));
        let Some(doc) = doc.upgrade() else {
            return;
        };
        let mut dom = doc.dom_mut();
        if dom.text_content(el) != text {
            dom.set_text_content(el, &text);
        }
    });
    Ok(())
}
