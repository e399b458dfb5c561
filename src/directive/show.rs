//! `x-show="path"`: toggle `display: none`, restoring the element's own
//! inline display when the value turns truthy.

use crate::error::StingError;
use crate::scope::{get_path, truthy};

use super::BinderContext;

pub(crate) fn bind(ctx: &BinderContext<'_>) -> Result<(), StingError> {
    let Some(expr) = ctx.attr("x-show") else {
        return Ok(());
    };
    let Some(path) = ctx.safe_path("x-show", &expr)? else {
        return Ok(());
    };
    let el = ctx.el();
    let original = ctx
        .document()
        .dom()
        .style_property(el, "display")
        .filter(|d| d != "none");
    let scope = ctx.scope().clone();
    let doc = ctx.weak_document();
    ctx.effect(move || {
        let visible = truthy(&get_path(&scope, &path));
        let Some(doc) = doc.upgrade() else {
            return;
        };
        let display = if visible { original.as_deref() } else { Some("none") };
        let mut dom = doc.dom_mut();
        if dom.style_property(el, "display").as_deref() != display {
            dom.set_style_property(el, "display", display);
        }
    });
    Ok(())
}
