//! `x-effect="handler"`: run a handler inside an effect, with the element as
//! its argument. Whatever the handler reads is tracked; a cleanup it returns
//! runs before the next run and on dispose.

use crate::error::{isolate, StingError};
use crate::scope::{resolve_handler, Arg};

use super::BinderContext;

pub(crate) fn bind(ctx: &BinderContext<'_>) -> Result<(), StingError> {
    let Some(expr) = ctx.attr("x-effect") else {
        return Ok(());
    };
    let Some(path) = ctx.safe_path("x-effect", &expr)? else {
        return Ok(());
    };
    let Some(handler) = resolve_handler(ctx.scope(), &path) else {
        crate::dev_warn!("x-effect: {path} is not a handler");
        return Ok(());
    };
    let el = ctx.el();
    ctx.effect(move || isolate("x-effect", || handler.call(&[Arg::Element(el)])).flatten());
    Ok(())
}
