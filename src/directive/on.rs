//! `x-on:<event>="handler"` / `x-on:<event>="handler(arg, ...)"`.
//!
//! The expression is parsed once at bind time. Arguments are evaluated when
//! the event fires: literals as written, `$event` as the event, paths
//! against the scope (untracked). Without parentheses the handler receives
//! the event.

use crate::error::{isolate, StingError};
use crate::expr::{CallArg, CallExpr};
use crate::scope::{get_path, resolve_handler, Arg};

use super::BinderContext;

const PREFIX: &str = "x-on:";

pub(crate) fn bind(ctx: &BinderContext<'_>) -> Result<(), StingError> {
    for (event, expr) in ctx.attrs_with_prefix(PREFIX) {
        if event.is_empty() {
            crate::dev_warn!("x-on needs an event name, got {PREFIX}={expr:?}");
            continue;
        }
        let call = match CallExpr::parse(&expr) {
            Ok(call) => call,
            Err(err) => {
                crate::dev_ensure!(
                    false,
                    StingError::MalformedExpression {
                        directive: format!("{PREFIX}{event}"),
                        expr: expr.clone(),
                        reason: err.to_string(),
                    }
                );
                continue;
            }
        };

        let el = ctx.el();
        let key = format!("{event}::{expr}");
        let fresh = ctx
            .document()
            .dom_mut()
            .get_mut(el)
            .is_some_and(|data| data.mark_bound(key.clone()));
        if !fresh {
            tracing::trace!(target: "sting", "{key} already bound");
            continue;
        }

        let scope = ctx.scope().clone();
        let reactor = ctx.reactor().clone();
        ctx.listen(&event, move |e| {
            let Some(handler) = resolve_handler(&scope, &call.callee) else {
                crate::dev_warn!("x-on: no handler named {}", call.callee);
                return;
            };
            let args: Vec<Arg> = match &call.args {
                None => vec![Arg::Event(e.clone())],
                Some(args) => reactor.untrack(|| {
                    args.iter()
                        .map(|arg| match arg {
                            CallArg::Literal(v) => Arg::Value(v.clone()),
                            CallArg::Event => Arg::Event(e.clone()),
                            CallArg::Path(p) => Arg::Value(get_path(&scope, p)),
                        })
                        .collect()
                }),
            };
            isolate("x-on handler", || handler.call(&args));
        });

        let doc = ctx.weak_document();
        ctx.disposers().push(move || {
            if let Some(doc) = doc.upgrade() {
                if let Some(data) = doc.dom_mut().get_mut(el) {
                    data.unmark_bound(&key);
                }
            }
        });
    }
    Ok(())
}
