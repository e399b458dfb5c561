//! `x-debug="path"`: development readout of a signal's value and observer
//! count. Only registered when enabled in the config of a debug build.

use crate::error::StingError;
use crate::expr::SafePath;
use crate::scope::{display, get_path, lookup_binding, Binding, Scope};

use super::BinderContext;

pub(crate) fn bind(ctx: &BinderContext<'_>) -> Result<(), StingError> {
    let Some(expr) = ctx.attr("x-debug") else {
        return Ok(());
    };
    let Some(path) = ctx.safe_path("x-debug", &expr)? else {
        return Ok(());
    };
    let el = ctx.el();
    let scope = ctx.scope().clone();
    let doc = ctx.weak_document();
    ctx.effect(move || {
        let text = match signal_behind(&scope, &path) {
            Some((target, binding)) => {
                let value = display(&get_path(&scope, &target));
                let observers = binding.observer_count().unwrap_or(0);
                format!("debug({expr}): value={value} observers={observers}")
            }
            None => format!("debug({expr}): not a signal getter"),
        };
        if let Some(doc) = doc.upgrade() {
            doc.dom_mut().set_text_content(el, &text);
        }
    });
    Ok(())
}

/// The signal-backed binding at `path`, or failing that at `$path`.
fn signal_behind(scope: &Scope, path: &SafePath) -> Option<(SafePath, Binding)> {
    let found = |p: SafePath| {
        lookup_binding(scope, &p)
            .filter(|b| b.observer_count().is_some())
            .map(|b| (p, b))
    };
    found(path.clone()).or_else(|| {
        SafePath::parse(&format!("${path}"))
            .ok()
            .and_then(|p| found(p))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Reactor;
    use serde_json::json;

    #[test]
    fn falls_back_to_dollar_prefixed_signal() {
        let rx = Reactor::new();
        let scope = Scope::new()
            .with("$count", rx.create_signal(json!(1)))
            .with("plain", json!(2));
        let count = SafePath::parse("count").expect("valid");
        let plain = SafePath::parse("plain").expect("valid");
        let (target, _) = signal_behind(&scope, &count).expect("found");
        assert_eq!(target.to_string(), "$count");
        assert!(signal_behind(&scope, &plain).is_none());
    }
}
