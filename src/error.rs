//! Error types and the development-mode gate.
//!
//! Three tiers of misuse are distinguished:
//!
//! - **Development-fatal**: invalid path expressions, malformed directive
//!   expressions, cleanup registration outside a mount. Surfaced as
//!   [`StingError`] through [`dev_ensure!`](crate::dev_ensure), which only
//!   exists in `debug_assertions` builds. Release builds tolerate them.
//! - **Recoverable**: unknown component names, a directive on the wrong tag,
//!   unreachable two-way writes. Logged with [`dev_warn!`](crate::dev_warn)
//!   and skipped.
//! - **User callback failures**: panics in handlers, effect cleanups, and
//!   disposers. Caught by [`isolate`] and logged, never propagated.

use std::panic::{self, AssertUnwindSafe};

use crate::dom::parse::ParseError;
use crate::scope::path::PathError;

/// Crate-level error.
#[derive(Debug, thiserror::Error)]
pub enum StingError {
    #[error("invalid path expression {expr:?} in {directive}")]
    InvalidPath { directive: String, expr: String },
    #[error("malformed {directive} expression {expr:?}: {reason}")]
    MalformedExpression {
        directive: String,
        expr: String,
        reason: String,
    },
    #[error("on_cleanup() called outside component setup")]
    CleanupOutsideMount,
    #[error("element is not a component root (missing x-data)")]
    MissingComponentName,
    #[error("component name must be a non-empty string")]
    EmptyComponentName,
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Return `Err($err)` from the enclosing function when `$cond` is false.
///
/// The condition is not evaluated without `debug_assertions`, and the
/// branch is folded away by the optimiser.
#[macro_export]
macro_rules! dev_ensure {
    ($cond:expr, $err:expr) => {
        if cfg!(debug_assertions) && !$cond {
            return Err($err.into());
        }
    };
}

/// Log a recoverable misuse warning. No-op without `debug_assertions`.
#[macro_export]
macro_rules! dev_warn {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            ::tracing::warn!(target: "sting", $($arg)*);
        }
    };
}

/// Run a user callback, catching and logging any panic.
///
/// Returns `None` if the callback panicked. The reactive graph never holds a
/// borrow while user code runs, so resuming after a caught panic is sound.
pub fn isolate<R>(what: &str, f: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            tracing::error!(target: "sting", "{what} panicked: {message}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolate_passes_value_through() {
        assert_eq!(isolate("ok", || 7), Some(7));
    }

    #[test]
    fn isolate_swallows_panic() {
        let out: Option<()> = isolate("boom", || panic!("handler failed"));
        assert!(out.is_none());
    }

    #[test]
    fn error_messages() {
        let err = StingError::InvalidPath {
            directive: "x-text".into(),
            expr: "a()".into(),
        };
        assert_eq!(err.to_string(), "invalid path expression \"a()\" in x-text");
        assert_eq!(
            StingError::CleanupOutsideMount.to_string(),
            "on_cleanup() called outside component setup"
        );
    }

    #[cfg(debug_assertions)]
    #[test]
    fn dev_ensure_returns_error() {
        fn check(ok: bool) -> Result<(), StingError> {
            dev_ensure!(ok, StingError::MissingComponentName);
            Ok(())
        }
        assert!(check(true).is_ok());
        assert!(matches!(check(false), Err(StingError::MissingComponentName)));
    }
}
