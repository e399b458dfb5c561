//! Headless testing helpers.
//!
//! Use the [`Pilot`] to drive a [`Sting`](crate::app::Sting) through its
//! document the way a user would, then read back text, form state, and
//! serialised HTML for assertions and snapshots.

pub mod pilot;

pub use pilot::Pilot;
