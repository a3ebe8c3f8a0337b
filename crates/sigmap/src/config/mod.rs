//! Per-game configuration
//!
//! The configuration document maps a game title to an object of named
//! properties. Property order is preserved: it is the order modules are
//! activated in. A title may reuse another title's properties through the
//! reserved `Inherit` property.

mod entry;
mod store;

pub use entry::{GameConfigEntry, INHERIT_PROPERTY};
pub use store::GameConfigStore;
