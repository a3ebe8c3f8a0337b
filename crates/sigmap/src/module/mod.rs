//! Module activation
//!
//! Feature modules register a handler under the name of the configuration
//! property that enables them. Dispatch walks the resolved properties of the
//! active game in order and hands each one to its handler.

mod context;
mod handler;

pub use context::ModuleContext;
pub use handler::{ActivateFn, ModuleHandlerEntry, ModuleHandlers};
