//! Prelude module for convenient imports
//!
//! ```ignore
//! use sigmap::prelude::*;
//! ```
//!
//! This brings the attach sequence, the module context and the memory
//! access traits into scope.

// Attach sequence
pub use crate::app::{Application, SetupState};
pub use crate::library::LibraryPaths;

// Error handling
pub use crate::error::{Error, FailureReason, Result};

// Module activation
pub use crate::hooks::HookSubsystem;
pub use crate::module::ModuleContext;
pub use crate::registry::{KeyValueRegistry, Pointer};

// Memory access
pub use crate::memory::{LoadedModules, LocalMemory, ModuleProvider, ReadMemory};
