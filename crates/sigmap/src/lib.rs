//! Runtime address resolution and module activation for an injected library
//!
//! The library is loaded into a running game, reads a per-game JSON
//! configuration and activates the feature modules that configuration names.
//! Modules locate the game functions they hook through address descriptors:
//! byte patterns with wildcards inside a loaded image, optionally following a
//! relative call, or vtable slots of objects other modules published in the
//! shared key-value registry.
//!
//! The attach sequence lives in [`Application`]; the pieces it is built from
//! are usable on their own.

pub mod app;
pub mod config;
pub mod error;
pub mod hooks;
pub mod library;
pub mod lifecycle;
pub mod memory;
pub mod module;
pub mod pattern;
pub mod prelude;
pub mod registry;
pub mod resolver;

pub use app::{Application, SetupState};
pub use config::{GameConfigEntry, GameConfigStore, INHERIT_PROPERTY};
pub use error::{Error, FailureReason, Result};
pub use hooks::{HookSubsystem, NoHooks};
pub use library::{LIBRARY_VERSION, LibraryPaths, library_version};
pub use lifecycle::{ShutdownRegistry, StartupRegistry};
pub use memory::{
    LoadedModules, LocalMemory, MemorySnapshot, ModuleInformation, ModuleProvider, ReadMemory,
};
pub use module::{ModuleContext, ModuleHandlers};
pub use pattern::{BytePattern, PatternEntry, scan_region};
pub use registry::{KeyValueRegistry, Pointer, RegistryValue};
pub use resolver::{AddressDescriptor, AddressResolver, relative_jump_target, virtual_table_entry};
