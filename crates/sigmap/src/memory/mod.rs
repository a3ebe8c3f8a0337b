mod local;
mod module;
mod reader;
mod snapshot;

pub use local::LocalMemory;
pub use module::{LoadedModules, ModuleInformation, ModuleProvider};
pub use reader::ReadMemory;
pub use snapshot::MemorySnapshot;
