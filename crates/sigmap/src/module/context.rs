use serde_json::Value;

use crate::lifecycle::{ShutdownRegistry, StartupRegistry};
use crate::memory::{ModuleProvider, ReadMemory};
use crate::registry::KeyValueRegistry;
use crate::resolver::AddressResolver;

/// What a module handler can reach while it activates
pub struct ModuleContext<'a> {
    pub memory: &'a dyn ReadMemory,
    pub modules: &'a dyn ModuleProvider,
    pub registry: &'a mut KeyValueRegistry,
    pub startup: &'a mut StartupRegistry,
    pub shutdown: &'a mut ShutdownRegistry,
}

impl<'a> ModuleContext<'a> {
    pub fn resolver(&self) -> AddressResolver<'_> {
        AddressResolver::new(self.memory, self.modules, &*self.registry)
    }

    /// Resolve an address descriptor with the current registry contents
    pub fn resolve(&self, value: &Value) -> Option<u64> {
        self.resolver().resolve(value)
    }
}
