use serde_json::Value;
use tracing::{info, warn};

use crate::config::GameConfigEntry;
use crate::error::{Error, Result};

use super::ModuleContext;

/// Activation callback: receives the property name and value, returns whether
/// the module was enabled
pub type ActivateFn = Box<dyn FnMut(&str, &Value, &mut ModuleContext<'_>) -> bool>;

pub struct ModuleHandlerEntry {
    pub name: String,
    activate: ActivateFn,
}

impl ModuleHandlerEntry {
    pub fn new<F>(name: impl Into<String>, activate: F) -> Self
    where
        F: FnMut(&str, &Value, &mut ModuleContext<'_>) -> bool + 'static,
    {
        Self {
            name: name.into(),
            activate: Box::new(activate),
        }
    }
}

impl std::fmt::Debug for ModuleHandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandlerEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Handlers waiting for the configuration to be dispatched.
///
/// The list is single use: `dispatch` consumes every handler whether it
/// succeeds or not, so anything registered later is never called.
#[derive(Debug, Default)]
pub struct ModuleHandlers {
    entries: Vec<ModuleHandlerEntry>,
}

impl ModuleHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: ModuleHandlerEntry) {
        self.entries.push(entry);
    }

    pub fn add_handler<F>(&mut self, name: impl Into<String>, activate: F)
    where
        F: FnMut(&str, &Value, &mut ModuleContext<'_>) -> bool + 'static,
    {
        self.add(ModuleHandlerEntry::new(name, activate));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Activate modules for every property of `game`, in property order.
    ///
    /// Properties without a handler are skipped with a warning. The first
    /// handler that returns `false` aborts dispatch with
    /// `CouldNotCreateModule`. Returns the number of enabled modules.
    pub fn dispatch(
        &mut self,
        game: &GameConfigEntry,
        context: &mut ModuleContext<'_>,
    ) -> Result<usize> {
        let mut handlers = std::mem::take(&mut self.entries);

        info!("Creating {} modules", handlers.len());

        let mut enabled = 0usize;

        for (name, value) in &game.properties {
            let Some(handler) = handlers.iter_mut().find(|h| h.name == *name) else {
                warn!("No handler found for {}", name);
                continue;
            };

            if !(handler.activate)(&handler.name, value, context) {
                warn!("Could not enable module {}", handler.name);
                return Err(Error::CouldNotCreateModule(handler.name.clone()));
            }

            info!("Enabled module {}", handler.name);
            enabled += 1;
        }

        Ok(enabled)
    }
}
