//! Startup and shutdown procedures contributed by modules

use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub type StartupFn = Box<dyn FnOnce() -> bool>;
pub type ShutdownFn = Box<dyn FnMut()>;

pub struct StartupEntry {
    pub name: String,
    function: StartupFn,
}

/// Procedures run once the host's subsystems are available
#[derive(Default)]
pub struct StartupRegistry {
    entries: Vec<StartupEntry>,
}

impl StartupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: FnOnce() -> bool + 'static,
    {
        self.entries.push(StartupEntry {
            name: name.into(),
            function: Box::new(function),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every procedure in registration order and clear the list.
    ///
    /// The first procedure that returns `false` aborts with `StartupFailed`;
    /// the ones after it are dropped without running.
    pub fn call_all(&mut self) -> Result<()> {
        let entries = std::mem::take(&mut self.entries);
        let count = entries.len();

        for (index, entry) in entries.into_iter().enumerate() {
            info!("Startup procedure ({}/{}): {}", index + 1, count, entry.name);

            if !(entry.function)() {
                warn!("Startup procedure {} failed", entry.name);
                return Err(Error::StartupFailed(entry.name));
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for StartupRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.name))
            .finish()
    }
}

pub struct ShutdownEntry {
    pub name: String,
    function: ShutdownFn,
}

/// Teardown procedures, run in registration order when the library unloads
#[derive(Default)]
pub struct ShutdownRegistry {
    entries: Vec<ShutdownEntry>,
}

impl ShutdownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: FnMut() + 'static,
    {
        self.entries.push(ShutdownEntry {
            name: name.into(),
            function: Box::new(function),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every procedure. The list is kept; the process is exiting.
    pub fn call_all(&mut self) {
        for entry in &mut self.entries {
            debug!("Shutdown procedure: {}", entry.name);
            (entry.function)();
        }
    }
}

impl std::fmt::Debug for ShutdownRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.name))
            .finish()
    }
}
