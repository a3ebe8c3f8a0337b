//! Attach sequence
//!
//! `Application` owns everything the modules share during one attach: the
//! handler list, the startup and shutdown procedures, the key-value registry
//! and the loaded game configurations.
//!
//! ## Example
//!
//! ```ignore
//! use sigmap::{Application, LibraryPaths, LoadedModules, LocalMemory};
//!
//! let paths = LibraryPaths::new(resource_dir, game_dir);
//! let mut app = Application::new();
//!
//! app.add_module_handler("StartMovie", |_, value, context| {
//!     context.resolve(value).is_some()
//! });
//!
//! app.setup(&paths.config_path(), "tf", &LocalMemory::new(), &LoadedModules::new())?;
//! app.call_startup_functions()?;
//! // ...
//! app.close();
//! ```

use std::path::Path;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{GameConfigEntry, GameConfigStore};
use crate::error::{Error, FailureReason, Result};
use crate::hooks::{HookSubsystem, NoHooks};
use crate::lifecycle::{ShutdownRegistry, StartupRegistry};
use crate::memory::{ModuleProvider, ReadMemory};
use crate::module::{ModuleContext, ModuleHandlers};
use crate::registry::KeyValueRegistry;

/// Progress of `Application::setup`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    Idle,
    ConfigLoading,
    InheritanceResolving,
    Dispatching,
    Ready,
    Failed(FailureReason),
}

impl SetupState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SetupState::Ready)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SetupState::Failed(_))
    }
}

pub struct Application {
    handlers: ModuleHandlers,
    startup: StartupRegistry,
    shutdown: ShutdownRegistry,
    registry: KeyValueRegistry,
    configs: GameConfigStore,
    game: Option<GameConfigEntry>,
    hooks: Box<dyn HookSubsystem>,
    state: SetupState,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    pub fn new() -> Self {
        Self::with_hooks(NoHooks)
    }

    pub fn with_hooks<H: HookSubsystem + 'static>(hooks: H) -> Self {
        Self {
            handlers: ModuleHandlers::new(),
            startup: StartupRegistry::new(),
            shutdown: ShutdownRegistry::new(),
            registry: KeyValueRegistry::new(),
            configs: GameConfigStore::default(),
            game: None,
            hooks: Box::new(hooks),
            state: SetupState::Idle,
        }
    }

    /// Register the handler for the property `name`. Must happen before `setup`.
    pub fn add_module_handler<F>(&mut self, name: impl Into<String>, activate: F)
    where
        F: FnMut(&str, &Value, &mut ModuleContext<'_>) -> bool + 'static,
    {
        self.handlers.add_handler(name, activate);
    }

    pub fn add_startup_function<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: FnOnce() -> bool + 'static,
    {
        self.startup.add(name, function);
    }

    pub fn add_shutdown_function<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: FnMut() + 'static,
    {
        self.shutdown.add(name, function);
    }

    pub fn state(&self) -> SetupState {
        self.state
    }

    pub fn registry(&self) -> &KeyValueRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut KeyValueRegistry {
        &mut self.registry
    }

    pub fn configs(&self) -> &GameConfigStore {
        &self.configs
    }

    /// The resolved configuration of the game that was set up
    pub fn active_game(&self) -> Option<&GameConfigEntry> {
        self.game.as_ref()
    }

    pub fn pending_handlers(&self) -> usize {
        self.handlers.len()
    }

    /// Initialize hooks, load the configuration for `game_name` and activate its modules.
    ///
    /// Any failure is terminal: the state becomes `Failed` with the reason
    /// and the error is returned to the attach boundary.
    pub fn setup(
        &mut self,
        config_path: &Path,
        game_name: &str,
        memory: &dyn ReadMemory,
        modules: &dyn ModuleProvider,
    ) -> Result<()> {
        if self.state != SetupState::Idle {
            warn!("Setup called again in state {:?}", self.state);
        }

        if let Err(e) = self.hooks.initialize() {
            error!("Failed to initialize hooks: {}", e);
            self.state = SetupState::Failed(FailureReason::HookInitFailed);
            return Err(match e {
                Error::HookInitFailed(_) => e,
                other => Error::HookInitFailed(other.to_string()),
            });
        }

        match self.setup_game(config_path, game_name, memory, modules) {
            Ok(enabled) => {
                info!("{}: {} modules enabled", game_name, enabled);
                self.state = SetupState::Ready;
                Ok(())
            }
            Err(e) => {
                let reason = e.reason();
                error!("GameConfig: {} ({})", reason, e);
                self.state = SetupState::Failed(reason);
                Err(e)
            }
        }
    }

    fn setup_game(
        &mut self,
        config_path: &Path,
        game_name: &str,
        memory: &dyn ReadMemory,
        modules: &dyn ModuleProvider,
    ) -> Result<usize> {
        self.state = SetupState::ConfigLoading;
        self.configs = GameConfigStore::from_path(config_path)?;

        self.state = SetupState::InheritanceResolving;
        let game = self.configs.resolve_inherit(game_name)?.clone();
        debug!(
            "{} resolved to properties: {:?}",
            game_name,
            game.property_names().collect::<Vec<_>>()
        );

        self.state = SetupState::Dispatching;
        let mut context = ModuleContext {
            memory,
            modules,
            registry: &mut self.registry,
            startup: &mut self.startup,
            shutdown: &mut self.shutdown,
        };
        let result = self.handlers.dispatch(&game, &mut context);

        self.game = Some(game);
        result
    }

    /// Run the startup procedures registered by the activated modules
    pub fn call_startup_functions(&mut self) -> Result<()> {
        if self.startup.is_empty() {
            return Ok(());
        }

        self.startup.call_all().inspect_err(|e| {
            error!("{}", e);
        })
    }

    /// Run the shutdown procedures, then release the hook subsystem
    pub fn close(&mut self) {
        self.shutdown.call_all();
        self.hooks.uninitialize();
    }
}
