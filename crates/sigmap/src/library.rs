//! Values handed over by the loader at the library boundary

use std::path::{Path, PathBuf};

/// Version reported to the loader
pub const LIBRARY_VERSION: i32 = 27;

/// Directory below the game directory holding the configuration
pub const CONFIG_DIR: &str = "SDR";
pub const CONFIG_FILE: &str = "GameConfig.json";

pub fn library_version() -> i32 {
    LIBRARY_VERSION
}

/// Paths received by the initialization stage.
///
/// Set before the host's subsystems exist; nothing here touches host state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryPaths {
    /// Directory of the library's own resources
    pub resource_path: PathBuf,
    /// Install directory of the host game
    pub game_path: PathBuf,
}

impl LibraryPaths {
    pub fn new<R: Into<PathBuf>, G: Into<PathBuf>>(resource_path: R, game_path: G) -> Self {
        Self {
            resource_path: resource_path.into(),
            game_path: game_path.into(),
        }
    }

    pub fn resource_path(&self) -> &Path {
        &self.resource_path
    }

    pub fn game_path(&self) -> &Path {
        &self.game_path
    }

    pub fn build_resource_path<P: AsRef<Path>>(&self, file: P) -> PathBuf {
        self.resource_path.join(file)
    }

    /// Location of the game configuration document
    pub fn config_path(&self) -> PathBuf {
        self.game_path.join(CONFIG_DIR).join(CONFIG_FILE)
    }
}
