use std::path::PathBuf;

use strum::{Display, IntoStaticStr};
use thiserror::Error;

/// Named reason an attach sequence failed.
///
/// The display strings are what gets reported at the attach boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum FailureReason {
    #[strum(serialize = "Could not find config")]
    CouldNotFindConfig,
    #[strum(serialize = "Could not parse config")]
    InvalidConfig,
    #[strum(serialize = "Could not find game")]
    CouldNotFindGame,
    #[strum(serialize = "Inherit target not found")]
    InheritTargetWrong,
    #[strum(serialize = "Circular inherit chain")]
    CircularInherit,
    #[strum(serialize = "Could not create module")]
    CouldNotCreateModule,
    #[strum(serialize = "Failed to initialize hooks")]
    HookInitFailed,
    #[strum(serialize = "Startup procedure failed")]
    StartupFailed,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Could not find config {}: {source}", .path.display())]
    CouldNotFindConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config: {0}")]
    InvalidConfig(String),

    #[error("Could not find game: {0}")]
    CouldNotFindGame(String),

    #[error("Inherit target not found: {title} inherits {target}")]
    InheritTargetWrong { title: String, target: String },

    #[error("Circular inherit chain: {title} reaches {target} twice")]
    CircularInherit { title: String, target: String },

    #[error("Could not create module: {0}")]
    CouldNotCreateModule(String),

    #[error("Failed to initialize hooks: {0}")]
    HookInitFailed(String),

    #[error("Startup procedure failed: {0}")]
    StartupFailed(String),

    #[error("Failed to read memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The attach failure reason reported for this error.
    ///
    /// I/O only happens while reading the configuration and memory reads only
    /// happen inside module activation, so those map onto the matching stage.
    pub fn reason(&self) -> FailureReason {
        match self {
            Error::CouldNotFindConfig { .. } | Error::Io(_) => FailureReason::CouldNotFindConfig,
            Error::InvalidConfig(_) | Error::Json(_) => FailureReason::InvalidConfig,
            Error::CouldNotFindGame(_) => FailureReason::CouldNotFindGame,
            Error::InheritTargetWrong { .. } => FailureReason::InheritTargetWrong,
            Error::CircularInherit { .. } => FailureReason::CircularInherit,
            Error::CouldNotCreateModule(_) => FailureReason::CouldNotCreateModule,
            Error::HookInitFailed(_) => FailureReason::HookInitFailed,
            Error::StartupFailed(_) => FailureReason::StartupFailed,
            Error::MemoryReadFailed { .. } => FailureReason::CouldNotCreateModule,
        }
    }

    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Error::CouldNotFindConfig { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            _ => false,
        }
    }
}
