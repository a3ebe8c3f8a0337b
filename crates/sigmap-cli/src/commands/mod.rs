//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod config;
pub mod hex_utils;
pub mod offset;
pub mod resolve;
pub mod scan;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use sigmap::MemorySnapshot;
use tracing::{debug, info};

use hex_utils::parse_hex_address;

/// A raw image dump and the address it was loaded at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDump {
    pub name: String,
    pub file: PathBuf,
    pub base: u64,
}

impl FromStr for ModuleDump {
    type Err = anyhow::Error;

    /// Parse `NAME=FILE@BASE`
    fn from_str(s: &str) -> Result<Self> {
        let (name, rest) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected NAME=FILE@BASE, got {}", s))?;
        let (file, base) = rest
            .rsplit_once('@')
            .ok_or_else(|| anyhow!("Missing @BASE in {}", s))?;

        if name.is_empty() || file.is_empty() {
            return Err(anyhow!("Expected NAME=FILE@BASE, got {}", s));
        }

        Ok(Self {
            name: name.to_string(),
            file: PathBuf::from(file),
            base: parse_hex_address(base)?,
        })
    }
}

/// A registry pointer supplied on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPointer {
    pub name: String,
    pub address: u64,
}

impl FromStr for NamedPointer {
    type Err = anyhow::Error;

    /// Parse `NAME=ADDRESS`
    fn from_str(s: &str) -> Result<Self> {
        let (name, address) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected NAME=ADDRESS, got {}", s))?;

        Ok(Self {
            name: name.to_string(),
            address: parse_hex_address(address)?,
        })
    }
}

/// Build a memory image from module dumps
pub fn load_snapshot(dumps: &[ModuleDump], pointer_size: usize) -> Result<MemorySnapshot> {
    let mut snapshot = MemorySnapshot::new().with_pointer_size(pointer_size);

    for dump in dumps {
        snapshot = snapshot
            .with_module_file(&dump.name, dump.base, &dump.file)
            .with_context(|| format!("Failed to load dump {}", dump.file.display()))?;
        info!(
            "Loaded {} from {} at 0x{:X}",
            dump.name,
            dump.file.display(),
            dump.base
        );
    }

    debug!("Snapshot holds {} regions", snapshot.region_count());
    Ok(snapshot)
}
