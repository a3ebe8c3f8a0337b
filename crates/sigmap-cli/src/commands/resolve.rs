//! Resolve command implementation.
//!
//! Runs every address descriptor of a game's resolved configuration against
//! module dumps, the same way module handlers resolve them at attach time.

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;
use tracing::{info, warn};
use sigmap::{
    AddressDescriptor, AddressResolver, GameConfigEntry, GameConfigStore, KeyValueRegistry,
    MemorySnapshot,
};

use super::hex_utils::format_hex_address;
use super::{ModuleDump, NamedPointer, load_snapshot};

/// Outcome for one configuration property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(u64),
    NotFound,
    /// Property is not an address descriptor
    Skipped,
    Malformed(String),
}

/// Resolve every property of `entry` in order
pub fn resolve_entry(
    entry: &GameConfigEntry,
    memory: &MemorySnapshot,
    registry: &KeyValueRegistry,
) -> Vec<(String, Resolution)> {
    let resolver = AddressResolver::new(memory, memory, registry);

    entry
        .properties
        .iter()
        .map(|(name, value)| {
            let resolution = match AddressDescriptor::from_json(value) {
                Ok(Some(descriptor)) => match resolver.resolve_descriptor(&descriptor) {
                    Some(address) => Resolution::Found(address),
                    None => Resolution::NotFound,
                },
                Ok(None) => Resolution::Skipped,
                Err(e) => Resolution::Malformed(e.to_string()),
            };
            (name.clone(), resolution)
        })
        .collect()
}

/// Run the resolve command
pub fn run(
    path: &Path,
    game: &str,
    dumps: &[ModuleDump],
    pointers: &[NamedPointer],
    pointer_size: usize,
) -> Result<()> {
    let mut store = GameConfigStore::from_path(path)?;
    let entry = store.resolve_inherit(game)?;
    let memory = load_snapshot(dumps, pointer_size)?;

    let mut registry = KeyValueRegistry::new();
    for pointer in pointers {
        registry.set_pointer(&pointer.name, pointer.address);
    }

    info!(
        "Resolving {} properties of {} against {} module dumps",
        entry.properties.len(),
        game,
        dumps.len()
    );
    let results = resolve_entry(entry, &memory, &registry);

    let mut found = 0usize;
    let mut failed = 0usize;

    for (name, resolution) in &results {
        match resolution {
            Resolution::Found(address) => {
                found += 1;
                println!(
                    "  {:<28} {}",
                    name,
                    format_hex_address(*address, pointer_size).green()
                );
            }
            Resolution::NotFound => {
                failed += 1;
                println!("  {:<28} {}", name, "not found".red());
            }
            Resolution::Malformed(message) => {
                failed += 1;
                println!("  {:<28} {}", name, message.as_str().yellow());
            }
            Resolution::Skipped => {}
        }
    }

    println!();
    println!("{}: {} resolved, {} failed", game, found, failed);
    if failed > 0 {
        warn!("{} descriptors of {} did not resolve", failed, game);
    }

    Ok(())
}
