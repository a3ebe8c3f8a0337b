//! Config command implementation.

use std::path::Path;

use anyhow::Result;
use crossterm::style::Stylize;
use sigmap::GameConfigStore;

/// Run the config command
pub fn run(path: &Path, game: Option<&str>, json: bool) -> Result<()> {
    let mut store = GameConfigStore::from_path(path)?;

    let Some(game) = game else {
        println!("{} games in {}", store.len(), path.display());
        println!();
        for entry in store.configs() {
            let inherit = entry
                .property(sigmap::INHERIT_PROPERTY)
                .and_then(|v| v.as_str())
                .map(|parent| format!(" (inherits {})", parent))
                .unwrap_or_default();
            println!(
                "  {:<24} {:>3} properties{}",
                entry.title.as_str().bold(),
                entry.properties.len(),
                inherit
            );
        }
        return Ok(());
    };

    let entry = store.resolve_inherit(game)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry.to_json())?);
        return Ok(());
    }

    println!("{} ({} properties)", entry.title.as_str().bold(), entry.properties.len());
    println!();
    for (name, value) in &entry.properties {
        println!("  {:<28} {}", name.as_str().cyan(), value);
    }

    Ok(())
}
