//! Scan command implementation.
//!
//! Searches a raw image dump for a byte pattern and prints every match with
//! its offset into the image and its address at the given load base.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use sigmap::BytePattern;

use super::hex_utils::parse_hex_address;

/// Offsets of up to `limit` matches of `pattern` in `data`, in ascending order
pub fn find_all(pattern: &BytePattern, data: &[u8], limit: usize) -> Vec<usize> {
    let mut found = Vec::new();
    let mut start = 0;

    while found.len() < limit && start < data.len() {
        let Some(pos) = pattern.find_in(&data[start..]) else {
            break;
        };
        found.push(start + pos);
        start += pos + 1;
    }

    found
}

/// Run the scan command
pub fn run(file: &Path, pattern: &str, base: &str, limit: usize) -> Result<()> {
    let base = parse_hex_address(base)?;
    let compiled = BytePattern::compile(pattern);
    if compiled.is_empty() {
        bail!("Empty pattern");
    }

    let data = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    println!(
        "Searching {} ({} bytes) for [{}]",
        file.display(),
        data.len(),
        compiled
    );
    println!();

    let found = find_all(&compiled, &data, limit);
    if found.is_empty() {
        println!("No matches");
        return Ok(());
    }

    for offset in &found {
        println!("  +0x{:08X}  0x{:X}", offset, base + *offset as u64);
    }

    println!();
    if found.len() == limit {
        println!("Showing the first {} matches", limit);
    } else {
        println!("{} match(es)", found.len());
    }
    if found.len() > 1 {
        println!("Pattern is not unique; descriptors resolve to the first match");
    }

    Ok(())
}
