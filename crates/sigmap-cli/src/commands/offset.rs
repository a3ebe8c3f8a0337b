//! Offset command implementation.
//!
//! Prints the value to put in a descriptor's `Offset` field to get from a
//! pattern match to the address of interest.

use super::hex_utils::parse_hex_address;
use anyhow::Result;

/// Signed distance from `from` to `to`
pub fn signed_offset(from: u64, to: u64) -> i128 {
    to as i128 - from as i128
}

/// Run the offset command
pub fn run(from: &str, to: &str) -> Result<()> {
    let from_addr = parse_hex_address(from)?;
    let to_addr = parse_hex_address(to)?;

    let offset = signed_offset(from_addr, to_addr);
    let sign = if offset < 0 { "-" } else { "" };
    let diff = to_addr.abs_diff(from_addr);

    println!("From: 0x{:X}", from_addr);
    println!("To:   0x{:X}", to_addr);
    println!();
    println!("Offset: {} ({}0x{:X})", offset, sign, diff);
    println!("  \"Offset\": {}", offset);

    Ok(())
}
