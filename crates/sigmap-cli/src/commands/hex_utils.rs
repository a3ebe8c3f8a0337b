//! Hex address parsing and formatting utilities.

use anyhow::Result;

/// Parse a hex address string (with or without 0x prefix).
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_hex_address("0x1000").unwrap(), 0x1000);
/// assert_eq!(parse_hex_address("1000").unwrap(), 0x1000);
/// ```
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| anyhow::anyhow!("Invalid hex address {}: {}", s, e))
}

/// Render an address the way the resolver logs it, with the width of the
/// dumped process's pointers
pub fn format_hex_address(addr: u64, pointer_size: usize) -> String {
    format!("0x{:0width$X}", addr, width = pointer_size * 2)
}
