//! Byte patterns with wildcards
//!
//! Patterns are written as pairs of hex digits, optionally separated by
//! whitespace. Any pair that is not two hex digits (conventionally `??`)
//! matches any byte:
//!
//! ```text
//! 55 8B EC 83 ?? ?? 56 8B F1
//! ```

mod scan;

use std::fmt;

pub use scan::{SCAN_CHUNK_SIZE, scan_region};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEntry {
    pub wildcard: bool,
    pub value: u8,
}

impl PatternEntry {
    pub fn fixed(value: u8) -> Self {
        Self {
            wildcard: false,
            value,
        }
    }

    pub fn wildcard() -> Self {
        Self {
            wildcard: true,
            value: 0,
        }
    }

    fn matches(&self, byte: u8) -> bool {
        self.wildcard || self.value == byte
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BytePattern {
    entries: Vec<PatternEntry>,
}

impl BytePattern {
    /// Compile a pattern string.
    ///
    /// This never fails: malformed input produces a pattern that simply
    /// does not match anything useful. A lone trailing character becomes a
    /// wildcard.
    pub fn compile(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut entries = Vec::new();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i].is_ascii_whitespace() {
                i += 1;
                continue;
            }

            let high = bytes[i];
            let low = bytes.get(i + 1).copied();
            i += 2;

            let entry = match (hex_value(high), low.and_then(hex_value)) {
                (Some(h), Some(l)) => PatternEntry::fixed((h << 4) | l),
                _ => PatternEntry::wildcard(),
            };
            entries.push(entry);
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the pattern against the start of `data`
    pub fn matches_at(&self, data: &[u8]) -> bool {
        if self.entries.is_empty() || data.len() < self.entries.len() {
            return false;
        }

        self.entries
            .iter()
            .zip(data)
            .all(|(entry, &byte)| entry.matches(byte))
    }

    /// Offset of the first match in `data`
    pub fn find_in(&self, data: &[u8]) -> Option<usize> {
        if self.entries.is_empty() || data.len() < self.entries.len() {
            return None;
        }

        let last = data.len() - self.entries.len();

        match self.entries[0] {
            PatternEntry {
                wildcard: false,
                value,
            } => memchr::memchr_iter(value, &data[..=last])
                .find(|&pos| self.matches_at(&data[pos..])),
            _ => (0..=last).find(|&pos| self.matches_at(&data[pos..])),
        }
    }
}

impl From<&str> for BytePattern {
    fn from(text: &str) -> Self {
        Self::compile(text)
    }
}

impl fmt::Display for BytePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if entry.wildcard {
                f.write_str("??")?;
            } else {
                write!(f, "{:02X}", entry.value)?;
            }
        }
        Ok(())
    }
}

fn hex_value(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_of(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_compile_with_wildcards() {
        let pattern = BytePattern::compile("48 8D 0D ?? ?? ?? ??");
        assert_eq!(pattern.len(), 7);
        assert_eq!(pattern.entries()[0], PatternEntry::fixed(0x48));
        assert_eq!(pattern.entries()[1], PatternEntry::fixed(0x8D));
        assert_eq!(pattern.entries()[2], PatternEntry::fixed(0x0D));
        assert!(pattern.entries()[3].wildcard);
    }

    #[test]
    fn test_compile_without_spaces_and_lowercase() {
        let pattern = BytePattern::compile("e8??c3");
        assert_eq!(
            pattern.entries(),
            &[
                PatternEntry::fixed(0xE8),
                PatternEntry::wildcard(),
                PatternEntry::fixed(0xC3)
            ]
        );
    }

    #[test]
    fn test_compile_garbage_is_not_fatal() {
        let pattern = BytePattern::compile("zz 4 x");
        assert_eq!(pattern.len(), 3);
        assert!(pattern.entries().iter().all(|e| e.wildcard));

        assert!(BytePattern::compile("").is_empty());
        assert!(BytePattern::compile("   \t ").is_empty());
    }

    #[test]
    fn test_display() {
        let pattern = BytePattern::compile("55 8b ec ?? ?? 56");
        assert_eq!(pattern.to_string(), "55 8B EC ?? ?? 56");
    }

    #[test]
    fn test_find_embedded_bytes() {
        let needle = [0x55, 0x8B, 0xEC, 0x83, 0xE4, 0xF8];
        let mut haystack = vec![0x90u8; 64];
        haystack[37..43].copy_from_slice(&needle);

        let pattern = BytePattern::compile(&hex_of(&needle));
        assert_eq!(pattern.find_in(&haystack), Some(37));
    }

    #[test]
    fn test_wildcard_replaces_any_byte() {
        let needle = [0x55, 0x8B, 0xEC, 0x83, 0xE4, 0xF8];
        let mut haystack = vec![0x90u8; 64];
        haystack[10..16].copy_from_slice(&needle);

        for i in 0..needle.len() {
            let mut pairs: Vec<String> = needle.iter().map(|b| format!("{:02X}", b)).collect();
            pairs[i] = "??".to_string();
            let pattern = BytePattern::compile(&pairs.join(" "));
            assert_eq!(pattern.find_in(&haystack), Some(10), "wildcard at {}", i);

            let mut altered = haystack.clone();
            altered[10 + i] ^= 0xFF;
            assert_eq!(pattern.find_in(&altered), Some(10), "altered byte at {}", i);
        }
    }

    #[test]
    fn test_first_match_wins() {
        let haystack = [0xC3, 0xCC, 0xC3, 0xCC, 0xC3];
        let pattern = BytePattern::compile("C3 CC");
        assert_eq!(pattern.find_in(&haystack), Some(0));

        let pattern = BytePattern::compile("?? C3");
        assert_eq!(pattern.find_in(&haystack), Some(1));
    }

    #[test]
    fn test_match_at_end_of_buffer() {
        let haystack = [0x00, 0x00, 0x00, 0xAB, 0xCD];
        let pattern = BytePattern::compile("AB CD");
        assert_eq!(pattern.find_in(&haystack), Some(3));
    }

    #[test]
    fn test_short_buffer_never_matches() {
        let pattern = BytePattern::compile("01 02 03 04");
        assert_eq!(pattern.find_in(&[0x01, 0x02, 0x03]), None);
        assert_eq!(pattern.find_in(&[]), None);
        assert!(!pattern.matches_at(&[0x01, 0x02]));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let pattern = BytePattern::default();
        assert_eq!(pattern.find_in(&[0x00, 0x01]), None);
        assert!(!pattern.matches_at(&[0x00]));
    }
}
