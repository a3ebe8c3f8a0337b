use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

use super::BytePattern;

/// Bytes read from the target per scan step (4MB)
pub const SCAN_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Find the first occurrence of `pattern` in `[base, base + length)`.
///
/// Memory is read in chunks; the last `pattern.len() - 1` bytes of each chunk
/// are carried over so matches spanning a chunk boundary are found. A read
/// failure on the first chunk is an error; a later one ends the scan.
pub fn scan_region<R: ReadMemory + ?Sized>(
    reader: &R,
    base: u64,
    length: usize,
    pattern: &BytePattern,
) -> Result<Option<u64>> {
    scan_region_chunked(reader, base, length, pattern, SCAN_CHUNK_SIZE)
}

pub(crate) fn scan_region_chunked<R: ReadMemory + ?Sized>(
    reader: &R,
    base: u64,
    length: usize,
    pattern: &BytePattern,
    chunk_size: usize,
) -> Result<Option<u64>> {
    if pattern.is_empty() || length < pattern.len() {
        return Ok(None);
    }

    let mut scanned: usize = 0;
    let mut tail: Vec<u8> = Vec::new();

    while scanned < length {
        let read_size = (length - scanned).min(chunk_size);
        let addr = base + scanned as u64;

        let chunk = match reader.read_bytes(addr, read_size) {
            Ok(bytes) => bytes,
            Err(e) => {
                if scanned == 0 {
                    return Err(Error::MemoryReadFailed {
                        address: addr,
                        message: format!("failed to read scan region: {}", e),
                    });
                }
                debug!(
                    "Pattern scan stopped at 0x{:X} (scanned {:#x} bytes): {}",
                    addr, scanned, e
                );
                break;
            }
        };

        let mut data = Vec::with_capacity(tail.len() + chunk.len());
        data.extend_from_slice(&tail);
        data.extend_from_slice(&chunk);

        let data_base = addr - tail.len() as u64;
        if let Some(pos) = pattern.find_in(&data) {
            return Ok(Some(data_base + pos as u64));
        }

        let keep = pattern.len() - 1;
        tail = data[data.len().saturating_sub(keep)..].to_vec();

        scanned += read_size;
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySnapshot;

    #[test]
    fn test_scan_finds_address() {
        let mut image = vec![0xCCu8; 0x400];
        image[0x123..0x128].copy_from_slice(&[0xE8, 0x10, 0x20, 0x30, 0x40]);
        let memory = MemorySnapshot::new().with_region(0x40_0000, image);

        let pattern = BytePattern::compile("E8 ?? ?? ?? 40");
        let found = scan_region(&memory, 0x40_0000, 0x400, &pattern).unwrap();
        assert_eq!(found, Some(0x40_0123));
    }

    #[test]
    fn test_scan_across_chunk_boundary() {
        let mut image = vec![0u8; 64];
        image[14..18].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let memory = MemorySnapshot::new().with_region(0x1000, image);

        let pattern = BytePattern::compile("DE AD BE EF");
        let found = scan_region_chunked(&memory, 0x1000, 64, &pattern, 16).unwrap();
        assert_eq!(found, Some(0x100E));
    }

    #[test]
    fn test_scan_returns_first_match_across_chunks() {
        let mut image = vec![0u8; 64];
        image[40] = 0x7F;
        image[50] = 0x7F;
        let memory = MemorySnapshot::new().with_region(0x1000, image);

        let pattern = BytePattern::compile("7F");
        let found = scan_region_chunked(&memory, 0x1000, 64, &pattern, 8).unwrap();
        assert_eq!(found, Some(0x1000 + 40));
    }

    #[test]
    fn test_scan_region_shorter_than_pattern() {
        let memory = MemorySnapshot::new().with_region(0x1000, vec![0x01, 0x02]);
        let pattern = BytePattern::compile("01 02 03");

        assert_eq!(scan_region(&memory, 0x1000, 2, &pattern).unwrap(), None);
    }

    #[test]
    fn test_scan_not_found() {
        let memory = MemorySnapshot::new().with_region(0x1000, vec![0u8; 32]);
        let pattern = BytePattern::compile("01 02");

        assert_eq!(scan_region(&memory, 0x1000, 32, &pattern).unwrap(), None);
    }

    #[test]
    fn test_scan_unreadable_region_is_error() {
        let memory = MemorySnapshot::new();
        let pattern = BytePattern::compile("01 02");

        assert!(scan_region(&memory, 0x1000, 32, &pattern).is_err());
    }

    #[test]
    fn test_scan_stops_at_unmapped_tail() {
        let memory = MemorySnapshot::new().with_region(0x1000, vec![0u8; 16]);
        let pattern = BytePattern::compile("01 02");

        let found = scan_region_chunked(&memory, 0x1000, 64, &pattern, 16).unwrap();
        assert_eq!(found, None);
    }
}
