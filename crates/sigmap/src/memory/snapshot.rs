//! Buffer-backed process memory
//!
//! A `MemorySnapshot` holds copies of memory regions (image dumps, heap
//! objects) at the addresses they were taken from. It stands in for the live process
//! in offline tooling and in tests.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

use super::{ModuleInformation, ModuleProvider, ReadMemory};

#[derive(Debug, Clone)]
struct Region {
    name: Option<String>,
    base: u64,
    bytes: Vec<u8>,
}

impl Region {
    fn end(&self) -> u64 {
        self.base + self.bytes.len() as u64
    }
}

#[derive(Debug, Clone)]
pub struct MemorySnapshot {
    regions: Vec<Region>,
    pointer_size: usize,
}

impl Default for MemorySnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            pointer_size: std::mem::size_of::<usize>(),
        }
    }

    /// Set the pointer width used by `read_pointer` (4 for 32-bit hosts)
    pub fn with_pointer_size(mut self, size: usize) -> Self {
        self.pointer_size = size;
        self
    }

    /// Add a named image that module lookups can find
    pub fn with_module(mut self, name: impl Into<String>, base: u64, bytes: Vec<u8>) -> Self {
        self.regions.push(Region {
            name: Some(name.into()),
            base,
            bytes,
        });
        self
    }

    /// Add an anonymous region (heap objects, vtables)
    pub fn with_region(mut self, base: u64, bytes: Vec<u8>) -> Self {
        self.regions.push(Region {
            name: None,
            base,
            bytes,
        });
        self
    }

    /// Add a named image read from a raw dump file
    pub fn with_module_file<P: AsRef<Path>>(
        self,
        name: impl Into<String>,
        base: u64,
        path: P,
    ) -> Result<Self> {
        let bytes = fs::read(&path)?;
        debug!(
            "Loaded {} bytes from {} at 0x{:X}",
            bytes.len(),
            path.as_ref().display(),
            base
        );
        Ok(self.with_module(name, base, bytes))
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

impl ReadMemory for MemorySnapshot {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let end = address
            .checked_add(size as u64)
            .ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: "address range overflows".to_string(),
            })?;

        let region = self
            .regions
            .iter()
            .find(|r| address >= r.base && end <= r.end())
            .ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: format!("{} bytes not mapped in snapshot", size),
            })?;

        let start = (address - region.base) as usize;
        Ok(region.bytes[start..start + size].to_vec())
    }

    fn pointer_size(&self) -> usize {
        self.pointer_size
    }
}

impl ModuleProvider for MemorySnapshot {
    fn module_info(&self, name: &str) -> Option<ModuleInformation> {
        self.regions
            .iter()
            .find(|r| {
                r.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .map(|r| ModuleInformation::new(r.base, r.bytes.len()))
    }
}
