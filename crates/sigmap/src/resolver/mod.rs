//! Address resolution from configuration descriptors
//!
//! A descriptor either names a byte pattern inside a loaded image or a
//! vtable slot of a live object:
//!
//! ```json
//! { "Module": "engine.dll", "Pattern": "E8 ?? ?? ?? ?? 83 C4 08", "IsRelativeJump": true }
//! { "VTIndex": 13, "VTPtrName": "EngineClient" }
//! ```
//!
//! A descriptor that matches nothing resolves to `None`. That is an expected
//! outcome; the calling module decides whether it can continue without the
//! address.

mod descriptor;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::memory::{ModuleInformation, ModuleProvider, ReadMemory};
use crate::pattern::{BytePattern, scan_region};
use crate::registry::KeyValueRegistry;

pub use descriptor::{AddressDescriptor, DescriptorError, virtual_index};

/// Opcodes of the `call rel32` / `jmp rel32` instructions
const REL32_OPCODES: [u8; 2] = [0xE8, 0xE9];
/// Position of the displacement inside a rel32 instruction
const REL32_DISP_OFFSET: u64 = 1;
/// Length of a rel32 call/jmp instruction
const REL32_INSTR_LEN: u64 = 5;

pub struct AddressResolver<'a> {
    memory: &'a dyn ReadMemory,
    modules: &'a dyn ModuleProvider,
    registry: &'a KeyValueRegistry,
}

impl<'a> AddressResolver<'a> {
    pub fn new(
        memory: &'a dyn ReadMemory,
        modules: &'a dyn ModuleProvider,
        registry: &'a KeyValueRegistry,
    ) -> Self {
        Self {
            memory,
            modules,
            registry,
        }
    }

    /// Resolve a descriptor object to an address.
    ///
    /// Malformed fields are logged and treated as not found.
    pub fn resolve(&self, value: &Value) -> Option<u64> {
        match AddressDescriptor::from_json(value) {
            Ok(Some(descriptor)) => self.resolve_descriptor(&descriptor),
            Ok(None) => {
                debug!("Descriptor has nothing to resolve");
                None
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    pub fn resolve_descriptor(&self, descriptor: &AddressDescriptor) -> Option<u64> {
        match descriptor {
            AddressDescriptor::Pattern {
                module,
                pattern,
                offset,
                relative_jump,
            } => self.resolve_pattern(module, pattern, *offset, *relative_jump),
            AddressDescriptor::Virtual { instance, index } => {
                let Some(instance_ptr) = self.registry.get_pointer(instance) else {
                    debug!("No instance pointer registered as {}", instance);
                    return None;
                };
                self.virtual_address_from_index(instance_ptr, *index)
            }
        }
    }

    /// Scan `module` for `pattern`, apply `offset` and optionally follow a rel32 call/jmp
    pub fn resolve_pattern(
        &self,
        module: &str,
        pattern: &str,
        offset: i64,
        relative_jump: bool,
    ) -> Option<u64> {
        let Some(info) = self.modules.module_info(module) else {
            warn!("Module {} not found", module);
            return None;
        };

        let compiled = BytePattern::compile(pattern);
        let found = self.find_pattern(&info, &compiled)?;
        let address = found.wrapping_add_signed(offset);

        debug!(
            "Pattern [{}] in {} at 0x{:X} (offset {})",
            compiled, module, found, offset
        );

        if !relative_jump {
            return Some(address);
        }

        match relative_jump_target(self.memory, address) {
            Ok(target) => Some(target),
            Err(e) => {
                warn!("Could not follow relative jump at 0x{:X}: {}", address, e);
                None
            }
        }
    }

    /// First occurrence of `pattern` in the whole image
    pub fn find_pattern(&self, module: &ModuleInformation, pattern: &BytePattern) -> Option<u64> {
        match scan_region(self.memory, module.base_address, module.size, pattern) {
            Ok(found) => found,
            Err(e) => {
                warn!("Pattern scan failed: {}", e);
                None
            }
        }
    }

    /// Resolve a vtable descriptor against an instance pointer the caller already holds
    pub fn resolve_virtual_at(&self, instance: u64, value: &Value) -> Option<u64> {
        match virtual_index(value) {
            Ok(index) => self.virtual_address_from_index(instance, index),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    /// Read slot `index` of the vtable of the object at `instance`
    pub fn virtual_address_from_index(&self, instance: u64, index: usize) -> Option<u64> {
        match virtual_table_entry(self.memory, instance, index) {
            Ok(address) => Some(address),
            Err(e) => {
                warn!(
                    "Could not read vtable slot {} of instance 0x{:X}: {}",
                    index, instance, e
                );
                None
            }
        }
    }
}

/// Read slot `index` of the vtable whose pointer is the first field of `instance`
pub fn virtual_table_entry<R: ReadMemory + ?Sized>(
    memory: &R,
    instance: u64,
    index: usize,
) -> Result<u64> {
    let vtable = memory.read_pointer(instance)?;
    let slot = index
        .checked_mul(memory.pointer_size())
        .and_then(|offset| u64::try_from(offset).ok())
        .and_then(|offset| vtable.checked_add(offset))
        .ok_or_else(|| Error::MemoryReadFailed {
            address: vtable,
            message: format!("vtable slot {} out of address range", index),
        })?;
    memory.read_pointer(slot)
}

/// Destination of the `call rel32` / `jmp rel32` instruction at `address`
pub fn relative_jump_target<R: ReadMemory + ?Sized>(memory: &R, address: u64) -> Result<u64> {
    let opcode = memory.read_u8(address)?;
    if !REL32_OPCODES.contains(&opcode) {
        return Err(Error::MemoryReadFailed {
            address,
            message: format!("expected rel32 call/jmp, found opcode {:02X}", opcode),
        });
    }

    let out_of_range = || Error::MemoryReadFailed {
        address,
        message: "rel32 instruction out of address range".to_string(),
    };
    let disp_address = address.checked_add(REL32_DISP_OFFSET).ok_or_else(out_of_range)?;
    let next_ip = address.checked_add(REL32_INSTR_LEN).ok_or_else(out_of_range)?;

    let disp = memory.read_i32(disp_address)?;
    next_ip
        .checked_add_signed(disp as i64)
        .ok_or_else(out_of_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySnapshot;
    use serde_json::json;

    const IMAGE_BASE: u64 = 0x1000_0000;

    /// Image with a `call` at +0x20 targeting +0x80 and a marker at +0x80
    fn engine_image() -> Vec<u8> {
        let mut image = vec![0xCCu8; 0x100];
        image[0x18..0x20].copy_from_slice(&[0x55, 0x8B, 0xEC, 0x6A, 0x01, 0x6A, 0x02, 0x90]);
        image[0x20] = 0xE8;
        let disp: i32 = 0x80 - (0x20 + 5);
        image[0x21..0x25].copy_from_slice(&disp.to_le_bytes());
        image[0x80..0x84].copy_from_slice(&[0x56, 0x57, 0x8B, 0xF1]);
        image
    }

    fn snapshot() -> MemorySnapshot {
        MemorySnapshot::new()
            .with_pointer_size(4)
            .with_module("engine.dll", IMAGE_BASE, engine_image())
    }

    #[test]
    fn test_pattern_with_offset() {
        let memory = snapshot();
        let registry = KeyValueRegistry::new();
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        let value = json!({ "Module": "engine.dll", "Pattern": "55 8B EC 6A ?? 6A 02" });
        assert_eq!(resolver.resolve(&value), Some(IMAGE_BASE + 0x18));

        let value = json!({ "Module": "engine.dll", "Pattern": "55 8B EC", "Offset": 8 });
        assert_eq!(resolver.resolve(&value), Some(IMAGE_BASE + 0x20));

        let value = json!({ "Module": "engine.dll", "Pattern": "56 57 8B F1", "Offset": -0x60 });
        assert_eq!(resolver.resolve(&value), Some(IMAGE_BASE + 0x20));
    }

    #[test]
    fn test_relative_jump() {
        let memory = snapshot();
        let registry = KeyValueRegistry::new();
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        let value = json!({
            "Module": "engine.dll",
            "Pattern": "6A 02 90 E8",
            "Offset": 3,
            "IsRelativeJump": true
        });
        assert_eq!(resolver.resolve(&value), Some(IMAGE_BASE + 0x80));
    }

    #[test]
    fn test_relative_jump_backwards() {
        let mut image = vec![0x90u8; 0x40];
        image[0x30] = 0xE9;
        let disp: i32 = 0x10 - (0x30 + 5);
        image[0x31..0x35].copy_from_slice(&disp.to_le_bytes());
        let memory = MemorySnapshot::new().with_region(0x2000, image);

        assert_eq!(relative_jump_target(&memory, 0x2030).unwrap(), 0x2010);
    }

    #[test]
    fn test_relative_jump_requires_rel32_opcode() {
        let memory = snapshot();
        let registry = KeyValueRegistry::new();
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        let value = json!({ "Module": "engine.dll", "Pattern": "55 8B EC", "IsRelativeJump": 1 });
        assert_eq!(resolver.resolve(&value), None);
    }

    #[test]
    fn test_pattern_not_found() {
        let memory = snapshot();
        let registry = KeyValueRegistry::new();
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        let value = json!({ "Module": "engine.dll", "Pattern": "DE AD BE EF" });
        assert_eq!(resolver.resolve(&value), None);

        let value = json!({ "Module": "client.dll", "Pattern": "55 8B EC" });
        assert_eq!(resolver.resolve(&value), None);
    }

    #[test]
    fn test_malformed_offset_is_not_found() {
        let memory = snapshot();
        let registry = KeyValueRegistry::new();
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        let value = json!({ "Module": "engine.dll", "Pattern": "55 8B EC", "Offset": "eight" });
        assert_eq!(resolver.resolve(&value), None);
    }

    #[test]
    fn test_nothing_to_resolve() {
        let memory = snapshot();
        let registry = KeyValueRegistry::new();
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        assert_eq!(resolver.resolve(&json!({ "Enabled": true })), None);
        assert_eq!(resolver.resolve(&json!(1)), None);
    }

    /// Object at 0x5000 whose vtable at 0x6000 holds three entries
    fn object_memory() -> MemorySnapshot {
        let vtable: Vec<u8> = [0x1000_1000u32, 0x1000_2000, 0x1000_3000]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();

        MemorySnapshot::new()
            .with_pointer_size(4)
            .with_region(0x5000, 0x6000u32.to_le_bytes().to_vec())
            .with_region(0x6000, vtable)
    }

    #[test]
    fn test_virtual_by_registry_name() {
        let memory = object_memory();
        let mut registry = KeyValueRegistry::new();
        registry.set_pointer("EngineClient", 0x5000);
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        let value = json!({ "VTIndex": 2, "VTPtrName": "EngineClient" });
        assert_eq!(resolver.resolve(&value), Some(0x1000_3000));
    }

    #[test]
    fn test_virtual_missing_or_mistyped_instance() {
        let memory = object_memory();
        let mut registry = KeyValueRegistry::new();
        registry.set("EngineClient", 0x5000u32);
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        let value = json!({ "VTIndex": 0, "VTPtrName": "EngineClient" });
        assert_eq!(resolver.resolve(&value), None);

        let value = json!({ "VTIndex": 0, "VTPtrName": "Unknown" });
        assert_eq!(resolver.resolve(&value), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_virtual_at_raw_instance() {
        let memory = object_memory();
        let registry = KeyValueRegistry::new();
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        assert_eq!(
            resolver.resolve_virtual_at(0x5000, &json!({ "VTIndex": 1 })),
            Some(0x1000_2000)
        );
        assert_eq!(resolver.virtual_address_from_index(0x5000, 0), Some(0x1000_1000));
        assert_eq!(resolver.virtual_address_from_index(0x5000, 3), None);
        assert_eq!(resolver.resolve_virtual_at(0x5000, &json!({})), None);
    }

    #[test]
    fn test_huge_vtable_index_is_not_found() {
        let memory = object_memory();
        let mut registry = KeyValueRegistry::new();
        registry.set_pointer("EngineClient", 0x5000);
        let resolver = AddressResolver::new(&memory, &memory, &registry);

        let value = json!({ "VTIndex": i64::MAX as u64, "VTPtrName": "EngineClient" });
        assert_eq!(resolver.resolve(&value), None);
        assert_eq!(resolver.virtual_address_from_index(0x5000, usize::MAX), None);
    }

    #[test]
    fn test_vtable_pointer_near_end_of_address_space() {
        let memory = MemorySnapshot::new()
            .with_pointer_size(8)
            .with_region(0x5000, 0xFFFF_FFFF_FFFF_FFF8u64.to_le_bytes().to_vec());

        let err = virtual_table_entry(&memory, 0x5000, 2).unwrap_err();
        assert!(matches!(err, Error::MemoryReadFailed { .. }));
    }

    #[test]
    fn test_relative_jump_at_end_of_address_space() {
        let memory = MemorySnapshot::new().with_region(u64::MAX - 1, vec![0xE8]);
        assert!(relative_jump_target(&memory, u64::MAX - 1).is_err());

        // Displacement pointing past the end of the address space
        let mut code = vec![0xE9];
        code.extend_from_slice(&i32::MAX.to_le_bytes());
        let memory = MemorySnapshot::new().with_region(0xFFFF_FFFF_FFFF_0000, code);
        assert!(relative_jump_target(&memory, 0xFFFF_FFFF_FFFF_0000).is_err());
    }

    #[test]
    fn test_virtual_table_entry_64bit() {
        let vtable: Vec<u8> = [0x1_4000_1000u64, 0x1_4000_2000]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let memory = MemorySnapshot::new()
            .with_pointer_size(8)
            .with_region(0x7000, 0x8000u64.to_le_bytes().to_vec())
            .with_region(0x8000, vtable);

        assert_eq!(virtual_table_entry(&memory, 0x7000, 1).unwrap(), 0x1_4000_2000);
    }
}
