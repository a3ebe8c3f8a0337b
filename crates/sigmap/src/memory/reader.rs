use crate::error::{Error, Result};

/// Read access to the memory of the host process.
///
/// Addresses are plain `u64` values regardless of the host's pointer width;
/// `read_pointer` honors `pointer_size` when reading pointer-sized slots.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Size in bytes of a pointer in the inspected image
    fn pointer_size(&self) -> usize {
        std::mem::size_of::<usize>()
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        let bytes = to_array::<1>(self.read_bytes(address, 1)?, address)?;
        Ok(bytes[0])
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = to_array::<4>(self.read_bytes(address, 4)?, address)?;
        Ok(i32::from_le_bytes(bytes))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = to_array::<4>(self.read_bytes(address, 4)?, address)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = to_array::<8>(self.read_bytes(address, 8)?, address)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Read a pointer-sized value, zero-extended to `u64`
    fn read_pointer(&self, address: u64) -> Result<u64> {
        match self.pointer_size() {
            4 => self.read_u32(address).map(u64::from),
            8 => self.read_u64(address),
            other => Err(Error::MemoryReadFailed {
                address,
                message: format!("unsupported pointer size {}", other),
            }),
        }
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }

    fn pointer_size(&self) -> usize {
        (**self).pointer_size()
    }
}

fn to_array<const N: usize>(bytes: Vec<u8>, address: u64) -> Result<[u8; N]> {
    let len = bytes.len();
    bytes.try_into().map_err(|_| Error::MemoryReadFailed {
        address,
        message: format!("short read: expected {} bytes, got {}", N, len),
    })
}
