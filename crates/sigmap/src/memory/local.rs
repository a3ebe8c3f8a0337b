use crate::error::{Error, Result};

use super::ReadMemory;

/// Reads the memory of the process this library is loaded into.
///
/// This is the only place raw addresses taken from the host image are read.
/// Reads go through `ReadProcessMemory` on the current process on Windows and
/// through `/proc/self/mem` on Linux, so an unmapped page yields an error
/// instead of a fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMemory;

impl LocalMemory {
    pub fn new() -> Self {
        Self
    }
}

impl ReadMemory for LocalMemory {
    #[cfg(target_os = "windows")]
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
        use windows::Win32::System::Threading::GetCurrentProcess;

        if address == 0 {
            return Err(Error::MemoryReadFailed {
                address,
                message: "null address".to_string(),
            });
        }

        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0usize;

        // SAFETY: the destination buffer is `size` bytes long and owned here;
        // the source range is validated by the kernel.
        unsafe {
            ReadProcessMemory(
                GetCurrentProcess(),
                address as *const std::ffi::c_void,
                buffer.as_mut_ptr().cast(),
                size,
                Some(&mut bytes_read as *mut usize),
            )
        }
        .map_err(|e| Error::MemoryReadFailed {
            address,
            message: e.to_string(),
        })?;

        buffer.truncate(bytes_read);
        Ok(buffer)
    }

    #[cfg(target_os = "linux")]
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        use std::fs::File;
        use std::os::unix::fs::FileExt;

        if address == 0 {
            return Err(Error::MemoryReadFailed {
                address,
                message: "null address".to_string(),
            });
        }

        // Unmapped pages fail with EIO instead of faulting.
        let read_failed = |e: std::io::Error| Error::MemoryReadFailed {
            address,
            message: e.to_string(),
        };
        let mem = File::open("/proc/self/mem").map_err(read_failed)?;

        let mut buffer = vec![0u8; size];
        let mut filled = 0;
        while filled < size {
            let n = mem
                .read_at(&mut buffer[filled..], address.saturating_add(filled as u64))
                .map_err(read_failed)?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        buffer.truncate(filled);
        Ok(buffer)
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    fn read_bytes(&self, address: u64, _size: usize) -> Result<Vec<u8>> {
        Err(Error::MemoryReadFailed {
            address,
            message: "in-process reads are not supported on this platform".to_string(),
        })
    }
}
