use serde::Serialize;

/// Base address and size of one loaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleInformation {
    pub base_address: u64,
    pub size: usize,
}

impl ModuleInformation {
    pub fn new(base_address: u64, size: usize) -> Self {
        Self { base_address, size }
    }
}

/// Looks up loaded images by name.
pub trait ModuleProvider {
    fn module_info(&self, name: &str) -> Option<ModuleInformation>;
}

impl<T: ModuleProvider + ?Sized> ModuleProvider for &T {
    fn module_info(&self, name: &str) -> Option<ModuleInformation> {
        (**self).module_info(name)
    }
}

/// Images loaded into the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadedModules;

impl LoadedModules {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "windows")]
impl ModuleProvider for LoadedModules {
    fn module_info(&self, name: &str) -> Option<ModuleInformation> {
        use windows::Win32::System::LibraryLoader::GetModuleHandleW;
        use windows::Win32::System::ProcessStatus::{GetModuleInformation, MODULEINFO};
        use windows::Win32::System::Threading::GetCurrentProcess;
        use windows::core::HSTRING;

        let wide_name = HSTRING::from(name);

        // SAFETY: GetModuleHandleW does not take ownership of the name and the
        // returned handle is not freed (no reference count is added).
        let module = match unsafe { GetModuleHandleW(&wide_name) } {
            Ok(handle) => handle,
            Err(e) => {
                tracing::debug!("Module {} not loaded: {}", name, e);
                return None;
            }
        };

        let mut info = MODULEINFO::default();
        // SAFETY: `info` is a valid MODULEINFO and cb matches its size.
        let result = unsafe {
            GetModuleInformation(
                GetCurrentProcess(),
                module,
                &mut info,
                std::mem::size_of::<MODULEINFO>() as u32,
            )
        };

        if let Err(e) = result {
            tracing::warn!("Failed to query module information for {}: {}", name, e);
            return None;
        }

        Some(ModuleInformation {
            base_address: info.lpBaseOfDll as u64,
            size: info.SizeOfImage as usize,
        })
    }
}

#[cfg(not(target_os = "windows"))]
impl ModuleProvider for LoadedModules {
    fn module_info(&self, name: &str) -> Option<ModuleInformation> {
        tracing::debug!("Module lookup for {} is only supported on Windows", name);
        None
    }
}
