//! DLLs loaded into the current process.
//!
//! Loading through the OS loader rather than parsing the file keeps working
//! when the module is packed: by the time `LoadLibraryW` returns, the image
//! has been unpacked into memory.

use std::path::Path;

use tracing::{debug, warn};
use windows::Win32::Foundation::{FreeLibrary, HMODULE};
use windows::Win32::System::LibraryLoader::LoadLibraryW;
use windows::Win32::System::Memory::{PAGE_EXECUTE_READWRITE, PAGE_PROTECTION_FLAGS, VirtualProtect};
use windows::Win32::System::ProcessStatus::{GetModuleInformation, MODULEINFO};
use windows::Win32::System::Threading::GetCurrentProcess;
use windows::core::HSTRING;

use super::ModuleImage;
use crate::error::{Error, Result};

/// A module mapped into this process, readable across its whole range.
pub struct LoadedModule {
    handle: HMODULE,
    base: *const u8,
    size: usize,
}

impl LoadedModule {
    /// Load `path`, then make every page of the module readable.
    ///
    /// The module's dependencies are resolved by the OS loader, so callers
    /// usually switch the working directory to the module's folder first.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let wide = HSTRING::from(path.as_os_str());

        // SAFETY: LoadLibraryW only reads the provided NUL-terminated wide string.
        let handle = unsafe { LoadLibraryW(&wide) }.map_err(|e| {
            Error::ModuleLoad(format!("LoadLibraryW({}) failed: {}", path.display(), e))
        })?;

        let mut info = MODULEINFO::default();
        // SAFETY: `info` is a valid MODULEINFO and the size passed matches it.
        let queried = unsafe {
            GetModuleInformation(
                GetCurrentProcess(),
                handle,
                &mut info,
                std::mem::size_of::<MODULEINFO>() as u32,
            )
        };
        if let Err(e) = queried {
            // SAFETY: `handle` was returned by LoadLibraryW above.
            let _ = unsafe { FreeLibrary(handle) };
            return Err(Error::ModuleLoad(format!("GetModuleInformation failed: {}", e)));
        }

        let base = info.lpBaseOfDll as *const u8;
        let size = info.SizeOfImage as usize;

        let mut old_protection = PAGE_PROTECTION_FLAGS::default();
        // SAFETY: the range [base, base + size) is the module mapping reported by the loader.
        let protected = unsafe {
            VirtualProtect(
                base as *const _,
                size,
                PAGE_EXECUTE_READWRITE,
                &mut old_protection,
            )
        };
        if let Err(e) = protected {
            // SAFETY: `handle` was returned by LoadLibraryW above.
            let _ = unsafe { FreeLibrary(handle) };
            return Err(Error::ModuleLoad(format!("VirtualProtect failed: {}", e)));
        }

        debug!(
            "Loaded {} at 0x{:X} ({:#x} bytes)",
            path.display(),
            base as u64,
            size
        );

        Ok(Self { handle, base, size })
    }
}

impl ModuleImage for LoadedModule {
    fn base_address(&self) -> u64 {
        self.base as u64
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: the whole module range was made readable in `load` and stays
        // mapped until the library is freed in `drop`.
        unsafe { std::slice::from_raw_parts(self.base, self.size) }
    }
}

impl Drop for LoadedModule {
    fn drop(&mut self) {
        // SAFETY: `handle` came from LoadLibraryW and is freed exactly once.
        if let Err(e) = unsafe { FreeLibrary(self.handle) } {
            warn!("FreeLibrary failed: {}", e);
        }
    }
}
