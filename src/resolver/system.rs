/*!
 * System Resolver
 *
 * Resolves entry points through the OS loader:
 * - Windows: `GetModuleHandleA`, then `LoadLibraryA`, then `GetProcAddress`
 * - Unix: `dlopen` + `dlsym`
 *
 * Loaded modules are never unloaded; the handles live for the process.
 */

use super::builtin::{self, BUILTIN_MODULE};
use super::traits::{FunctionHandle, SymbolResolver};
use std::ffi::CString;
use tracing::debug;

/// Resolver backed by the host's dynamic loader
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    #[cfg(windows)]
    fn load(&self, module: &CString, symbol: &CString) -> Option<FunctionHandle> {
        use windows_sys::Win32::System::LibraryLoader::{
            GetModuleHandleA, GetProcAddress, LoadLibraryA,
        };

        // SAFETY: both names are NUL-terminated and outlive the calls.
        unsafe {
            let mut handle = GetModuleHandleA(module.as_ptr().cast());
            if handle == 0 {
                handle = LoadLibraryA(module.as_ptr().cast());
            }
            if handle == 0 {
                return None;
            }
            let proc = GetProcAddress(handle, symbol.as_ptr().cast())?;
            FunctionHandle::from_ptr(proc as *mut std::ffi::c_void)
        }
    }

    #[cfg(unix)]
    fn load(&self, module: &CString, symbol: &CString) -> Option<FunctionHandle> {
        // SAFETY: both names are NUL-terminated and outlive the calls.
        unsafe {
            let handle = libc::dlopen(module.as_ptr(), libc::RTLD_LAZY | libc::RTLD_LOCAL);
            if handle.is_null() {
                return None;
            }
            FunctionHandle::from_ptr(libc::dlsym(handle, symbol.as_ptr()))
        }
    }

    #[cfg(not(any(unix, windows)))]
    fn load(&self, _module: &CString, _symbol: &CString) -> Option<FunctionHandle> {
        None
    }
}

impl SymbolResolver for SystemResolver {
    fn resolve(&self, module: &str, symbol: &str) -> Option<FunctionHandle> {
        if module == BUILTIN_MODULE {
            return builtin::lookup(symbol);
        }

        let (Ok(c_module), Ok(c_symbol)) = (CString::new(module), CString::new(symbol)) else {
            return None;
        };

        let handle = self.load(&c_module, &c_symbol);
        debug!(module, symbol, found = handle.is_some(), "Symbol lookup");
        handle
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_module() {
        let resolver = SystemResolver;
        assert!(resolver
            .resolve("definitely-not-a-module-7f3a.dll", "Anything")
            .is_none());
    }

    #[test]
    fn test_interior_nul_is_not_found() {
        assert!(SystemResolver.resolve("kernel\0.dll", "WaitOnAddress").is_none());
    }

    #[test]
    fn test_builtin_module_served() {
        assert!(SystemResolver
            .resolve(BUILTIN_MODULE, "SystemFunction036")
            .is_some());
    }
}
