/*!
 * Symbol Resolution Traits
 *
 * The lookup facility is an external collaborator: given a module name and a
 * symbol name it either yields an entry point or nothing. Lookups never fail
 * loudly; "not available" is an ordinary answer.
 */

use serde::{Serialize, Serializer};
use std::ffi::c_void;
use std::fmt;
use std::ptr::NonNull;

/// Opaque address of a resolved entry point
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionHandle(NonNull<c_void>);

// SAFETY: a handle is a code address; it carries no thread affinity.
unsafe impl Send for FunctionHandle {}
unsafe impl Sync for FunctionHandle {}

impl FunctionHandle {
    /// Wrap a raw entry point, `None` for null
    #[inline]
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Wrap a function address, e.g. `my_fn as usize`
    #[inline]
    pub fn from_address(address: usize) -> Option<Self> {
        Self::from_ptr(address as *mut c_void)
    }

    #[inline]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    #[inline]
    pub fn address(self) -> usize {
        self.0.as_ptr() as usize
    }

    /// Reinterpret the handle as a typed function pointer
    ///
    /// # Safety
    ///
    /// `F` must be a function pointer type whose signature and calling
    /// convention match the entry point this handle was resolved from.
    #[inline]
    pub unsafe fn cast<F: Copy>(self) -> F {
        debug_assert_eq!(
            std::mem::size_of::<F>(),
            std::mem::size_of::<*mut c_void>()
        );
        std::mem::transmute_copy(&self.0.as_ptr())
    }
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionHandle({:#x})", self.address())
    }
}

impl Serialize for FunctionHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{:#x}", self.address()))
    }
}

/// Module/symbol lookup facility
///
/// Implementations must be cheap to share: resolvers are referenced from
/// process-wide statics.
pub trait SymbolResolver: Send + Sync {
    /// Look up `symbol` in `module`, `None` when either is missing
    fn resolve(&self, module: &str, symbol: &str) -> Option<FunctionHandle>;

    /// Resolver name for diagnostics
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "system" fn answer() -> u32 {
        42
    }

    #[test]
    fn test_handle_roundtrip_call() {
        let handle = FunctionHandle::from_address(answer as usize).unwrap();
        let f: unsafe extern "system" fn() -> u32 = unsafe { handle.cast() };
        assert_eq!(unsafe { f() }, 42);
    }

    #[test]
    fn test_null_handle() {
        assert!(FunctionHandle::from_ptr(std::ptr::null_mut()).is_none());
        assert!(FunctionHandle::from_address(0).is_none());
    }

    #[test]
    fn test_handle_serializes_as_hex() {
        let handle = FunctionHandle::from_address(0x1000).unwrap();
        assert_eq!(serde_json::to_string(&handle).unwrap(), r#""0x1000""#);
    }
}
