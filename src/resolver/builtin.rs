/*!
 * Builtin Module
 *
 * Entry points this crate provides itself, served by `SystemResolver`
 * under the module name [`BUILTIN_MODULE`]. Hosts without the legacy OS
 * random export still get a `SystemFunction036`-compatible provider.
 */

use super::traits::FunctionHandle;
use std::ffi::c_void;

pub const BUILTIN_MODULE: &str = "ai-os-compat";

/// `SystemFunction036`-compatible shim over the OS secure random source
///
/// Returns a BOOLEAN: 1 on success, 0 on failure.
unsafe extern "system" fn gen_random(buffer: *mut c_void, length: u32) -> u8 {
    if length == 0 {
        return 1;
    }
    if buffer.is_null() {
        return 0;
    }
    let out = std::slice::from_raw_parts_mut(buffer.cast::<u8>(), length as usize);
    match getrandom::getrandom(out) {
        Ok(()) => 1,
        Err(err) => {
            tracing::debug!(error = %err, "builtin random source failed");
            0
        }
    }
}

/// Look up a builtin entry point
pub fn lookup(symbol: &str) -> Option<FunctionHandle> {
    match symbol {
        "SystemFunction036" => FunctionHandle::from_address(gen_random as usize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::GenRandomFn;

    #[test]
    fn test_builtin_gen_random() {
        let handle = lookup("SystemFunction036").unwrap();
        let gen: GenRandomFn = unsafe { handle.cast() };

        let mut buf = [0u8; 64];
        let ok = unsafe { gen(buf.as_mut_ptr().cast(), buf.len() as u32) };
        assert_eq!(ok, 1);
        assert!(buf.iter().any(|&b| b != 0));

        assert_eq!(unsafe { gen(std::ptr::null_mut(), 0) }, 1);
        assert_eq!(unsafe { gen(std::ptr::null_mut(), 8) }, 0);
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(lookup("WaitOnAddress").is_none());
    }
}
