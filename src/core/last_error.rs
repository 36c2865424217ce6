/*!
 * Last-Error Slot
 *
 * Per-thread error code set by the ABI entry points on failure.
 * On Windows this is the real OS slot so native and compat paths agree;
 * elsewhere it is a thread-local.
 */

use super::errors::CompatError;

#[cfg(windows)]
pub fn set_last_error(code: u32) {
    // SAFETY: SetLastError only writes the calling thread's TEB slot.
    unsafe { windows_sys::Win32::Foundation::SetLastError(code) }
}

#[cfg(windows)]
pub fn last_error() -> u32 {
    // SAFETY: GetLastError only reads the calling thread's TEB slot.
    unsafe { windows_sys::Win32::Foundation::GetLastError() }
}

#[cfg(not(windows))]
thread_local! {
    static LAST_ERROR: std::cell::Cell<u32> = const { std::cell::Cell::new(0) };
}

#[cfg(not(windows))]
pub fn set_last_error(code: u32) {
    LAST_ERROR.with(|slot| slot.set(code));
}

#[cfg(not(windows))]
pub fn last_error() -> u32 {
    LAST_ERROR.with(|slot| slot.get())
}

/// Store the code for `err` in the calling thread's slot
#[inline]
pub fn record(err: &CompatError) {
    set_last_error(err.code());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_last_error_is_per_thread() {
        set_last_error(1460);
        assert_eq!(last_error(), 1460);

        let other = thread::spawn(|| {
            set_last_error(31);
            last_error()
        })
        .join()
        .unwrap();

        assert_eq!(other, 31);
        assert_eq!(last_error(), 1460);
    }

    #[test]
    fn test_record() {
        record(&CompatError::GenerationFailure);
        assert_eq!(last_error(), 31);
    }
}
