/*!
 * Address Wait Integration Tests
 *
 * End-to-end behavior of the process-wide waiter and the raw entry points
 */

use ai_os_compat::abi::{WaitOnAddress, WakeByAddressAll, WakeByAddressSingle, FALSE, TRUE};
use ai_os_compat::core::errors::{ERROR_INVALID_PARAMETER, ERROR_TIMEOUT};
use ai_os_compat::core::last_error::last_error;
use ai_os_compat::core::sync::INFINITE;
use ai_os_compat::{
    address_waiter, wait_on_address, wake_by_address_all, wake_by_address_single, AddressWaiter,
    CompatError, StaticResolver, SyncConfig, Waitable,
};
use std::ffi::c_void;
use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn fallback_waiter(config: SyncConfig) -> Arc<AddressWaiter> {
    let resolver: &'static StaticResolver = Box::leak(Box::new(StaticResolver::new()));
    Arc::new(AddressWaiter::with_resolver(resolver, config))
}

#[test]
fn test_end_to_end_wait_then_wake_all() {
    let value = Arc::new(AtomicU32::new(0));

    let writer = {
        let value = value.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            value.store(1, Ordering::Release);
            wake_by_address_all(value.as_ref());
        })
    };

    let start = Instant::now();
    let result = wait_on_address(value.as_ref(), 0, 5000u32);
    let elapsed = start.elapsed();

    assert!(result.is_ok());
    assert!(elapsed < Duration::from_millis(2000), "took {:?}", elapsed);
    writer.join().unwrap();
}

#[test]
fn test_changed_value_returns_immediately_all_widths() {
    let start = Instant::now();

    assert!(wait_on_address(&AtomicU8::new(1), 0, INFINITE).is_ok());
    assert!(wait_on_address(&AtomicU16::new(1), 0, INFINITE).is_ok());
    assert!(wait_on_address(&AtomicU32::new(1), 0, INFINITE).is_ok());
    assert!(wait_on_address(&AtomicU64::new(1), 0, INFINITE).is_ok());

    assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn test_concurrent_writer_all_widths() {
    let waiter = fallback_waiter(SyncConfig::default());
    let byte = Arc::new(AtomicU8::new(0));
    let half = Arc::new(AtomicU16::new(0xBEEF));
    let wide = Arc::new(AtomicU64::new(u64::MAX));

    let writer = {
        let byte = byte.clone();
        let half = half.clone();
        let wide = wide.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            byte.store(1, Ordering::Release);
            half.store(0, Ordering::Release);
            // Change only the high half of the 8-byte value
            wide.store(0x0000_0000_FFFF_FFFF, Ordering::Release);
        })
    };

    let start = Instant::now();
    assert!(waiter.wait(byte.as_ref(), 0, 5000u32).is_ok());

    let expected_half = 0xBEEFu16;
    let expected_wide = u64::MAX;
    unsafe {
        assert!(waiter
            .wait_raw(half.address(), &expected_half as *const u16 as *const c_void, 2, 5000)
            .is_ok());
        assert!(waiter
            .wait_raw(wide.address(), &expected_wide as *const u64 as *const c_void, 8, 5000)
            .is_ok());
    }
    assert!(start.elapsed() < Duration::from_millis(2000));
    writer.join().unwrap();
}

#[test]
fn test_zero_timeout_unchanged_value() {
    let value = AtomicU32::new(42);
    let start = Instant::now();

    assert_eq!(wait_on_address(&value, 42, 0u32), Err(CompatError::Timeout));
    assert!(start.elapsed() < Duration::from_millis(50));
}

#[test]
fn test_wake_without_waiters() {
    let value = AtomicU32::new(0);
    for _ in 0..1000 {
        wake_by_address_single(&value);
        wake_by_address_all(&value);
    }

    let park = fallback_waiter(SyncConfig::low_latency());
    park.wake_one(&value);
    park.wake_all(&value);
}

#[test]
fn test_park_fallback_wake_one_each() {
    let waiter = fallback_waiter(SyncConfig {
        poll_interval: Duration::from_secs(2),
        ..SyncConfig::low_latency()
    });
    let flags: Arc<Vec<AtomicU32>> = Arc::new((0..4).map(|_| AtomicU32::new(0)).collect());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let waiter = waiter.clone();
            let flags = flags.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let result = waiter.wait(&flags[i], 0, 10_000u32);
                (result, start.elapsed())
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(100));
    for flag in flags.iter() {
        flag.store(1, Ordering::SeqCst);
        waiter.wake_one(flag);
    }

    for handle in handles {
        let (result, elapsed) = handle.join().unwrap();
        assert!(result.is_ok());
        assert!(elapsed < Duration::from_millis(1500), "took {:?}", elapsed);
    }
}

#[test]
fn test_raw_entry_points_set_last_error() {
    let value = AtomicU32::new(7);
    let same = 7u32;
    let address = value.address();
    let compare = &same as *const u32 as *const c_void;

    unsafe {
        assert_eq!(WaitOnAddress(address, compare, 3, 0), FALSE);
        assert_eq!(last_error(), ERROR_INVALID_PARAMETER);

        assert_eq!(WaitOnAddress(address, compare, 4, 0), FALSE);
        assert_eq!(last_error(), ERROR_TIMEOUT);

        let other = 8u32;
        let other = &other as *const u32 as *const c_void;
        assert_eq!(WaitOnAddress(address, other, 4, INFINITE), TRUE);

        WakeByAddressSingle(address);
        WakeByAddressAll(address);
    }

    assert_eq!(address_waiter().probe_count(), 1);
}
