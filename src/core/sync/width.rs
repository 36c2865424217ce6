/*!
 * Width-Tagged Values
 *
 * Waits compare 1, 2, 4 or 8 bytes of caller memory. Each width has its own
 * variant and its own atomic load so a concurrent writer can never produce a
 * torn read.
 *
 * On 32-bit targets there is no single-instruction 64-bit load; the 8-byte
 * variant reads through a compare-exchange instead.
 */

use crate::core::errors::{CompatError, CompatResult};
use std::ffi::c_void;
use std::sync::atomic::{AtomicI16, AtomicI32, AtomicI8, AtomicU16, AtomicU32, AtomicU8, Ordering};

#[cfg(target_has_atomic = "64")]
use std::sync::atomic::AtomicU64;

#[cfg(not(target_has_atomic = "64"))]
use portable_atomic::AtomicU64;

/// Size of the compared value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    U8,
    U16,
    U32,
    U64,
}

impl AddressWidth {
    /// Width for a byte size, `None` unless the size is 1, 2, 4 or 8
    #[inline]
    pub const fn from_size(size: usize) -> Option<Self> {
        match size {
            1 => Some(AddressWidth::U8),
            2 => Some(AddressWidth::U16),
            4 => Some(AddressWidth::U32),
            8 => Some(AddressWidth::U64),
            _ => None,
        }
    }

    #[inline]
    pub const fn size(self) -> usize {
        match self {
            AddressWidth::U8 => 1,
            AddressWidth::U16 => 2,
            AddressWidth::U32 => 4,
            AddressWidth::U64 => 8,
        }
    }

    /// Whether `address` is suitably aligned for an atomic of this width
    #[inline]
    pub fn is_aligned(self, address: *const c_void) -> bool {
        (address as usize) & (self.size() - 1) == 0
    }
}

impl TryFrom<usize> for AddressWidth {
    type Error = CompatError;

    fn try_from(size: usize) -> CompatResult<Self> {
        Self::from_size(size).ok_or_else(|| {
            CompatError::InvalidArgument(format!(
                "address size {} is not 1, 2, 4 or 8 bytes",
                size
            ))
        })
    }
}

/// Immutable copy of a compared value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Snapshot {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
}

impl Snapshot {
    #[inline]
    pub const fn width(&self) -> AddressWidth {
        match self {
            Snapshot::U8(_) => AddressWidth::U8,
            Snapshot::U16(_) => AddressWidth::U16,
            Snapshot::U32(_) => AddressWidth::U32,
            Snapshot::U64(_) => AddressWidth::U64,
        }
    }

    /// Copy a comparand out of plain caller memory
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `width.size()` bytes. No alignment
    /// is required.
    #[inline]
    pub unsafe fn read(ptr: *const c_void, width: AddressWidth) -> Self {
        match width {
            AddressWidth::U8 => Snapshot::U8(ptr.cast::<u8>().read()),
            AddressWidth::U16 => Snapshot::U16(ptr.cast::<u16>().read_unaligned()),
            AddressWidth::U32 => Snapshot::U32(ptr.cast::<u32>().read_unaligned()),
            AddressWidth::U64 => Snapshot::U64(ptr.cast::<u64>().read_unaligned()),
        }
    }

    /// Atomically load the current value at a waited-on address
    ///
    /// # Safety
    ///
    /// `ptr` must be non-null, aligned to `width.size()`, valid for reads
    /// and writes for the duration of the call, and only accessed
    /// atomically by other threads meanwhile.
    #[inline]
    pub unsafe fn load(ptr: *const c_void, width: AddressWidth) -> Self {
        let ptr = ptr as *mut c_void;
        match width {
            AddressWidth::U8 => Snapshot::U8(AtomicU8::from_ptr(ptr.cast()).load(Ordering::Acquire)),
            AddressWidth::U16 => {
                Snapshot::U16(AtomicU16::from_ptr(ptr.cast()).load(Ordering::Acquire))
            }
            AddressWidth::U32 => {
                Snapshot::U32(AtomicU32::from_ptr(ptr.cast()).load(Ordering::Acquire))
            }
            AddressWidth::U64 => Snapshot::U64(load_u64(ptr.cast())),
        }
    }

    /// Pointer to the snapshot's bytes, valid while `self` is
    #[inline]
    pub fn as_ptr(&self) -> *const c_void {
        match self {
            Snapshot::U8(v) => (v as *const u8).cast(),
            Snapshot::U16(v) => (v as *const u16).cast(),
            Snapshot::U32(v) => (v as *const u32).cast(),
            Snapshot::U64(v) => (v as *const u64).cast(),
        }
    }
}

#[cfg(target_pointer_width = "64")]
#[inline]
unsafe fn load_u64(ptr: *mut u64) -> u64 {
    AtomicU64::from_ptr(ptr).load(Ordering::Acquire)
}

#[cfg(not(target_pointer_width = "64"))]
#[inline]
unsafe fn load_u64(ptr: *mut u64) -> u64 {
    // Swapping 0 for 0 never changes memory; either arm carries the current value.
    match AtomicU64::from_ptr(ptr).compare_exchange(0, 0, Ordering::AcqRel, Ordering::Acquire) {
        Ok(v) | Err(v) => v,
    }
}

/// Atomic integers that can be waited on
pub trait Waitable: Sync {
    type Value: Copy;

    const WIDTH: AddressWidth;

    /// Address of the underlying integer
    fn address(&self) -> *const c_void;

    /// Snapshot of a comparand value
    fn snapshot(value: Self::Value) -> Snapshot;
}

macro_rules! impl_waitable {
    ($($atomic:ty => $value:ty as $raw:ty, $variant:ident;)*) => {$(
        impl Waitable for $atomic {
            type Value = $value;

            const WIDTH: AddressWidth = AddressWidth::$variant;

            #[inline]
            fn address(&self) -> *const c_void {
                self.as_ptr() as *const c_void
            }

            #[inline]
            fn snapshot(value: $value) -> Snapshot {
                Snapshot::$variant(value as $raw)
            }
        }
    )*};
}

impl_waitable! {
    AtomicU8 => u8 as u8, U8;
    AtomicI8 => i8 as u8, U8;
    AtomicU16 => u16 as u16, U16;
    AtomicI16 => i16 as u16, U16;
    AtomicU32 => u32 as u32, U32;
    AtomicI32 => i32 as u32, U32;
}

#[cfg(target_has_atomic = "64")]
impl_waitable! {
    std::sync::atomic::AtomicU64 => u64 as u64, U64;
    std::sync::atomic::AtomicI64 => i64 as u64, U64;
}
