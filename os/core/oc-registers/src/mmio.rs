//! Memory-mapped chipset registers.

use core::fmt;

/// Physical address of a 32-bit memory-mapped register.
///
/// Pre-boot code runs identity-mapped, so the physical address is also the
/// pointer used for the access.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MmioAddress(u64);

impl MmioAddress {
    #[inline]
    #[must_use]
    pub const fn new(address: u64) -> Self {
        Self(address)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The address `offset` bytes further on.
    #[inline]
    #[must_use]
    pub const fn offset(self, offset: u64) -> Self {
        Self(self.0 + offset)
    }

    /// Volatile 32-bit load.
    ///
    /// # Safety
    /// The address must be identity-mapped, 4-byte aligned, and refer to a
    /// register that may be read without side effects the caller didn't expect.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn load_raw(self) -> u32 {
        let ptr = self.0 as usize as *const u32;
        unsafe { core::ptr::read_volatile(ptr) }
    }

    /// Volatile 32-bit store.
    ///
    /// # Safety
    /// Same as [`MmioAddress::load_raw`], and the register must be writable.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn store_raw(self, value: u32) {
        let ptr = self.0 as usize as *mut u32;
        unsafe { core::ptr::write_volatile(ptr, value) }
    }
}

impl fmt::Display for MmioAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}
