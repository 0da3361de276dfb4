//! Hardware backend.

use crate::cpuid::{self, Cpuid, CpuidResult};
use crate::{MmioAddress, Msr, RegisterBus};

/// Executes register accesses on the processor it runs on.
#[derive(Debug)]
pub struct NativePlatform {
    _private: (),
}

impl NativePlatform {
    /// # Safety
    /// The caller must be running at CPL0 (firmware context) on a single
    /// logical processor, and no other processor may touch the package-scoped
    /// registers while this value is in use. Every MSR and MMIO address later
    /// passed to it must exist on this platform.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for NativePlatform {
    #[inline]
    fn read_msr(&mut self, msr: Msr) -> u64 {
        // SAFETY: established by `NativePlatform::new`.
        unsafe { msr.load_raw() }
    }

    #[inline]
    fn write_msr(&mut self, msr: Msr, value: u64) {
        // SAFETY: established by `NativePlatform::new`.
        unsafe { msr.store_raw(value) }
    }

    #[inline]
    fn read_mmio32(&mut self, address: MmioAddress) -> u32 {
        // SAFETY: established by `NativePlatform::new`.
        unsafe { address.load_raw() }
    }

    #[inline]
    fn write_mmio32(&mut self, address: MmioAddress, value: u32) {
        // SAFETY: established by `NativePlatform::new`.
        unsafe { address.store_raw(value) }
    }
}

impl Cpuid for NativePlatform {
    #[inline]
    fn cpuid(&mut self, leaf: u32, subleaf: u32) -> CpuidResult {
        // SAFETY: CPUID is always available in long mode.
        unsafe { cpuid::cpuid(leaf, subleaf) }
    }
}
