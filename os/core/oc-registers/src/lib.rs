//! # Typed Overclocking Registers
//!
//! Register access for the pre-boot clock and voltage configuration routine.
//!
//! ## Overview
//!
//! Everything the routine does to the processor goes through one narrow seam,
//! the [`RegisterBus`] trait. It has exactly four primitives:
//!
//! | Primitive | Meaning |
//! |-----------|---------|
//! | [`read_msr`](RegisterBus::read_msr) | `RDMSR` of a 64-bit model-specific register |
//! | [`write_msr`](RegisterBus::write_msr) | `WRMSR` of a 64-bit model-specific register |
//! | [`read_mmio32`](RegisterBus::read_mmio32) | volatile 32-bit load from a chipset register |
//! | [`write_mmio32`](RegisterBus::write_mmio32) | volatile 32-bit store to a chipset register |
//!
//! Processor identification is not a register access and lives behind the
//! separate [`Cpuid`] trait. A [`Platform`] is anything that provides both.
//!
//! On top of the raw bus, each register the routine touches is modelled as a
//! `bitfield-struct` view implementing [`ModelSpecificRegister`], so callers
//! write `FlexRatio::load(bus).with_oc_lock(true).store(bus)` instead of
//! shifting and masking by hand.
//!
//! ## Backends
//!
//! * [`NativePlatform`] (feature `asm`) executes `rdmsr`/`wrmsr`/`cpuid` and
//!   volatile pointer accesses. Constructing it is `unsafe`: it is only valid at
//!   CPL0 on the bootstrap processor.
//! * [`sim::SimPlatform`] (feature `sim`) is an in-memory register file with an
//!   access log and a scripted mailbox, used by the tests of the crates above.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(any(test, feature = "sim"))]
extern crate alloc;

/// Implements [`ModelSpecificRegister`] for a `#[bitfield(u64)]` type.
macro_rules! impl_msr {
    ($ty:ty, $index:expr) => {
        impl $crate::ModelSpecificRegister for $ty {
            const MSR: $crate::Msr = $crate::Msr::new($index);

            #[inline]
            fn from_raw(raw: u64) -> Self {
                Self::from_bits(raw)
            }

            #[inline]
            fn into_raw(self) -> u64 {
                self.into_bits()
            }
        }
    };
}

pub(crate) use impl_msr;

pub mod cpuid;
mod mmio;
pub mod msr;

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
mod native;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use cpuid::{BrandString, Cpuid, CpuidResult, ProcessorSignature};
pub use mmio::MmioAddress;
pub use msr::Msr;

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
pub use native::NativePlatform;

/// The four register primitives everything else is built on.
///
/// Implementations perform no validation of the values read or written;
/// interpreting them is up to the caller.
///
/// For the hardware backend, all four are privileged operations. Being allowed
/// to execute them is a precondition established when the backend is created,
/// not something checked on each call.
pub trait RegisterBus {
    /// Reads the 64-bit value of a model-specific register.
    fn read_msr(&mut self, msr: Msr) -> u64;

    /// Writes a 64-bit value to a model-specific register.
    fn write_msr(&mut self, msr: Msr, value: u64);

    /// Reads a 32-bit memory-mapped chipset register.
    fn read_mmio32(&mut self, address: MmioAddress) -> u32;

    /// Writes a 32-bit memory-mapped chipset register.
    fn write_mmio32(&mut self, address: MmioAddress, value: u32);
}

/// A register bus that can also identify the processor it is running on.
pub trait Platform: RegisterBus + Cpuid {}

impl<T> Platform for T where T: RegisterBus + Cpuid {}

/// A typed view of a single model-specific register.
pub trait ModelSpecificRegister: Sized + Copy {
    /// The register this view describes.
    const MSR: Msr;

    /// Wraps a raw register value.
    fn from_raw(raw: u64) -> Self;

    /// Returns the raw register value.
    fn into_raw(self) -> u64;

    /// Reads the register through `bus`.
    #[inline]
    fn load<B>(bus: &mut B) -> Self
    where
        B: RegisterBus + ?Sized,
    {
        Self::from_raw(bus.read_msr(Self::MSR))
    }

    /// Writes the register through `bus`.
    #[inline]
    fn store<B>(self, bus: &mut B)
    where
        B: RegisterBus + ?Sized,
    {
        bus.write_msr(Self::MSR, self.into_raw());
    }
}
