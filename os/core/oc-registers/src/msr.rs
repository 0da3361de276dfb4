//! # Model-Specific Registers (MSR)
//!
//! Index type and typed views of the registers used to unlock all-core turbo
//! on Haswell-EP/EX class processors.
//!
//! | Index   | Register | View |
//! |---------|----------|------|
//! | `0x08B` | `IA32_BIOS_SIGN_ID` | [`Ia32BiosSignId`] |
//! | `0x0CE` | `MSR_PLATFORM_INFO` | [`PlatformInfo`] |
//! | `0x150` | OC mailbox | [`OcMailbox`] |
//! | `0x194` | `MSR_FLEX_RATIO` | [`FlexRatio`] |
//! | `0x1AD`–`0x1AF` | `MSR_TURBO_RATIO_LIMIT{,1,2}` | [`TurboRatioLimit`] |
//! | `0x606` | `MSR_RAPL_POWER_UNIT` | [`RaplPowerUnit`] |
//! | `0x610` | `MSR_PKG_POWER_LIMIT` | [`PkgPowerLimit`] |
//! | `0x614` | `MSR_PKG_POWER_INFO` | [`PkgPowerInfo`] |
//! | `0x620` | `MSR_UNCORE_RATIO_LIMIT` | [`UncoreRatioLimit`] |
//!
//! ## References
//! - Intel SDM Vol. 4, "Model-Specific Registers", Tables 2-2 and 2-29 (Haswell-E)

mod flex_ratio;
mod ia32_bios_sign_id;
mod oc_mailbox;
mod pkg_power;
mod platform_info;
mod rapl_power_unit;
mod turbo_ratio_limit;
mod uncore_ratio_limit;

pub use flex_ratio::FlexRatio;
pub use ia32_bios_sign_id::Ia32BiosSignId;
pub use oc_mailbox::OcMailbox;
pub use pkg_power::{PkgPowerInfo, PkgPowerLimit};
pub use platform_info::PlatformInfo;
pub use rapl_power_unit::RaplPowerUnit;
pub use turbo_ratio_limit::TurboRatioLimit;
pub use uncore_ratio_limit::UncoreRatioLimit;

/// Identifies a **Model-Specific Register (MSR)** by its architectural index.
///
/// MSR indices are 32-bit identifiers used by the `rdmsr` and `wrmsr`
/// instructions to select which internal CPU register to access.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Msr(pub u32);

impl Msr {
    pub const IA32_BIOS_SIGN_ID: Self = Self(0x08B);
    pub const PLATFORM_INFO: Self = Self(0x0CE);
    pub const OC_MAILBOX: Self = Self(0x150);
    pub const FLEX_RATIO: Self = Self(0x194);
    pub const TURBO_RATIO_LIMIT: Self = Self(0x1AD);
    pub const TURBO_RATIO_LIMIT1: Self = Self(0x1AE);
    pub const TURBO_RATIO_LIMIT2: Self = Self(0x1AF);
    pub const RAPL_POWER_UNIT: Self = Self(0x606);
    pub const PKG_POWER_LIMIT: Self = Self(0x610);
    pub const PKG_POWER_INFO: Self = Self(0x614);
    pub const UNCORE_RATIO_LIMIT: Self = Self(0x620);

    /// Creates a new `Msr` from a raw index.
    #[inline(always)]
    #[allow(clippy::inline_always)]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the underlying raw MSR index.
    #[inline(always)]
    #[allow(clippy::inline_always)]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Write a 64-bit value to this **Model-Specific Register (MSR)**.
    ///
    /// # Safety
    /// - This executes the privileged `WRMSR` instruction, which is only valid at
    ///   **CPL=0**. Executing it in user mode raises **#GP(0)**.
    /// - The target MSR must be **valid and writable** on the current CPU.
    ///   Writing an invalid or reserved MSR causes a general protection fault.
    /// - Package-scoped registers (mailbox, ratio limits) must not be written
    ///   concurrently from several logical processors.
    #[cfg(all(feature = "asm", target_arch = "x86_64"))]
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    #[doc(alias = "wrmsr")]
    pub unsafe fn store_raw(self, val: u64) {
        let lo = (val & 0xFFFF_FFFF) as u32;
        let hi = (val >> 32) as u32;
        let msr = self.raw();
        unsafe {
            core::arch::asm!(
            "wrmsr",
            in("ecx") msr,
            in("eax") lo,
            in("edx") hi,
            options(nostack, preserves_flags)
            );
        }
    }

    /// Reads the 64-bit value from this **Model-Specific Register (MSR)**.
    ///
    /// # Safety
    /// Same requirements as [`Msr::store_raw`]: CPL=0 and a register that exists
    /// on the running processor.
    #[cfg(all(feature = "asm", target_arch = "x86_64"))]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    #[doc(alias = "rdmsr")]
    pub unsafe fn load_raw(self) -> u64 {
        let lo: u32;
        let hi: u32;
        let ecx = self.raw();
        unsafe {
            core::arch::asm!(
            "rdmsr",
            in("ecx") ecx,
            out("eax") lo,
            out("edx") hi,
            options(nostack, preserves_flags)
            );
        }
        (u64::from(hi) << 32) | u64::from(lo)
    }
}

impl core::fmt::Display for Msr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "MSR {:#05X}", self.0)
    }
}
