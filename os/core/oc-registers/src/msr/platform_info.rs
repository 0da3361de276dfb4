use bitfield_struct::bitfield;

/// `MSR_PLATFORM_INFO` (MSR `0x0CE`).
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PlatformInfo {
    #[bits(8)]
    __: u8,

    /// Bits 8–15 — Maximum non-turbo ratio.
    #[bits(8)]
    pub max_non_turbo_ratio: u8,

    #[bits(12)]
    __: u16,

    /// Bit 28 — Turbo ratio limits are programmable.
    pub programmable_ratio_limits: bool,

    /// Bit 29 — Turbo TDP limits (`MSR_PKG_POWER_LIMIT`) are programmable.
    pub programmable_tdp_limits: bool,

    #[bits(10)]
    __: u16,

    /// Bits 40–47 — Maximum efficiency ratio.
    #[bits(8)]
    pub max_efficiency_ratio: u8,

    #[bits(16)]
    __: u16,
}

crate::impl_msr!(PlatformInfo, 0x0CE);
