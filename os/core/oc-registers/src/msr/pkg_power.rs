use bitfield_struct::bitfield;

/// `MSR_PKG_POWER_LIMIT` (MSR `0x610`).
///
/// PL1 ("long term") lives in the low half and PL2 ("short term") in the high
/// half. The chipset keeps a mirror of both halves in MCHBAR.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PkgPowerLimit {
    /// Bits 0–14 — Power limit 1, in power units.
    #[bits(15)]
    pub pl1: u16,

    /// Bit 15 — Enable power limit 1.
    pub pl1_enable: bool,

    /// Bit 16 — Package clamping limitation 1.
    pub pl1_clamp: bool,

    /// Bits 17–23 — Time window for power limit 1.
    #[bits(7)]
    pub pl1_time_window: u8,

    #[bits(8)]
    __: u8,

    /// Bits 32–46 — Power limit 2, in power units.
    #[bits(15)]
    pub pl2: u16,

    /// Bit 47 — Enable power limit 2.
    pub pl2_enable: bool,

    /// Bit 48 — Package clamping limitation 2.
    pub pl2_clamp: bool,

    /// Bits 49–55 — Time window for power limit 2.
    #[bits(7)]
    pub pl2_time_window: u8,

    #[bits(7)]
    __: u8,

    /// Bit 63 — Lock; set, the register is read-only until reset.
    pub lock: bool,
}

impl PkgPowerLimit {
    /// Largest value of a power limit field.
    pub const MAX_POWER: u16 = 0x7FFF;

    /// Largest value of a time window field.
    pub const MAX_TIME_WINDOW: u8 = 0x7F;

    /// Low 32 bits, as mirrored to the chipset.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn low(self) -> u32 {
        self.into_bits() as u32
    }

    /// High 32 bits, as mirrored to the chipset.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn high(self) -> u32 {
        (self.into_bits() >> 32) as u32
    }
}

crate::impl_msr!(PkgPowerLimit, 0x610);

/// `MSR_PKG_POWER_INFO` (MSR `0x614`), the SKU defaults.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PkgPowerInfo {
    /// Bits 0–14 — Thermal spec power (TDP), in power units.
    #[bits(15)]
    pub thermal_spec_power: u16,

    #[bits(1)]
    __: u8,

    /// Bits 16–30 — Minimum power, in power units.
    #[bits(15)]
    pub min_power: u16,

    #[bits(1)]
    __: u8,

    /// Bits 32–46 — Maximum power, in power units.
    #[bits(15)]
    pub max_power: u16,

    #[bits(1)]
    __: u8,

    /// Bits 48–54 — Maximum time window.
    #[bits(7)]
    pub max_time_window: u8,

    #[bits(9)]
    __: u16,
}

crate::impl_msr!(PkgPowerInfo, 0x614);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_limit_layout() {
        let limit = PkgPowerLimit::new()
            .with_pl1(PkgPowerLimit::MAX_POWER)
            .with_pl1_enable(true)
            .with_pl1_clamp(true)
            .with_pl1_time_window(PkgPowerLimit::MAX_TIME_WINDOW)
            .with_pl2(PkgPowerLimit::MAX_POWER)
            .with_pl2_enable(true)
            .with_pl2_clamp(true)
            .with_pl2_time_window(PkgPowerLimit::MAX_TIME_WINDOW);
        assert_eq!(limit.into_bits(), 0x00FF_FFFF_00FF_FFFF);
        assert_eq!(limit.low(), 0x00FF_FFFF);
        assert_eq!(limit.high(), 0x00FF_FFFF);
    }

    #[test]
    fn sku_fields() {
        // 140 W TDP, 70 W min, 240 W max at 1/8 W units.
        let raw = (0x12_u64 << 48) | (1920_u64 << 32) | (560_u64 << 16) | 1120;
        let info = PkgPowerInfo::from_bits(raw);
        assert_eq!(info.thermal_spec_power(), 1120);
        assert_eq!(info.min_power(), 560);
        assert_eq!(info.max_power(), 1920);
        assert_eq!(info.max_time_window(), 0x12);
    }
}
