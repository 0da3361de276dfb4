use bitfield_struct::bitfield;

/// `MSR_RAPL_POWER_UNIT` (MSR `0x606`).
///
/// Each field is an exponent: one raw unit equals `1 / 2^field` of a watt,
/// joule or second respectively.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct RaplPowerUnit {
    /// Bits 0–3 — Power units.
    #[bits(4)]
    pub power_units: u8,

    #[bits(4)]
    __: u8,

    /// Bits 8–12 — Energy status units.
    #[bits(5)]
    pub energy_units: u8,

    #[bits(3)]
    __: u8,

    /// Bits 16–19 — Time units.
    #[bits(4)]
    pub time_units: u8,

    #[bits(44)]
    __: u64,
}

impl RaplPowerUnit {
    /// Milliwatts represented by `raw` power units.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn raw_to_milliwatts(self, raw: u16) -> u32 {
        ((raw as u32) * 1000) >> self.power_units()
    }
}

crate::impl_msr!(RaplPowerUnit, 0x606);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eighth_watt_units() {
        // Haswell-E reports 0xA0E03: 1/8 W power units.
        let units = RaplPowerUnit::from_bits(0x000A_0E03);
        assert_eq!(units.power_units(), 3);
        assert_eq!(units.energy_units(), 14);
        assert_eq!(units.time_units(), 10);
        assert_eq!(units.raw_to_milliwatts(1120), 140_000);
    }
}
