//! # Package power limits
//!
//! When `MSR_PLATFORM_INFO` reports the TDP limits as programmable, PL1 and
//! PL2 are computed from the SKU defaults and written to
//! `MSR_PKG_POWER_LIMIT`. Some platforms take the limits from the chipset's
//! copy in MCHBAR instead, so both halves are mirrored there as well.

use log::{debug, info};
use oc_registers::msr::{PkgPowerInfo, PkgPowerLimit, PlatformInfo, RaplPowerUnit};
use oc_registers::{MmioAddress, ModelSpecificRegister, RegisterBus};

/// How PL1 and PL2 are derived.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PowerLimitPolicy {
    /// Leave the power limit register alone.
    Keep,
    /// PL1 at TDP, PL2 at the SKU maximum (or TDP, whichever is higher).
    FromSku,
    /// Every limit and time window at its maximum.
    Unlimited,
}

/// MMIO addresses of the chipset's power limit mirror.
///
/// The mirror is best effort. `MSR_PKG_POWER_LIMIT` is the register the
/// package enforces; the MMIO pair only matters on platforms whose power
/// management firmware reads the limits back from MCHBAR.
///
/// Haswell-EP has no MCHBAR at a fixed address: its memory controller sits in
/// the uncore PCI space, and [`Self::CLIENT_MCHBAR`] is the client platform
/// base. Boards that expose a mirror elsewhere pass that base to
/// [`Self::at_mchbar`]; everywhere else the two writes change nothing the
/// package looks at.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChipsetMirror {
    pub low: MmioAddress,
    pub high: MmioAddress,
}

impl ChipsetMirror {
    /// MCHBAR base the firmware of client platforms assigns.
    pub const CLIENT_MCHBAR: MmioAddress = MmioAddress::new(0xFED1_0000);

    /// Offset of the `PACKAGE_POWER_LIMIT` mirror within MCHBAR.
    pub const PKG_POWER_LIMIT_OFFSET: u64 = 0x59A0;

    /// The mirror pair of a MCHBAR at `base`.
    #[must_use]
    pub const fn at_mchbar(base: MmioAddress) -> Self {
        Self {
            low: base.offset(Self::PKG_POWER_LIMIT_OFFSET),
            high: base.offset(Self::PKG_POWER_LIMIT_OFFSET + 4),
        }
    }
}

impl Default for ChipsetMirror {
    fn default() -> Self {
        Self::at_mchbar(Self::CLIENT_MCHBAR)
    }
}

/// The SKU defaults, in raw power units.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PowerLimits {
    pub units: RaplPowerUnit,
    pub sku: PkgPowerInfo,
}

impl PowerLimits {
    pub fn read<B>(bus: &mut B) -> Self
    where
        B: RegisterBus + ?Sized,
    {
        Self {
            units: RaplPowerUnit::load(bus),
            sku: PkgPowerInfo::load(bus),
        }
    }

    /// The register value for `policy`, or `None` for [`PowerLimitPolicy::Keep`].
    ///
    /// PL1 never exceeds PL2.
    #[must_use]
    pub fn compute(&self, policy: PowerLimitPolicy) -> Option<PkgPowerLimit> {
        let (pl1, pl2) = match policy {
            PowerLimitPolicy::Keep => return None,
            PowerLimitPolicy::Unlimited => (PkgPowerLimit::MAX_POWER, PkgPowerLimit::MAX_POWER),
            PowerLimitPolicy::FromSku => {
                let tdp = self.sku.thermal_spec_power();
                (tdp, self.sku.max_power().max(tdp))
            }
        };

        Some(
            PkgPowerLimit::new()
                .with_pl1(pl1)
                .with_pl1_enable(true)
                .with_pl1_clamp(true)
                .with_pl1_time_window(PkgPowerLimit::MAX_TIME_WINDOW)
                .with_pl2(pl2)
                .with_pl2_enable(true)
                .with_pl2_clamp(true)
                .with_pl2_time_window(PkgPowerLimit::MAX_TIME_WINDOW),
        )
    }
}

/// Programs the package power limits.
///
/// Does nothing at all, reads included, unless the platform reports the
/// limits as programmable. Returns the value written, if any.
pub fn apply_power_limits<B>(
    bus: &mut B,
    policy: PowerLimitPolicy,
    mirror: Option<ChipsetMirror>,
) -> Option<PkgPowerLimit>
where
    B: RegisterBus + ?Sized,
{
    if policy == PowerLimitPolicy::Keep {
        return None;
    }

    if !PlatformInfo::load(bus).programmable_tdp_limits() {
        info!("Package power limits are not programmable, skipping");
        return None;
    }

    let limits = PowerLimits::read(bus);
    let limit = limits.compute(policy)?;
    debug!(
        "SKU power: TDP {} mW, max {} mW",
        limits.units.raw_to_milliwatts(limits.sku.thermal_spec_power()),
        limits.units.raw_to_milliwatts(limits.sku.max_power())
    );

    limit.store(bus);
    debug!("{} <- {:#018x}", PkgPowerLimit::MSR, limit.into_bits());

    if let Some(mirror) = mirror {
        bus.write_mmio32(mirror.low, limit.low());
        bus.write_mmio32(mirror.high, limit.high());
        debug!("{} <- {:#010x}, {} <- {:#010x}", mirror.low, limit.low(), mirror.high, limit.high());
    }

    info!(
        "Package power limits set: PL1 {} mW, PL2 {} mW",
        limits.units.raw_to_milliwatts(limit.pl1()),
        limits.units.raw_to_milliwatts(limit.pl2())
    );
    Some(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_registers::Msr;
    use oc_registers::sim::SimPlatform;

    const PROGRAMMABLE: u64 = 1 << 29;

    // 1/8 W units, 140 W TDP, 240 W max.
    fn xeon() -> SimPlatform {
        SimPlatform::new(0x306F2)
            .with_msr(Msr::PLATFORM_INFO, PROGRAMMABLE)
            .with_msr(Msr::RAPL_POWER_UNIT, 0x000A_0E03)
            .with_msr(Msr::PKG_POWER_INFO, (0x12_u64 << 48) | (1920_u64 << 32) | (560_u64 << 16) | 1120)
    }

    #[test]
    fn unlimited_writes_every_field_at_max() {
        let mut sim = xeon();
        let limit = apply_power_limits(&mut sim, PowerLimitPolicy::Unlimited, None).unwrap();
        assert_eq!(limit.into_bits(), 0x00FF_FFFF_00FF_FFFF);
        assert_eq!(sim.msr(Msr::PKG_POWER_LIMIT), 0x00FF_FFFF_00FF_FFFF);
    }

    #[test]
    fn sku_policy_uses_tdp_and_max_power() {
        let mut sim = xeon();
        let limit = apply_power_limits(&mut sim, PowerLimitPolicy::FromSku, None).unwrap();
        assert_eq!(limit.pl1(), 1120);
        assert_eq!(limit.pl2(), 1920);
        assert!(limit.pl1_enable() && limit.pl2_enable());
        assert!(!limit.lock());
    }

    #[test]
    fn sku_without_max_power_falls_back_to_tdp() {
        let limits = PowerLimits {
            units: RaplPowerUnit::from_bits(3),
            sku: PkgPowerInfo::new().with_thermal_spec_power(1120),
        };
        let limit = limits.compute(PowerLimitPolicy::FromSku).unwrap();
        assert_eq!(limit.pl1(), 1120);
        assert_eq!(limit.pl2(), 1120);
    }

    #[test]
    fn mirrors_both_halves_to_mchbar() {
        let mirror = ChipsetMirror::default();
        assert_eq!(mirror.low.as_u64(), 0xFED1_59A0);
        assert_eq!(mirror.high.as_u64(), 0xFED1_59A4);

        let mut sim = xeon();
        let limit = apply_power_limits(&mut sim, PowerLimitPolicy::FromSku, Some(mirror)).unwrap();
        let writes: Vec<_> = sim.mmio_writes().collect();
        assert_eq!(writes, [(mirror.low, limit.low()), (mirror.high, limit.high())]);
    }

    #[test]
    fn not_programmable_is_a_silent_no_op() {
        let mut sim = xeon().with_msr(Msr::PLATFORM_INFO, 0);
        assert!(apply_power_limits(&mut sim, PowerLimitPolicy::Unlimited, Some(ChipsetMirror::default())).is_none());
        assert_eq!(sim.write_count(), 0);
    }

    #[test]
    fn keep_touches_nothing() {
        let mut sim = xeon();
        assert!(apply_power_limits(&mut sim, PowerLimitPolicy::Keep, None).is_none());
        assert!(sim.accesses().is_empty());
    }
}
