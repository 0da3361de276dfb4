//! # Clock ratios
//!
//! Turbo and uncore ratio limits are written straight from the capability
//! query, independent of the voltage path.

use log::{debug, info};
use oc_registers::msr::{TurboRatioLimit, UncoreRatioLimit};
use oc_registers::{ModelSpecificRegister, Msr, RegisterBus};

/// How many turbo ratio limit registers the part has.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TurboRatioLayout {
    /// `0x1AD` and `0x1AE`, up to 16 cores.
    Two,
    /// `0x1AD`–`0x1AF`, with the commit semaphore in bit 63 of `0x1AF`.
    Three,
}

impl TurboRatioLayout {
    const ALL: [Msr; 3] = [Msr::TURBO_RATIO_LIMIT, Msr::TURBO_RATIO_LIMIT1, Msr::TURBO_RATIO_LIMIT2];

    /// The registers to write, in order.
    #[must_use]
    pub fn registers(self) -> &'static [Msr] {
        match self {
            Self::Two => &Self::ALL[..2],
            Self::Three => &Self::ALL,
        }
    }
}

/// Sets every lane of every turbo ratio limit register to `ratio`.
///
/// The last register is written with the semaphore set so the set commits
/// as a whole.
pub fn apply_turbo_ratios<B>(bus: &mut B, layout: TurboRatioLayout, ratio: u8)
where
    B: RegisterBus + ?Sized,
{
    let limit = TurboRatioLimit::uniform(ratio);
    let registers = layout.registers();
    let last = registers.len() - 1;

    for (i, msr) in registers.iter().enumerate() {
        let value = if i == last {
            limit.with_semaphore()
        } else {
            limit.into_bits()
        };
        debug!("{msr} <- {value:#018x}");
        bus.write_msr(*msr, value);
    }

    info!("All-core turbo ratio set to {ratio}x");
}

/// Pins the uncore ratio to `ratio`, both as minimum and maximum.
///
/// Bits 16–63 of the register are kept as they were.
pub fn apply_uncore_ratio<B>(bus: &mut B, ratio: u8)
where
    B: RegisterBus + ?Sized,
{
    let current = UncoreRatioLimit::load(bus);
    let updated = current.with_max_ratio(ratio).with_min_ratio(ratio);
    debug!(
        "{} {:#018x} -> {:#018x}",
        UncoreRatioLimit::MSR,
        current.into_bits(),
        updated.into_bits()
    );
    updated.store(bus);

    info!("Uncore ratio set to {ratio}x");
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_registers::sim::SimPlatform;

    #[test]
    fn replicates_ratio_into_three_registers() {
        let mut sim = SimPlatform::new(0);
        apply_turbo_ratios(&mut sim, TurboRatioLayout::Three, 0x2A);

        let writes: Vec<_> = sim.msr_writes().collect();
        assert_eq!(
            writes,
            [
                (Msr::TURBO_RATIO_LIMIT, 0x2A2A_2A2A_2A2A_2A2A),
                (Msr::TURBO_RATIO_LIMIT1, 0x2A2A_2A2A_2A2A_2A2A),
                (Msr::TURBO_RATIO_LIMIT2, 0xAA2A_2A2A_2A2A_2A2A),
            ]
        );
    }

    #[test]
    fn two_register_layout_sets_semaphore_on_second() {
        let mut sim = SimPlatform::new(0);
        apply_turbo_ratios(&mut sim, TurboRatioLayout::Two, 0x24);

        let writes: Vec<_> = sim.msr_writes().collect();
        assert_eq!(
            writes,
            [
                (Msr::TURBO_RATIO_LIMIT, 0x2424_2424_2424_2424),
                (Msr::TURBO_RATIO_LIMIT1, 0xA424_2424_2424_2424),
            ]
        );
    }

    #[test]
    fn uncore_keeps_upper_bits() {
        let mut sim = SimPlatform::new(0).with_msr(Msr::UNCORE_RATIO_LIMIT, 0xDEAD_BEEF_0000_0C1E);
        apply_uncore_ratio(&mut sim, 0x1E);
        assert_eq!(sim.msr(Msr::UNCORE_RATIO_LIMIT), 0xDEAD_BEEF_0000_1E1E);
    }

    #[test]
    fn uncore_replaces_previous_ratios() {
        let mut sim = SimPlatform::new(0).with_msr(Msr::UNCORE_RATIO_LIMIT, 0x0000_0000_0001_FFFF);
        apply_uncore_ratio(&mut sim, 0x20);
        assert_eq!(sim.msr(Msr::UNCORE_RATIO_LIMIT), 0x0000_0000_0001_2020);
    }
}
