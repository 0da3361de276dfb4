//! Ready-made configurations.
//!
//! All four unlock the all-core turbo, pin the uncore ratio and hold the package
//! at its SKU power limits; they differ in the voltages they ask for and in
//! which processors they accept.

use crate::config::LockdownConfig;
use crate::power_delivery::PowerDelivery;
use crate::power_limit::{ChipsetMirror, PowerLimitPolicy};
use crate::ratios::TurboRatioLayout;
use crate::voltage::VoltageSpec;
use oc_registers::ProcessorSignature;

/// Xeon E5 v3 (Haswell-EP, C1): core fixed at 980 mV with a −70 mV offset,
/// cache −50 mV adaptive.
pub const XEON_V3_UNDERVOLT: LockdownConfig = LockdownConfig {
    expected_signature: ProcessorSignature::HASWELL_E_C1,
    core: VoltageSpec::fixed(980, -70),
    cache: VoltageSpec::offset(-50),
    power_delivery: PowerDelivery::NONE,
    turbo_layout: TurboRatioLayout::Three,
    power_limits: PowerLimitPolicy::FromSku,
    chipset_mirror: Some(ChipsetMirror::at_mchbar(ChipsetMirror::CLIENT_MCHBAR)),
};

/// Xeon E5 v3 at stock voltages; ratios and power limits only.
pub const XEON_V3_STOCK_VOLTAGE: LockdownConfig = LockdownConfig {
    core: VoltageSpec::STOCK,
    cache: VoltageSpec::STOCK,
    ..XEON_V3_UNDERVOLT
};

/// Xeon E5 v3 with a conservative adaptive undervolt.
pub const XEON_V3_MILD_UNDERVOLT: LockdownConfig = LockdownConfig {
    core: VoltageSpec::offset(-50),
    cache: VoltageSpec::offset(-30),
    ..XEON_V3_UNDERVOLT
};

/// Any processor, stock voltages.
pub const ANY_CPU_RATIOS_ONLY: LockdownConfig = LockdownConfig {
    expected_signature: ProcessorSignature::ANY,
    ..XEON_V3_STOCK_VOLTAGE
};

pub const ALL: [LockdownConfig; 4] = [
    XEON_V3_UNDERVOLT,
    XEON_V3_STOCK_VOLTAGE,
    XEON_V3_MILD_UNDERVOLT,
    ANY_CPU_RATIOS_ONLY,
];
