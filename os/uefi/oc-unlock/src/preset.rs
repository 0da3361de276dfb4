//! Build-time configuration selection.
//!
//! Exactly one `preset-*` feature picks the configuration baked into the
//! image. `preset-undervolt` is the default.

use oc_lockdown::{LockdownConfig, presets};

#[cfg(any(
    all(feature = "preset-stock", feature = "preset-mild"),
    all(feature = "preset-stock", feature = "preset-any-cpu"),
    all(feature = "preset-mild", feature = "preset-any-cpu"),
))]
compile_error!("enable at most one of `preset-stock`, `preset-mild` and `preset-any-cpu`");

#[cfg(feature = "preset-stock")]
pub const CONFIG: LockdownConfig = presets::XEON_V3_STOCK_VOLTAGE;
#[cfg(feature = "preset-stock")]
pub const NAME: &str = "Xeon v3, stock voltage";

#[cfg(feature = "preset-mild")]
pub const CONFIG: LockdownConfig = presets::XEON_V3_MILD_UNDERVOLT;
#[cfg(feature = "preset-mild")]
pub const NAME: &str = "Xeon v3, mild undervolt";

#[cfg(feature = "preset-any-cpu")]
pub const CONFIG: LockdownConfig = presets::ANY_CPU_RATIOS_ONLY;
#[cfg(feature = "preset-any-cpu")]
pub const NAME: &str = "any CPU, ratios only";

#[cfg(not(any(feature = "preset-stock", feature = "preset-mild", feature = "preset-any-cpu")))]
pub const CONFIG: LockdownConfig = presets::XEON_V3_UNDERVOLT;
#[cfg(not(any(feature = "preset-stock", feature = "preset-mild", feature = "preset-any-cpu")))]
pub const NAME: &str = "Xeon v3, undervolt";

const _: () = assert!(CONFIG.validate().is_ok(), "invalid lockdown configuration");
