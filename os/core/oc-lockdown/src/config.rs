//! # Configuration
//!
//! Everything the routine does is fixed at build time by one
//! [`LockdownConfig`]. [`LockdownConfig::validate`] is a `const fn` so a
//! binary can reject a bad configuration at compile time:
//!
//! ```
//! use oc_lockdown::{presets, LockdownConfig};
//!
//! const CONFIG: LockdownConfig = presets::XEON_V3_UNDERVOLT;
//! const _: () = assert!(CONFIG.validate().is_ok());
//! ```

use crate::power_delivery::{PowerDelivery, SvidConfig};
use crate::power_limit::{ChipsetMirror, PowerLimitPolicy};
use crate::ratios::TurboRatioLayout;
use crate::voltage::VoltageSpec;
use oc_registers::ProcessorSignature;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LockdownConfig {
    /// Required CPUID leaf 1 signature, or [`ProcessorSignature::ANY`].
    pub expected_signature: ProcessorSignature,
    /// IA core voltage.
    pub core: VoltageSpec,
    /// Cache (CLR) voltage.
    pub cache: VoltageSpec,
    pub power_delivery: PowerDelivery,
    pub turbo_layout: TurboRatioLayout,
    pub power_limits: PowerLimitPolicy,
    pub chipset_mirror: Option<ChipsetMirror>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("core voltage out of range: offset {offset_mv} mV, static {static_mv} mV")]
    CoreVoltage { offset_mv: i32, static_mv: u32 },
    #[error("cache voltage out of range: offset {offset_mv} mV, static {static_mv} mV")]
    CacheVoltage { offset_mv: i32, static_mv: u32 },
    #[error("VCCIN code {code:#x} outside 0.5 V to 2.5 V")]
    Vccin { code: u16 },
}

impl LockdownConfig {
    /// Checks every value against the range its register field holds.
    ///
    /// # Errors
    /// The first out-of-range value.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if !self.core.is_in_range() {
            return Err(ConfigError::CoreVoltage {
                offset_mv: self.core.offset_mv,
                static_mv: self.core.static_mv,
            });
        }
        if !self.cache.is_in_range() {
            return Err(ConfigError::CacheVoltage {
                offset_mv: self.cache.offset_mv,
                static_mv: self.cache.static_mv,
            });
        }
        if let Some(SvidConfig::Fixed(vccin)) = self.power_delivery.svid
            && !vccin.is_in_range()
        {
            return Err(ConfigError::Vccin { code: vccin.raw() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::power_delivery::VccinVoltage;
    use crate::presets;

    #[test]
    fn presets_are_valid() {
        for config in presets::ALL {
            assert_eq!(config.validate(), Ok(()));
        }
    }

    #[test]
    fn rejects_oversized_offset() {
        let config = LockdownConfig {
            core: VoltageSpec::offset(-1000),
            ..presets::XEON_V3_UNDERVOLT
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::CoreVoltage {
                offset_mv: -1000,
                static_mv: 0
            })
        );
    }

    #[test]
    fn rejects_oversized_static_cache_voltage() {
        let config = LockdownConfig {
            cache: VoltageSpec::fixed(4000, 0),
            ..presets::XEON_V3_STOCK_VOLTAGE
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::CacheVoltage {
                offset_mv: 0,
                static_mv: 4000
            })
        );
    }

    #[test]
    fn rejects_out_of_range_vccin() {
        let config = LockdownConfig {
            power_delivery: PowerDelivery {
                svid: Some(SvidConfig::Fixed(VccinVoltage::from_millivolts(3000))),
                fivr: None,
            },
            ..presets::XEON_V3_STOCK_VOLTAGE
        };
        assert!(matches!(config.validate(), Err(ConfigError::Vccin { .. })));
    }
}
