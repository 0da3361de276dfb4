//! # Pre-boot Overclocking Lockdown
//!
//! Unlocks the all-core turbo of Haswell-E class Xeons before the operating
//! system loads, optionally undervolts core and cache, and then sets the OC
//! lock so later microcode or software cannot revert the settings.
//!
//! ```no_run
//! # use oc_registers::sim::SimPlatform;
//! use oc_lockdown::{presets, Lockdown};
//!
//! # let mut platform = SimPlatform::new(0x306F2);
//! let report = Lockdown::new(&mut platform, &presets::XEON_V3_UNDERVOLT).run();
//! log::info!("{}", report.state);
//! ```
//!
//! All register traffic goes through [`oc_registers::Platform`], so the whole
//! sequence runs unchanged against the simulated register file in tests.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::module_name_repetitions)]

pub mod capabilities;
pub mod config;
pub mod gate;
pub mod lockdown;
pub mod mailbox;
pub mod power_delivery;
pub mod power_limit;
pub mod presets;
pub mod ratios;
pub mod voltage;

pub use capabilities::{CapabilitySet, OcCapabilities};
pub use config::{ConfigError, LockdownConfig};
pub use gate::GateError;
pub use lockdown::{Lockdown, LockdownReport, LockdownState, Step, Steps};
pub use mailbox::{Domain, MailboxCommand, MailboxError, MailboxStatus};
pub use power_delivery::{FivrConfig, PowerDelivery, SvidConfig, VccinVoltage};
pub use power_limit::{ChipsetMirror, PowerLimitPolicy};
pub use ratios::TurboRatioLayout;
pub use voltage::{EncodedVoltage, VoltageSpec, encode_voltage};
