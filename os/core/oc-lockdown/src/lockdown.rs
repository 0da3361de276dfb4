//! # Lockdown sequencer
//!
//! Runs every step in a fixed order and finishes by setting the OC lock:
//!
//! ```text
//! Init ──gate ok──▶ Gated ──▶ Configuring ──▶ Locked
//!   │
//!   └──gate failed──▶ Aborted
//! ```
//!
//! Within `Configuring` the order is: capabilities (core, cache), turbo and
//! uncore ratios, voltages (core, cache), SVID/FIVR, package power limits.
//! Mailbox failures along the way are logged and recorded as soft failures;
//! they never stop the sequence, and the lock is written regardless.

use crate::capabilities::{CapabilitySet, OcCapabilities, query_capabilities};
use crate::config::LockdownConfig;
use crate::gate::{self, GateError};
use crate::mailbox::Domain;
use crate::power_delivery::{apply_fivr, apply_svid};
use crate::power_limit::apply_power_limits;
use crate::ratios::{apply_turbo_ratios, apply_uncore_ratio};
use crate::voltage::{VoltageSpec, apply_voltage};
use core::fmt;
use log::{debug, info, warn};
use oc_registers::msr::{FlexRatio, PkgPowerLimit};
use oc_registers::{ModelSpecificRegister, Platform, ProcessorSignature};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LockdownState {
    Init,
    /// Every compatibility check passed.
    Gated,
    Configuring,
    /// The OC lock is set. Terminal.
    Locked,
    /// A compatibility check failed and nothing was changed. Terminal.
    Aborted(GateError),
}

impl fmt::Display for LockdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::Gated => f.write_str("gated"),
            Self::Configuring => f.write_str("configuring"),
            Self::Locked => f.write_str("locked"),
            Self::Aborted(err) => write!(f, "aborted ({err})"),
        }
    }
}

/// The steps that can fail softly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Step {
    CoreCapabilities = 0,
    CacheCapabilities = 1,
    CoreVoltage = 2,
    CacheVoltage = 3,
    Svid = 4,
    Fivr = 5,
}

impl Step {
    pub const ALL: [Self; 6] = [
        Self::CoreCapabilities,
        Self::CacheCapabilities,
        Self::CoreVoltage,
        Self::CacheVoltage,
        Self::Svid,
        Self::Fivr,
    ];

    const fn mask(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CoreCapabilities => "core capabilities",
            Self::CacheCapabilities => "cache capabilities",
            Self::CoreVoltage => "core voltage",
            Self::CacheVoltage => "cache voltage",
            Self::Svid => "SVID",
            Self::Fivr => "FIVR",
        })
    }
}

/// A set of [`Step`]s.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Steps(u8);

impl Steps {
    pub const EMPTY: Self = Self(0);

    pub const fn insert(&mut self, step: Step) {
        self.0 |= step.mask();
    }

    #[must_use]
    pub const fn contains(self, step: Step) -> bool {
        self.0 & step.mask() != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = Step> {
        Step::ALL.into_iter().filter(move |step| self.contains(*step))
    }
}

impl FromIterator<Step> for Steps {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        let mut steps = Self::EMPTY;
        for step in iter {
            steps.insert(step);
        }
        steps
    }
}

impl fmt::Display for Steps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, step) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// What a run did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LockdownReport {
    pub state: LockdownState,
    /// The running processor, if the gate got far enough to read it.
    pub signature: Option<ProcessorSignature>,
    pub capabilities: CapabilitySet,
    pub soft_failures: Steps,
    /// The package power limit written, if any.
    pub power_limit: Option<PkgPowerLimit>,
}

impl LockdownReport {
    const fn new() -> Self {
        Self {
            state: LockdownState::Init,
            signature: None,
            capabilities: CapabilitySet { core: 0, cache: 0 },
            soft_failures: Steps::EMPTY,
            power_limit: None,
        }
    }

    /// Locked without a single soft failure.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self.state, LockdownState::Locked) && self.soft_failures.is_empty()
    }
}

/// One run of the routine against one platform.
pub struct Lockdown<'a, P: ?Sized> {
    platform: &'a mut P,
    config: &'a LockdownConfig,
    report: LockdownReport,
}

impl<'a, P> Lockdown<'a, P>
where
    P: Platform + ?Sized,
{
    pub const fn new(platform: &'a mut P, config: &'a LockdownConfig) -> Self {
        Self {
            platform,
            config,
            report: LockdownReport::new(),
        }
    }

    /// Runs the whole sequence.
    ///
    /// Never fails: gate failures end in [`LockdownState::Aborted`], every
    /// other failure is listed in [`LockdownReport::soft_failures`].
    pub fn run(mut self) -> LockdownReport {
        match gate::check(self.platform, self.config.expected_signature) {
            Ok(signature) => {
                self.report.signature = Some(signature);
                self.transition(LockdownState::Gated);
            }
            Err(err) => {
                self.transition(LockdownState::Aborted(err));
                return self.report;
            }
        }

        let brand = self.platform.brand_string();
        if !brand.as_str().is_empty() {
            info!("{brand}");
        }

        self.transition(LockdownState::Configuring);
        self.read_capabilities();
        self.apply_ratios();
        self.apply_voltages();
        self.apply_power_delivery();
        self.report.power_limit =
            apply_power_limits(self.platform, self.config.power_limits, self.config.chipset_mirror);
        self.lock();

        self.report
    }

    fn transition(&mut self, next: LockdownState) {
        debug!("Lockdown: {} -> {next}", self.report.state);
        self.report.state = next;
    }

    fn soft_failure(&mut self, step: Step) {
        self.report.soft_failures.insert(step);
    }

    fn read_capabilities(&mut self) {
        let core = query_capabilities(self.platform, Domain::IaCore);
        if core.error.is_some() {
            self.soft_failure(Step::CoreCapabilities);
        }

        let cache = query_capabilities(self.platform, Domain::Cache);
        if cache.error.is_some() {
            self.soft_failure(Step::CacheCapabilities);
        }

        // A failed query still yields its read-back; the ratios below use it.
        self.report.capabilities = CapabilitySet {
            core: core.raw,
            cache: cache.raw,
        };
    }

    fn apply_ratios(&mut self) {
        let caps = self.report.capabilities;
        apply_turbo_ratios(self.platform, self.config.turbo_layout, caps.core_ratio());
        apply_uncore_ratio(self.platform, caps.cache_ratio());
    }

    fn apply_voltages(&mut self) {
        let caps = self.report.capabilities;
        self.set_voltage(
            Domain::IaCore,
            self.config.core,
            caps.core_ratio(),
            caps.core_capabilities(),
            Step::CoreVoltage,
        );
        self.set_voltage(
            Domain::Cache,
            self.config.cache,
            caps.cache_ratio(),
            caps.cache_capabilities(),
            Step::CacheVoltage,
        );
    }

    fn set_voltage(&mut self, domain: Domain, spec: VoltageSpec, max_ratio: u8, caps: OcCapabilities, step: Step) {
        if spec.is_stock() && spec.multiplier == 0 {
            debug!("{domain} voltage left at stock");
            return;
        }

        // Logged only; the mailbox decides.
        if spec.offset_mv != 0 && !caps.voltage_offset_supported() {
            warn!("{domain} does not report voltage offset support");
        }
        if spec.fixed && !caps.voltage_overrides_supported() {
            warn!("{domain} does not report voltage override support");
        }

        if apply_voltage(self.platform, domain, &spec, max_ratio).is_err() {
            self.soft_failure(step);
        }
    }

    fn apply_power_delivery(&mut self) {
        let delivery = self.config.power_delivery;
        if delivery.is_none() {
            debug!("SVID and FIVR left at defaults");
            return;
        }
        if let Some(svid) = delivery.svid
            && apply_svid(self.platform, svid).is_err()
        {
            self.soft_failure(Step::Svid);
        }
        if let Some(fivr) = delivery.fivr
            && apply_fivr(self.platform, fivr).is_err()
        {
            self.soft_failure(Step::Fivr);
        }
    }

    fn lock(&mut self) {
        if !self.report.soft_failures.is_empty() {
            warn!("Locking with soft failures: {}", self.report.soft_failures);
        }

        let flex = FlexRatio::load(self.platform).with_oc_lock(true);
        flex.store(self.platform);
        debug!("{} <- {:#018x}", FlexRatio::MSR, flex.into_bits());

        self.transition(LockdownState::Locked);
        info!("OC lock set");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_set_operations() {
        let mut steps = Steps::EMPTY;
        assert!(steps.is_empty());

        steps.insert(Step::CacheVoltage);
        steps.insert(Step::CoreCapabilities);
        steps.insert(Step::CacheVoltage);
        assert_eq!(steps.len(), 2);
        assert!(steps.contains(Step::CoreCapabilities));
        assert!(!steps.contains(Step::Fivr));

        let listed: Steps = steps.iter().collect();
        assert_eq!(listed, steps);
    }

    #[test]
    fn steps_display_in_sequence_order() {
        let steps: Steps = [Step::Fivr, Step::CoreVoltage].into_iter().collect();
        assert_eq!(format!("{steps}"), "core voltage, FIVR");
        assert_eq!(format!("{}", Steps::EMPTY), "none");
    }

    #[test]
    fn states_display() {
        assert_eq!(format!("{}", LockdownState::Locked), "locked");
        assert_eq!(
            format!("{}", LockdownState::Aborted(GateError::OcLocked)),
            "aborted (overclocking is already locked)"
        );
    }
}
