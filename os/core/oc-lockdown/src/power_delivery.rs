//! # Power delivery tuning
//!
//! Optional SVID and FIVR parameters. Haswell-E feeds the integrated voltage
//! regulator (FIVR) from a single motherboard rail, VCCIN, whose set point is
//! requested over SVID. Both are set through the OC mailbox.

use crate::mailbox::{Domain, Mailbox, MailboxCommand, MailboxError};
use core::fmt;
use log::{info, warn};
use oc_registers::RegisterBus;

/// A VCCIN set point in units of 1/1024 V.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VccinVoltage(u16);

impl VccinVoltage {
    pub const MIN_MV: u32 = 500;
    pub const MAX_MV: u32 = 2500;

    /// Board default, 1.825 V.
    pub const DEFAULT: Self = Self::from_millivolts(1825);

    /// Converts from millivolts, rounding up to the next code.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
    pub const fn from_millivolts(mv: u32) -> Self {
        let code = (mv as u64 * 1024).div_ceil(1000);
        if code > u16::MAX as u64 {
            Self(u16::MAX)
        } else {
            Self(code as u16)
        }
    }

    /// Whether the set point lies within
    /// [`MIN_MV`](Self::MIN_MV)..=[`MAX_MV`](Self::MAX_MV).
    #[must_use]
    pub const fn is_in_range(self) -> bool {
        self.0 >= Self::from_millivolts(Self::MIN_MV).0 && self.0 <= Self::from_millivolts(Self::MAX_MV).0
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// The set point in millivolts, rounded down.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn millivolts(self) -> u32 {
        self.0 as u32 * 1000 / 1024
    }
}

impl fmt::Display for VccinVoltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mv = self.millivolts();
        write!(f, "{}.{:03} V", mv / 1000, mv % 1000)
    }
}

/// Who controls the VCCIN set point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SvidConfig {
    /// The FIVR requests VCCIN as it sees fit.
    Dynamic,
    /// A fixed VCCIN.
    Fixed(VccinVoltage),
}

impl SvidConfig {
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn payload(self) -> u32 {
        match self {
            Self::Dynamic => 0,
            Self::Fixed(voltage) => voltage.raw() as u32,
        }
    }
}

/// FIVR override flags.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FivrConfig {
    pub faults_override: bool,
    pub efficiency_mode_override: bool,
    pub disable_dynamic_svid: bool,
}

impl FivrConfig {
    pub const FAULTS_OVERRIDE: u32 = 1 << 0;
    pub const EFFICIENCY_MODE_OVERRIDE: u32 = 1 << 1;
    pub const DYNAMIC_SVID_DISABLE: u32 = 1 << 31;

    #[must_use]
    pub const fn payload(self) -> u32 {
        let mut payload = 0;
        if self.faults_override {
            payload |= Self::FAULTS_OVERRIDE;
        }
        if self.efficiency_mode_override {
            payload |= Self::EFFICIENCY_MODE_OVERRIDE;
        }
        if self.disable_dynamic_svid {
            payload |= Self::DYNAMIC_SVID_DISABLE;
        }
        payload
    }
}

/// SVID and FIVR settings; `None` leaves the respective block untouched.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PowerDelivery {
    pub svid: Option<SvidConfig>,
    pub fivr: Option<FivrConfig>,
}

impl PowerDelivery {
    pub const NONE: Self = Self { svid: None, fivr: None };

    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.svid.is_none() && self.fivr.is_none()
    }
}

/// Sends the SVID parameters.
///
/// # Errors
/// The mailbox's rejection, if any.
pub fn apply_svid<B>(bus: &mut B, svid: SvidConfig) -> Result<(), MailboxError>
where
    B: RegisterBus + ?Sized,
{
    Mailbox::new(bus)
        .execute(MailboxCommand::SetSvidParams, Domain::IaCore, svid.payload())
        .map_err(|err| {
            warn!("FAIL: SVID: {err}");
            err
        })?;
    match svid {
        SvidConfig::Dynamic => info!("VCCIN under FIVR control"),
        SvidConfig::Fixed(voltage) => info!("VCCIN fixed at {voltage}"),
    }
    Ok(())
}

/// Sends the FIVR parameters.
///
/// # Errors
/// The mailbox's rejection, if any.
pub fn apply_fivr<B>(bus: &mut B, fivr: FivrConfig) -> Result<(), MailboxError>
where
    B: RegisterBus + ?Sized,
{
    Mailbox::new(bus)
        .execute(MailboxCommand::SetFivrParams, Domain::IaCore, fivr.payload())
        .map_err(|err| {
            warn!("FAIL: FIVR: {err}");
            err
        })?;
    info!("FIVR parameters set ({:#010x})", fivr.payload());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_registers::msr::OcMailbox;
    use oc_registers::sim::SimPlatform;

    #[test]
    fn vccin_codes_round_up() {
        assert_eq!(VccinVoltage::from_millivolts(1825).raw(), 0x74D);
        assert_eq!(VccinVoltage::from_millivolts(1600).raw(), 0x667);
        assert_eq!(VccinVoltage::from_millivolts(1650).raw(), 0x69A);
        assert_eq!(VccinVoltage::from_millivolts(2000).raw(), 0x800);
        assert_eq!(VccinVoltage::from_millivolts(2100).raw(), 0x867);
        assert_eq!(VccinVoltage::DEFAULT.raw(), 0x74D);
    }

    #[test]
    fn vccin_range() {
        assert!(VccinVoltage::from_millivolts(500).is_in_range());
        assert!(VccinVoltage::from_millivolts(2500).is_in_range());
        assert!(!VccinVoltage::from_millivolts(499).is_in_range());
        assert!(!VccinVoltage::from_millivolts(2501).is_in_range());
        assert_eq!(VccinVoltage::from_millivolts(u32::MAX).raw(), u16::MAX);
    }

    #[test]
    fn vccin_display() {
        assert_eq!(format!("{}", VccinVoltage::from_millivolts(2000)), "2.000 V");
    }

    #[test]
    fn fivr_flag_bits() {
        let all = FivrConfig {
            faults_override: true,
            efficiency_mode_override: true,
            disable_dynamic_svid: true,
        };
        assert_eq!(all.payload(), 0x8000_0003);
        assert_eq!(FivrConfig::default().payload(), 0);
    }

    #[test]
    fn svid_request_carries_voltage_code() {
        let mut sim = SimPlatform::new(0);
        apply_svid(&mut sim, SvidConfig::Fixed(VccinVoltage::from_millivolts(1900))).unwrap();

        let requests: Vec<_> = sim.mailbox_requests().map(OcMailbox::into_bits).collect();
        assert_eq!(requests, [0x8000_0013_0000_079A]);
    }

    #[test]
    fn rejected_fivr_is_reported() {
        let mut sim = SimPlatform::new(0).with_mailbox_response(0x15, 0x00, 0x0000_0006_0000_0000);
        let fivr = FivrConfig {
            disable_dynamic_svid: true,
            ..FivrConfig::default()
        };
        assert!(matches!(apply_fivr(&mut sim, fivr), Err(MailboxError::Command { .. })));
    }
}
