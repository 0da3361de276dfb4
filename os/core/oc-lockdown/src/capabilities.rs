//! # OC capabilities
//!
//! The "get capabilities" command reports, per domain, the highest ratio the
//! part may be set to and which kinds of override it accepts. The routine
//! queries the IA core and cache domains once and derives every ratio it
//! programs from the answers.

use crate::mailbox::{Domain, Mailbox, MailboxCommand, MailboxError, MailboxResponse};
use bitfield_struct::bitfield;
use log::{info, warn};
use oc_registers::RegisterBus;

/// Capability word, the low 32 bits of a capability response.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct OcCapabilities {
    /// Bits 0–7 — Maximum OC ratio.
    #[bits(8)]
    pub max_ratio: u8,

    /// Bit 8 — Ratio overclocking supported.
    pub ratio_oc_supported: bool,

    /// Bit 9 — Voltage overrides supported.
    pub voltage_overrides_supported: bool,

    /// Bit 10 — Voltage offset supported.
    pub voltage_offset_supported: bool,

    #[bits(21)]
    __: u32,
}

/// Raw capability responses of the two domains the routine configures.
///
/// The raw 64-bit responses are kept, error code included: a failed query
/// still yields whatever the register read back, and the ratio steps use it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    pub core: u64,
    pub cache: u64,
}

impl CapabilitySet {
    /// Maximum IA core ratio, the low byte of the core response.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn core_ratio(&self) -> u8 {
        self.core as u8
    }

    /// Maximum cache ratio, the low byte of the cache response.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn cache_ratio(&self) -> u8 {
        self.cache as u8
    }

    #[must_use]
    pub const fn core_capabilities(&self) -> OcCapabilities {
        OcCapabilities::from_bits(MailboxResponse::from_raw(self.core).data())
    }

    #[must_use]
    pub const fn cache_capabilities(&self) -> OcCapabilities {
        OcCapabilities::from_bits(MailboxResponse::from_raw(self.cache).data())
    }
}

/// Result of querying one domain.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CapabilityQuery {
    /// The raw read-back, used regardless of `error`.
    pub raw: u64,
    pub error: Option<MailboxError>,
}

/// Queries the capabilities of `domain`.
///
/// A non-zero completion code is logged and returned alongside the raw
/// response; it never discards the response.
pub fn query_capabilities<B>(bus: &mut B, domain: Domain) -> CapabilityQuery
where
    B: RegisterBus + ?Sized,
{
    let response = Mailbox::new(bus).send(MailboxCommand::GetCapabilities, domain, 0);
    let error = response.check(MailboxCommand::GetCapabilities, domain).err();

    if let Some(err) = error {
        warn!("FAIL: {domain} OC capabilities read failed: {err}");
    } else {
        let caps = OcCapabilities::from_bits(response.data());
        info!(
            "{domain} OC capabilities: max ratio {}, ratio OC {}, voltage override {}, voltage offset {}",
            caps.max_ratio(),
            yes_no(caps.ratio_oc_supported()),
            yes_no(caps.voltage_overrides_supported()),
            yes_no(caps.voltage_offset_supported()),
        );
    }

    CapabilityQuery {
        raw: response.raw(),
        error,
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_registers::sim::SimPlatform;

    #[test]
    fn decodes_capability_word() {
        let caps = OcCapabilities::from_bits(0x0000_0724);
        assert_eq!(caps.max_ratio(), 0x24);
        assert!(caps.ratio_oc_supported());
        assert!(caps.voltage_overrides_supported());
        assert!(caps.voltage_offset_supported());
    }

    #[test]
    fn ratios_are_low_bytes() {
        let set = CapabilitySet {
            core: 0x0000_0000_0000_0724,
            cache: 0x0000_0000_0000_071E,
        };
        assert_eq!(set.core_ratio(), 0x24);
        assert_eq!(set.cache_ratio(), 0x1E);
        assert!(set.cache_capabilities().ratio_oc_supported());
    }

    #[test]
    fn failed_query_keeps_raw_response() {
        let mut sim = SimPlatform::new(0x306F2).with_mailbox_response(0x01, 0x02, 0x0000_0005_0000_0000);
        let query = query_capabilities(&mut sim, Domain::Cache);
        assert_eq!(query.raw, 0x0000_0005_0000_0000);
        assert!(matches!(query.error, Some(MailboxError::Command { .. })));
    }
}
