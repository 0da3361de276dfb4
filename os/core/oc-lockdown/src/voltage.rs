//! # Voltage encoding
//!
//! The FVID set command takes a 32-bit word:
//!
//! ```text
//!  31..21           20      19..8            7..0
//! ┌────────────────┬───────┬────────────────┬─────────┐
//! │ offset (s11)   │ fixed │ static voltage │  ratio  │
//! └────────────────┴───────┴────────────────┴─────────┘
//! ```
//!
//! Both voltages are in units of 1/1024 V. The offset is a signed 11-bit
//! field; negative values are undervolts.
//!
//! The conversion from millivolts shifts *before* dividing and truncates
//! toward zero before the low five bits are masked off. Reordering either
//! step changes the result for some inputs, so `-70 mV` must come out as
//! `0xF700_0000` and `-50 mV` as `0xF980_0000`.

use crate::mailbox::{Domain, Mailbox, MailboxCommand, MailboxError};
use core::fmt;
use log::{info, warn};
use oc_registers::RegisterBus;

/// Voltage policy for one domain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct VoltageSpec {
    /// Offset applied on top of the voltage/frequency curve, in millivolts.
    pub offset_mv: i32,
    /// Target voltage in millivolts; only meaningful with `fixed`.
    pub static_mv: u32,
    /// Ratio carried in the low byte. `0` means "the domain's maximum ratio
    /// as reported by the capability query".
    pub multiplier: u8,
    /// Use `static_mv` as a fixed (override) voltage instead of adaptive mode.
    pub fixed: bool,
}

impl VoltageSpec {
    /// No offset, adaptive mode, capability ratio.
    pub const STOCK: Self = Self::offset(0);

    /// Largest offset magnitude the signed 11-bit field holds.
    pub const MAX_OFFSET_MV: i32 = 999;

    /// Largest static voltage the 12-bit field holds.
    pub const MAX_STATIC_MV: u32 = 3999;

    /// Adaptive mode with the given offset.
    #[must_use]
    pub const fn offset(offset_mv: i32) -> Self {
        Self {
            offset_mv,
            static_mv: 0,
            multiplier: 0,
            fixed: false,
        }
    }

    /// Fixed `static_mv` with an additional offset.
    #[must_use]
    pub const fn fixed(static_mv: u32, offset_mv: i32) -> Self {
        Self {
            offset_mv,
            static_mv,
            multiplier: 0,
            fixed: true,
        }
    }

    /// Whether this leaves the processor's voltage alone.
    #[must_use]
    pub const fn is_stock(&self) -> bool {
        self.offset_mv == 0 && self.static_mv == 0 && !self.fixed
    }

    /// Whether both voltages fit their fields.
    #[must_use]
    pub const fn is_in_range(&self) -> bool {
        self.offset_mv >= -Self::MAX_OFFSET_MV
            && self.offset_mv <= Self::MAX_OFFSET_MV
            && self.static_mv <= Self::MAX_STATIC_MV
    }

    /// Encodes this policy into the FVID wire format.
    #[must_use]
    pub const fn encode(&self) -> EncodedVoltage {
        encode_voltage(self)
    }
}

/// The FVID word produced by [`encode_voltage`].
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EncodedVoltage(u32);

impl EncodedVoltage {
    /// Bit 20, fixed (override) voltage mode.
    pub const FIXED_MODE: u32 = 1 << 20;

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Bits 21–31 as a signed count of 1/1024 V.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub const fn offset_units(self) -> i16 {
        ((self.0 >> 16) as i16) >> 5
    }

    /// Bits 8–19 as a count of 1/1024 V.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn static_units(self) -> u16 {
        ((self.0 >> 8) & 0xFFF) as u16
    }

    #[must_use]
    pub const fn is_fixed(self) -> bool {
        self.0 & Self::FIXED_MODE != 0
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn ratio(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// The same word with `ratio` in the low byte.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn with_ratio(self, ratio: u8) -> Self {
        Self((self.0 & !0xFF) | ratio as u32)
    }
}

impl fmt::Display for EncodedVoltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#010X} (offset {} units, static {} units, {}, ratio {})",
            self.0,
            self.offset_units(),
            self.static_units(),
            if self.is_fixed() { "fixed" } else { "adaptive" },
            self.ratio()
        )
    }
}

/// Encodes a [`VoltageSpec`] into the FVID wire format.
///
/// ```text
/// offset = ((offset_mv << 15) / 1000) & 0xFFE0
/// static = ((static_mv << 18) / 1000) & 0xFFF00
/// word   = (offset << 16) | static | multiplier | (fixed << 20)
/// ```
///
/// The arithmetic runs on `i32`, so a negative offset keeps its sign through
/// the shift and the truncating division before the mask takes its two's
/// complement bits.
#[must_use]
#[allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
pub const fn encode_voltage(spec: &VoltageSpec) -> EncodedVoltage {
    let offset = ((spec.offset_mv << 15) / 1000) & 0xFFE0;
    let static_ = (((spec.static_mv as i32) << 18) / 1000) & 0xF_FF00;

    let word = ((offset as u32) << 16)
        | (static_ as u32)
        | (spec.multiplier as u32)
        | ((spec.fixed as u32) << 20);
    EncodedVoltage(word)
}

/// Sends `spec` to `domain` with the FVID set command.
///
/// A zero multiplier is replaced by `max_ratio`, the domain's capability.
/// Returns the word that was sent.
///
/// # Errors
/// The mailbox's rejection, if any.
pub fn apply_voltage<B>(
    bus: &mut B,
    domain: Domain,
    spec: &VoltageSpec,
    max_ratio: u8,
) -> Result<EncodedVoltage, MailboxError>
where
    B: RegisterBus + ?Sized,
{
    let ratio = if spec.multiplier == 0 { max_ratio } else { spec.multiplier };
    let word = spec.encode().with_ratio(ratio);

    match Mailbox::new(bus).execute(MailboxCommand::SetFvidRatios, domain, word.raw()) {
        Ok(_) => {
            info!("{domain} voltage set: {} mV offset, {word}", spec.offset_mv);
            Ok(word)
        }
        Err(err) => {
            warn!("FAIL: {domain} voltage: {err}");
            Err(err)
        }
    }
}
