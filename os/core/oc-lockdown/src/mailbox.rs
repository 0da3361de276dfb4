//! # OC mailbox client
//!
//! The overclocking mailbox multiplexes a small command set over MSR `0x150`.
//! A request names a command and a domain and carries a 32-bit payload; the
//! processor answers in the same register with a completion code in bits
//! 32–39 and response data in the low half.
//!
//! ```text
//! write  0x150 ← RUN | command << 32 | domain << 40 | payload
//! read   0x150 → status << 32 | data
//! ```
//!
//! The read-back follows the write immediately. Commands are assumed to have
//! completed by then; if the run bit is still set the response is reported as
//! [`MailboxError::Busy`] rather than polled.

use core::fmt;
use log::{debug, trace};
use oc_registers::msr::OcMailbox;
use oc_registers::{ModelSpecificRegister, RegisterBus};

/// Mailbox commands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MailboxCommand {
    GetCapabilities = 0x01,
    GetTurboRatios = 0x02,
    GetFvidRatios = 0x10,
    SetFvidRatios = 0x11,
    GetSvidParams = 0x12,
    SetSvidParams = 0x13,
    GetFivrParams = 0x14,
    SetFivrParams = 0x15,
}

impl MailboxCommand {
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetCapabilities => "get capabilities",
            Self::GetTurboRatios => "get turbo ratios",
            Self::GetFvidRatios => "get FVID/ratios",
            Self::SetFvidRatios => "set FVID/ratios",
            Self::GetSvidParams => "get SVID params",
            Self::SetSvidParams => "set SVID params",
            Self::GetFivrParams => "get FIVR params",
            Self::SetFivrParams => "set FIVR params",
        }
    }
}

impl fmt::Display for MailboxCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Address spaces the command set applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Domain {
    /// IA cores.
    IaCore = 0x00,
    /// Graphics.
    Graphics = 0x01,
    /// CBo, LLC and ring ("CLR"), a.k.a. cache or uncore.
    Cache = 0x02,
    /// System agent.
    SystemAgent = 0x03,
    /// Analog I/O.
    AnalogIo = 0x04,
    /// Digital I/O.
    DigitalIo = 0x05,
}

impl Domain {
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::IaCore => "IA core",
            Self::Graphics => "graphics",
            Self::Cache => "cache",
            Self::SystemAgent => "system agent",
            Self::AnalogIo => "analog I/O",
            Self::DigitalIo => "digital I/O",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Completion code of a mailbox response.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MailboxStatus {
    Success,
    OcLocked,
    InvalidDomain,
    MaxRatioExceeded,
    MaxVoltageExceeded,
    OcNotSupported,
    WriteFailed,
    RebootRequired,
    Unknown(u8),
}

impl MailboxStatus {
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            0x00 => Self::Success,
            0x01 => Self::OcLocked,
            0x02 => Self::InvalidDomain,
            0x03 => Self::MaxRatioExceeded,
            0x04 => Self::MaxVoltageExceeded,
            0x05 => Self::OcNotSupported,
            0x06 => Self::WriteFailed,
            0x07 => Self::RebootRequired,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0x00,
            Self::OcLocked => 0x01,
            Self::InvalidDomain => 0x02,
            Self::MaxRatioExceeded => 0x03,
            Self::MaxVoltageExceeded => 0x04,
            Self::OcNotSupported => 0x05,
            Self::WriteFailed => 0x06,
            Self::RebootRequired => 0x07,
            Self::Unknown(code) => code,
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for MailboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::OcLocked => f.write_str("overclocking locked"),
            Self::InvalidDomain => f.write_str("invalid domain"),
            Self::MaxRatioExceeded => f.write_str("maximum ratio exceeded"),
            Self::MaxVoltageExceeded => f.write_str("maximum voltage exceeded"),
            Self::OcNotSupported => f.write_str("overclocking not supported"),
            Self::WriteFailed => f.write_str("write failed"),
            Self::RebootRequired => f.write_str("takes effect after reboot"),
            Self::Unknown(code) => write!(f, "error code {code:#04x}"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailboxError {
    #[error("{command} on {domain} domain failed: {status}")]
    Command {
        command: MailboxCommand,
        domain: Domain,
        status: MailboxStatus,
    },
    #[error("{command} on {domain} domain did not complete")]
    Busy {
        command: MailboxCommand,
        domain: Domain,
    },
}

/// Raw read-back of the mailbox register.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MailboxResponse(OcMailbox);

impl MailboxResponse {
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(OcMailbox::from_bits(raw))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0.into_bits()
    }

    /// Response data, the low 32 bits.
    #[must_use]
    pub const fn data(self) -> u32 {
        self.0.data()
    }

    /// `(raw >> 32) & 0xFF`; non-zero signals failure.
    #[must_use]
    pub const fn error_code(self) -> u8 {
        self.0.status()
    }

    #[must_use]
    pub const fn status(self) -> MailboxStatus {
        MailboxStatus::from_code(self.error_code())
    }

    /// The run bit was still set on read-back.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        self.0.run_busy()
    }

    /// Turns the completion code into a `Result`.
    ///
    /// # Errors
    /// [`MailboxError::Busy`] if the command had not completed, otherwise
    /// [`MailboxError::Command`] for any non-zero completion code.
    pub const fn check(self, command: MailboxCommand, domain: Domain) -> Result<Self, MailboxError> {
        if self.is_busy() {
            return Err(MailboxError::Busy { command, domain });
        }
        let status = self.status();
        if status.is_success() {
            Ok(self)
        } else {
            Err(MailboxError::Command {
                command,
                domain,
                status,
            })
        }
    }
}

/// Issues commands through the mailbox register of `bus`.
pub struct Mailbox<'a, B: ?Sized> {
    bus: &'a mut B,
}

impl<'a, B> Mailbox<'a, B>
where
    B: RegisterBus + ?Sized,
{
    pub const fn new(bus: &'a mut B) -> Self {
        Self { bus }
    }

    /// Writes one request and reads the register straight back.
    pub fn send(&mut self, command: MailboxCommand, domain: Domain, payload: u32) -> MailboxResponse {
        let request = OcMailbox::request(command.code(), domain.code(), payload);
        trace!(
            "mailbox <- {:#018x} ({command}, {domain}, payload {payload:#010x})",
            request.into_bits()
        );
        request.store(&mut *self.bus);

        let response = MailboxResponse(OcMailbox::load(&mut *self.bus));
        debug!(
            "mailbox -> {:#018x} ({command}, {domain}: {})",
            response.raw(),
            response.status()
        );
        response
    }

    /// [`send`](Self::send) followed by [`MailboxResponse::check`].
    ///
    /// # Errors
    /// See [`MailboxResponse::check`].
    pub fn execute(
        &mut self,
        command: MailboxCommand,
        domain: Domain,
        payload: u32,
    ) -> Result<MailboxResponse, MailboxError> {
        self.send(command, domain, payload).check(command, domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_registers::sim::SimPlatform;

    #[test]
    fn request_encodes_command_domain_and_payload() {
        let mut sim = SimPlatform::new(0x306F2);
        let _ = Mailbox::new(&mut sim).send(MailboxCommand::SetFvidRatios, Domain::Cache, 0xF980_0024);

        let requests: Vec<_> = sim.mailbox_requests().map(OcMailbox::into_bits).collect();
        assert_eq!(requests, [0x8000_0211_F980_0024]);
    }

    #[test]
    fn response_is_read_back_from_the_same_register() {
        let mut sim = SimPlatform::new(0x306F2).with_mailbox_response(0x01, 0x00, 0x0000_0000_0000_072C);
        let response = Mailbox::new(&mut sim).send(MailboxCommand::GetCapabilities, Domain::IaCore, 0);
        assert_eq!(response.raw(), 0x072C);
        assert_eq!(response.data(), 0x072C);
        assert_eq!(response.error_code(), 0);
    }

    #[test]
    fn error_code_is_bits_32_to_39() {
        let response = MailboxResponse::from_raw(0x0000_00A5_0000_0000);
        assert_eq!(response.error_code(), 0xA5);
        assert_eq!(response.status(), MailboxStatus::Unknown(0xA5));
    }

    #[test]
    fn non_zero_status_is_an_error() {
        let mut sim = SimPlatform::new(0x306F2).with_mailbox_response(0x11, 0x00, 0x0000_0004_0000_0000);
        let err = Mailbox::new(&mut sim)
            .execute(MailboxCommand::SetFvidRatios, Domain::IaCore, 0)
            .unwrap_err();
        assert_eq!(
            err,
            MailboxError::Command {
                command: MailboxCommand::SetFvidRatios,
                domain: Domain::IaCore,
                status: MailboxStatus::MaxVoltageExceeded,
            }
        );
    }

    #[test]
    fn run_bit_on_read_back_is_busy() {
        let response = MailboxResponse::from_raw(0x8000_0000_0000_0000);
        assert_eq!(
            response.check(MailboxCommand::GetCapabilities, Domain::Cache),
            Err(MailboxError::Busy {
                command: MailboxCommand::GetCapabilities,
                domain: Domain::Cache,
            })
        );
    }

    #[test]
    fn status_codes_roundtrip() {
        for code in 0..=0xFF_u8 {
            assert_eq!(MailboxStatus::from_code(code).code(), code);
        }
    }
}
