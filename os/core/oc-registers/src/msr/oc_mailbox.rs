use bitfield_struct::bitfield;

/// OC mailbox (MSR `0x150`).
///
/// Requests and responses share the register. A request carries the command
/// in bits 32–39 and the target domain in bits 40–47, with the run bit set.
/// When the processor has serviced it, bits 32–39 of the read-back hold the
/// completion code and the run bit is clear.
///
/// ```text
///  63  62..56  55..48   47..40   39..32          31..0
/// ┌───┬───────┬────────┬────────┬───────────────┬─────────┐
/// │RUN│  rsv  │ param2 │ domain │ command/status│  data   │
/// └───┴───────┴────────┴────────┴───────────────┴─────────┘
/// ```
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct OcMailbox {
    /// Bits 0–31 — Command payload or response data.
    #[bits(32)]
    pub data: u32,

    /// Bits 32–39 — Command on write, completion code on read-back.
    #[bits(8)]
    pub command: u8,

    /// Bits 40–47 — Parameter 1, the target domain.
    #[bits(8)]
    pub domain: u8,

    /// Bits 48–55 — Parameter 2.
    #[bits(8)]
    pub param2: u8,

    #[bits(7)]
    __: u8,

    /// Bit 63 — Run/busy. Set to execute; cleared by the processor when done.
    pub run_busy: bool,
}

impl OcMailbox {
    /// Builds an executable request.
    #[inline]
    #[must_use]
    pub const fn request(command: u8, domain: u8, data: u32) -> Self {
        Self::new()
            .with_data(data)
            .with_command(command)
            .with_domain(domain)
            .with_run_busy(true)
    }

    /// The completion code of a response, `(raw >> 32) & 0xFF`.
    #[inline]
    #[must_use]
    pub const fn status(self) -> u8 {
        self.command()
    }
}

crate::impl_msr!(OcMailbox, 0x150);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_layout() {
        // Get capabilities of the CLR domain.
        let req = OcMailbox::request(0x01, 0x02, 0);
        assert_eq!(req.into_bits(), 0x8000_0201_0000_0000);

        // Set FVID for the IA core domain.
        let req = OcMailbox::request(0x11, 0x00, 0xF713_EB2A);
        assert_eq!(req.into_bits(), 0x8000_0011_F713_EB2A);
    }

    #[test]
    fn response_status() {
        let rsp = OcMailbox::from_bits(0x0000_0007_0000_0000);
        assert_eq!(rsp.status(), 7);
        assert!(!rsp.run_busy());
    }
}
