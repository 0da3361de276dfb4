use bitfield_struct::bitfield;

/// `MSR_FLEX_RATIO` (MSR `0x194`).
///
/// Bit 20 is the overclocking lock. Once set it stays set until the next
/// reset, and the OC mailbox rejects further ratio and voltage changes.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct FlexRatio {
    #[bits(8)]
    __: u8,

    /// Bits 8–15 — Flex ratio.
    #[bits(8)]
    pub flex_ratio: u8,

    /// Bit 16 — Flex ratio enable.
    pub enable: bool,

    /// Bits 17–19 — Extra voltage bins for overclocking.
    #[bits(3)]
    pub oc_bins: u8,

    /// Bit 20 — OC lock.
    pub oc_lock: bool,

    #[bits(43)]
    __: u64,
}

impl FlexRatio {
    /// Mask of the OC lock bit.
    pub const OC_LOCK: u64 = 1 << 20;
}

crate::impl_msr!(FlexRatio, 0x194);
