use bitfield_struct::bitfield;

/// `MSR_UNCORE_RATIO_LIMIT` (MSR `0x620`).
///
/// Only the low 16 bits are ours; everything above is carried through
/// unchanged on a read-modify-write.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct UncoreRatioLimit {
    /// Bits 0–7 — Maximum uncore (CLR) ratio.
    #[bits(8)]
    pub max_ratio: u8,

    /// Bits 8–15 — Minimum uncore (CLR) ratio.
    #[bits(8)]
    pub min_ratio: u8,

    /// Bits 16–63 — Preserved.
    #[bits(48)]
    pub preserved: u64,
}

crate::impl_msr!(UncoreRatioLimit, 0x620);
