use bitfield_struct::bitfield;

/// `MSR_TURBO_RATIO_LIMIT`, `_LIMIT1` and `_LIMIT2` (MSRs `0x1AD`–`0x1AF`).
///
/// Each register holds eight byte lanes, one maximum turbo ratio per active
/// core count. On parts with a third register, bit 63 of `0x1AF` is the
/// semaphore: writing it set commits all three registers as one set.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct TurboRatioLimit {
    #[bits(8)]
    pub lane0: u8,
    #[bits(8)]
    pub lane1: u8,
    #[bits(8)]
    pub lane2: u8,
    #[bits(8)]
    pub lane3: u8,
    #[bits(8)]
    pub lane4: u8,
    #[bits(8)]
    pub lane5: u8,
    #[bits(8)]
    pub lane6: u8,
    #[bits(8)]
    pub lane7: u8,
}

impl TurboRatioLimit {
    /// Bit 63 of the last ratio-limit register.
    pub const SEMAPHORE: u64 = 1 << 63;

    /// A register with `ratio` in every lane.
    #[inline]
    #[must_use]
    pub const fn uniform(ratio: u8) -> Self {
        Self::from_bits(u64::from_ne_bytes([ratio; 8]))
    }

    /// The raw value with the commit semaphore set.
    #[inline]
    #[must_use]
    pub const fn with_semaphore(self) -> u64 {
        self.into_bits() | Self::SEMAPHORE
    }
}
