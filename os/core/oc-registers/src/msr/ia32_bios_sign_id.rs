use bitfield_struct::bitfield;

/// `IA32_BIOS_SIGN_ID` — BIOS Update Signature (MSR `0x08B`).
///
/// After writing `0` to this register and executing `CPUID` leaf 1, the upper
/// half holds the revision of the loaded microcode update. A revision of `0`
/// means no update has been applied.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct Ia32BiosSignId {
    /// Bits 0–31 — Reserved.
    #[bits(32)]
    __: u32,

    /// Bits 32–63 — Microcode update signature (revision).
    #[bits(32)]
    pub microcode_revision: u32,
}

impl Ia32BiosSignId {
    /// Whether a microcode update is loaded.
    #[inline]
    #[must_use]
    pub const fn has_microcode(self) -> bool {
        self.microcode_revision() != 0
    }
}

crate::impl_msr!(Ia32BiosSignId, 0x08B);
