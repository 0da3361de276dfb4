//! # Processor identification
//!
//! `CPUID` leaf `0x01` returns the processor signature in `EAX`. The routine
//! compares the raw 32-bit value against the expected one; [`ProcessorSignature`]
//! decodes it for logging.

use bitfield_struct::bitfield;
use core::fmt;

pub const LEAF_01H: u32 = 0x01;

/// Highest supported extended leaf, in `EAX`.
pub const LEAF_8000_0000H: u32 = 0x8000_0000;

/// First of the three processor brand string leaves.
pub const LEAF_BRAND_STRING: u32 = 0x8000_0002;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[repr(C)]
pub struct CpuidResult {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

/// Source of `CPUID` results.
pub trait Cpuid {
    /// Executes `CPUID` with the given leaf and subleaf.
    fn cpuid(&mut self, leaf: u32, subleaf: u32) -> CpuidResult;

    /// The processor signature from leaf `0x01`.
    #[inline]
    fn signature(&mut self) -> ProcessorSignature {
        ProcessorSignature::from_eax(self.cpuid(LEAF_01H, 0).eax)
    }

    /// The processor brand string from leaves `0x8000_0002`–`0x8000_0004`.
    ///
    /// Empty if the processor doesn't report one.
    fn brand_string(&mut self) -> BrandString {
        let mut brand = BrandString::default();
        if self.cpuid(LEAF_8000_0000H, 0).eax < LEAF_BRAND_STRING + 2 {
            return brand;
        }

        for (i, leaf) in (LEAF_BRAND_STRING..LEAF_BRAND_STRING + 3).enumerate() {
            let r = self.cpuid(leaf, 0);
            for (j, reg) in [r.eax, r.ebx, r.ecx, r.edx].into_iter().enumerate() {
                let at = i * 16 + j * 4;
                brand.0[at..at + 4].copy_from_slice(&reg.to_le_bytes());
            }
        }
        brand
    }
}

/// The 48-byte, NUL-padded processor brand string.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BrandString([u8; 48]);

impl BrandString {
    /// Wraps raw brand string bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 48]) -> Self {
        Self(bytes)
    }

    /// The brand without padding, or `""` if it isn't ASCII.
    #[must_use]
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(self.0.len());
        match core::str::from_utf8(&self.0[..end]) {
            Ok(brand) if brand.is_ascii() => brand.trim(),
            _ => "",
        }
    }
}

impl Default for BrandString {
    fn default() -> Self {
        Self([0; 48])
    }
}

impl fmt::Display for BrandString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPUID.01H:EAX — Version Information.
///
/// Reference: Intel SDM Vol. 2A, CPUID leaf 01H, EAX layout.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct ProcessorSignature {
    /// Stepping ID (bits 3:0).
    #[bits(4)]
    pub stepping: u8,
    /// Base model (bits 7:4).
    #[bits(4)]
    pub model: u8,
    /// Base family (bits 11:8).
    #[bits(4)]
    pub family: u8,
    /// Processor type (bits 13:12).
    #[bits(2)]
    pub cpu_type: u8,
    #[bits(2)]
    __: u8,
    /// Extended model (bits 19:16).
    #[bits(4)]
    pub ext_model: u8,
    /// Extended family (bits 27:20).
    #[bits(8)]
    pub ext_family: u8,
    #[bits(4)]
    __: u8,
}

impl ProcessorSignature {
    /// Matches every processor when used as the expected signature.
    pub const ANY: Self = Self::from_bits(0xFFFF_FFFF);

    /// Haswell-EP/EX, stepping 2 (Xeon E5/E7 v3).
    pub const HASWELL_E_C1: Self = Self::from_bits(0x0003_06F2);

    /// Wraps the raw `EAX` of leaf `0x01`.
    #[inline]
    #[must_use]
    pub const fn from_eax(eax: u32) -> Self {
        Self::from_bits(eax)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.into_bits()
    }

    #[inline]
    #[must_use]
    pub const fn is_any(self) -> bool {
        self.raw() == Self::ANY.raw()
    }

    /// Whether `found` satisfies this expected signature.
    #[inline]
    #[must_use]
    pub const fn accepts(self, found: Self) -> bool {
        self.is_any() || self.raw() == found.raw()
    }

    /// Effective family per SDM:
    /// if base family == 0x0F → base + `ext_family`, else base.
    #[inline]
    #[must_use]
    pub fn effective_family(self) -> u16 {
        let fam = u16::from(self.family());
        if fam == 0x0F {
            fam + u16::from(self.ext_family())
        } else {
            fam
        }
    }

    /// Effective model per SDM:
    /// if base family in {0x06, 0x0F} → `base_model` | (`ext_model` << 4), else `base_model`.
    #[inline]
    #[must_use]
    pub const fn effective_model(self) -> u8 {
        let fam = self.family();
        let base = self.model();
        if fam == 0x06 || fam == 0x0F {
            base | (self.ext_model() << 4)
        } else {
            base
        }
    }
}

impl fmt::Display for ProcessorSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return f.write_str("any");
        }
        write!(
            f,
            "{:#07X} (family {:#X}, model {:#X}, stepping {})",
            self.raw(),
            self.effective_family(),
            self.effective_model(),
            self.stepping()
        )
    }
}

/// Execute CPUID with the given leaf and subleaf.
///
/// # Safety
/// The `cpuid` instruction must be available, which it is on every x86-64 part.
#[cfg(all(feature = "asm", target_arch = "x86_64"))]
#[inline(always)]
#[allow(unused_assignments, clippy::inline_always)]
pub unsafe fn cpuid(leaf: u32, subleaf: u32) -> CpuidResult {
    let (mut eax, mut ebx, mut ecx, mut edx) = (leaf, 0u32, subleaf, 0u32);
    unsafe {
        core::arch::asm!(
            "push rbx",
            "cpuid",
            "mov {ebx_out:e}, ebx", // move EBX to a free GPR we bind
            "pop rbx",
            ebx_out = lateout(reg) ebx,
            inlateout("eax") eax,
            inlateout("ecx") ecx,
            lateout("edx") edx,
            options(nomem, preserves_flags),
        );
    }
    CpuidResult { eax, ebx, ecx, edx }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haswell_e_decodes() {
        let sig = ProcessorSignature::HASWELL_E_C1;
        assert_eq!(sig.effective_family(), 6);
        assert_eq!(sig.effective_model(), 0x3F);
        assert_eq!(sig.stepping(), 2);
    }

    #[test]
    fn brand_string_is_trimmed() {
        let mut bytes = [0u8; 48];
        let brand = b"  Intel(R) Xeon(R) CPU E5-2696 v3 @ 2.30GHz";
        bytes[..brand.len()].copy_from_slice(brand);
        let brand = BrandString::from_bytes(bytes);
        assert_eq!(brand.as_str(), "Intel(R) Xeon(R) CPU E5-2696 v3 @ 2.30GHz");
        assert_eq!(BrandString::default().as_str(), "");
    }

    #[test]
    fn wildcard_accepts_everything() {
        assert!(ProcessorSignature::ANY.accepts(ProcessorSignature::from_eax(0x0005_0654)));
        assert!(ProcessorSignature::HASWELL_E_C1.accepts(ProcessorSignature::from_eax(0x0003_06F2)));
        assert!(!ProcessorSignature::HASWELL_E_C1.accepts(ProcessorSignature::from_eax(0x0003_06F4)));
    }

    #[test]
    fn from_eax_decodes_haswell_ep() {
        let sig = ProcessorSignature::from_eax(0x0003_06F2);
        assert_eq!(sig.raw(), 0x0003_06F2);
        assert_eq!(sig.stepping(), 2);
        assert_eq!(sig.effective_family(), 6);
        assert_eq!(ProcessorSignature::new().raw(), 0);
    }
}
