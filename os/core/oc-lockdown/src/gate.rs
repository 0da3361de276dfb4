//! # Compatibility gate
//!
//! Four checks run in a fixed order before anything is changed. Any failure
//! ends the routine; the only write the gate itself makes is the clear of
//! `IA32_BIOS_SIGN_ID` that precedes the microcode check.

use log::{error, info};
use oc_registers::msr::{FlexRatio, Ia32BiosSignId};
use oc_registers::{ModelSpecificRegister, Platform, ProcessorSignature};

/// Why the gate refused to let the routine continue.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("processor signature mismatch: expected {expected}, found {found}")]
    SignatureMismatch {
        expected: ProcessorSignature,
        found: ProcessorSignature,
    },
    #[error("microcode update {revision:#x} is loaded")]
    MicrocodePresent { revision: u32 },
    #[error("overclocking is already locked")]
    OcLocked,
}

/// Runs the checks against `platform`.
///
/// Returns the signature of the running processor when every check passes.
///
/// # Errors
/// The first failed check, see [`GateError`].
pub fn check<P>(platform: &mut P, expected: ProcessorSignature) -> Result<ProcessorSignature, GateError>
where
    P: Platform + ?Sized,
{
    // The revision only shows up after a clear followed by CPUID leaf 1.
    Ia32BiosSignId::new().store(platform);

    let found = platform.signature();
    if !expected.accepts(found) {
        let err = GateError::SignatureMismatch { expected, found };
        error!("FAIL: {err}");
        return Err(err);
    }
    info!("Processor {found}");

    let sign_id = Ia32BiosSignId::load(platform);
    if sign_id.has_microcode() {
        let err = GateError::MicrocodePresent {
            revision: sign_id.microcode_revision(),
        };
        error!("FAIL: {err}, remove it before unlocking");
        return Err(err);
    }

    if FlexRatio::load(platform).oc_lock() {
        error!("FAIL: {}", GateError::OcLocked);
        return Err(GateError::OcLocked);
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_registers::Msr;
    use oc_registers::sim::{Access, SimPlatform};

    const HASWELL_E: u32 = 0x306F2;

    #[test]
    fn passes_on_clean_matching_processor() {
        let mut sim = SimPlatform::new(HASWELL_E);
        let found = check(&mut sim, ProcessorSignature::HASWELL_E_C1).unwrap();
        assert_eq!(found.raw(), HASWELL_E);
        assert_eq!(found.effective_model(), 0x3F);
    }

    #[test]
    fn wildcard_accepts_any_processor() {
        let mut sim = SimPlatform::new(0x906EA);
        assert!(check(&mut sim, ProcessorSignature::ANY).is_ok());
    }

    #[test]
    fn checks_run_in_order() {
        let mut sim = SimPlatform::new(HASWELL_E);
        check(&mut sim, ProcessorSignature::HASWELL_E_C1).unwrap();
        assert_eq!(
            sim.accesses(),
            [
                Access::WriteMsr(Msr::IA32_BIOS_SIGN_ID, 0),
                Access::Cpuid(0x01),
                Access::ReadMsr(Msr::IA32_BIOS_SIGN_ID),
                Access::ReadMsr(Msr::FLEX_RATIO),
            ]
        );
    }

    #[test]
    fn mismatch_reports_both_signatures() {
        let mut sim = SimPlatform::new(0x306F4);
        let err = check(&mut sim, ProcessorSignature::HASWELL_E_C1).unwrap_err();
        assert_eq!(
            err,
            GateError::SignatureMismatch {
                expected: ProcessorSignature::HASWELL_E_C1,
                found: ProcessorSignature::from_eax(0x306F4),
            }
        );
    }

    #[test]
    fn stale_sign_id_is_cleared_first() {
        // Without the clear, CPUID leaves the leftover revision in place.
        let mut sim = SimPlatform::new(HASWELL_E).with_msr(Msr::IA32_BIOS_SIGN_ID, 0x0000_0029_0000_0000);
        assert!(check(&mut sim, ProcessorSignature::HASWELL_E_C1).is_ok());
        assert_eq!(sim.msr(Msr::IA32_BIOS_SIGN_ID), 0);
    }

    #[test]
    fn microcode_aborts() {
        let mut sim = SimPlatform::new(HASWELL_E).with_microcode(0x2D);
        assert_eq!(
            check(&mut sim, ProcessorSignature::HASWELL_E_C1),
            Err(GateError::MicrocodePresent { revision: 0x2D })
        );
    }

    #[test]
    fn lock_bit_aborts() {
        let mut sim = SimPlatform::new(HASWELL_E).with_msr(Msr::FLEX_RATIO, FlexRatio::OC_LOCK);
        assert_eq!(check(&mut sim, ProcessorSignature::HASWELL_E_C1), Err(GateError::OcLocked));
        assert_eq!(sim.write_count(), 1);
    }
}
