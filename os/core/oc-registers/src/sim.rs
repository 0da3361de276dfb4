//! # Simulated register file
//!
//! [`SimPlatform`] stands in for a processor in tests. It keeps MSR and MMIO
//! state in maps, records every access in order, and answers a few registers
//! the way hardware does:
//!
//! * **OC mailbox**: a write with the run bit set is answered immediately with
//!   the response scripted for its `(command, domain)` pair, or with a plain
//!   success (`0`) if none was scripted.
//! * **Microcode revision**: `CPUID` leaf 1 latches the configured revision into
//!   the upper half of `IA32_BIOS_SIGN_ID`, but only while the register reads
//!   `0`. A stale value survives `CPUID` until it is cleared, so only the usual
//!   "write 0, CPUID, read" sequence sees the current revision.
//!
//! Registers that were never written read as `0`.

use crate::cpuid::{Cpuid, CpuidResult, LEAF_01H, LEAF_8000_0000H, LEAF_BRAND_STRING};
use crate::msr::OcMailbox;
use crate::{MmioAddress, ModelSpecificRegister, Msr, RegisterBus};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// A single recorded access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadMsr(Msr),
    WriteMsr(Msr, u64),
    ReadMmio(MmioAddress),
    WriteMmio(MmioAddress, u32),
    Cpuid(u32),
}

impl Access {
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::WriteMsr(..) | Self::WriteMmio(..))
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimPlatform {
    msrs: BTreeMap<Msr, u64>,
    mmio: BTreeMap<MmioAddress, u32>,
    mailbox: BTreeMap<(u8, u8), u64>,
    signature: u32,
    microcode_revision: u32,
    brand: Option<[u8; 48]>,
    log: Vec<Access>,
}

impl SimPlatform {
    /// A processor reporting `signature` from `CPUID` leaf 1.
    #[must_use]
    pub fn new(signature: u32) -> Self {
        Self {
            signature,
            ..Self::default()
        }
    }

    /// Presets a register value. Not recorded in the access log.
    #[must_use]
    pub fn with_msr(mut self, msr: Msr, value: u64) -> Self {
        self.msrs.insert(msr, value);
        self
    }

    /// Presets a chipset register. Not recorded in the access log.
    #[must_use]
    pub fn with_mmio(mut self, address: MmioAddress, value: u32) -> Self {
        self.mmio.insert(address, value);
        self
    }

    /// Makes the processor report a loaded microcode update.
    #[must_use]
    pub fn with_microcode(mut self, revision: u32) -> Self {
        self.microcode_revision = revision;
        self
    }

    /// Makes the processor report a brand string, truncated to 48 bytes.
    #[must_use]
    pub fn with_brand_string(mut self, brand: &str) -> Self {
        let mut bytes = [0u8; 48];
        let len = brand.len().min(bytes.len());
        bytes[..len].copy_from_slice(&brand.as_bytes()[..len]);
        self.brand = Some(bytes);
        self
    }

    /// Scripts the mailbox's read-back for one command on one domain.
    #[must_use]
    pub fn with_mailbox_response(mut self, command: u8, domain: u8, response: u64) -> Self {
        self.mailbox.insert((command, domain), response);
        self
    }

    /// Current value of a register, without logging an access.
    #[must_use]
    pub fn msr(&self, msr: Msr) -> u64 {
        self.msrs.get(&msr).copied().unwrap_or_default()
    }

    /// Current value of a chipset register, without logging an access.
    #[must_use]
    pub fn mmio(&self, address: MmioAddress) -> u32 {
        self.mmio.get(&address).copied().unwrap_or_default()
    }

    /// Every access so far, oldest first.
    #[must_use]
    pub fn accesses(&self) -> &[Access] {
        &self.log
    }

    /// All MSR writes so far, oldest first.
    pub fn msr_writes(&self) -> impl Iterator<Item = (Msr, u64)> + '_ {
        self.log.iter().filter_map(|access| match *access {
            Access::WriteMsr(msr, value) => Some((msr, value)),
            _ => None,
        })
    }

    /// All MMIO writes so far, oldest first.
    pub fn mmio_writes(&self) -> impl Iterator<Item = (MmioAddress, u32)> + '_ {
        self.log.iter().filter_map(|access| match *access {
            Access::WriteMmio(address, value) => Some((address, value)),
            _ => None,
        })
    }

    /// Requests written to the OC mailbox so far, oldest first.
    pub fn mailbox_requests(&self) -> impl Iterator<Item = OcMailbox> + '_ {
        self.msr_writes()
            .filter(|(msr, _)| *msr == OcMailbox::MSR)
            .map(|(_, raw)| OcMailbox::from_bits(raw))
    }

    /// Number of writes of either kind.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.log.iter().filter(|access| access.is_write()).count()
    }

    /// Forgets the access log but keeps all register state.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn answer_mailbox(&mut self, raw: u64) -> u64 {
        let request = OcMailbox::from_bits(raw);
        if !request.run_busy() {
            return raw;
        }
        self.mailbox
            .get(&(request.command(), request.domain()))
            .copied()
            .unwrap_or_default()
    }
}

impl RegisterBus for SimPlatform {
    fn read_msr(&mut self, msr: Msr) -> u64 {
        self.log.push(Access::ReadMsr(msr));
        self.msr(msr)
    }

    fn write_msr(&mut self, msr: Msr, value: u64) {
        self.log.push(Access::WriteMsr(msr, value));
        let stored = if msr == OcMailbox::MSR {
            self.answer_mailbox(value)
        } else {
            value
        };
        self.msrs.insert(msr, stored);
    }

    fn read_mmio32(&mut self, address: MmioAddress) -> u32 {
        self.log.push(Access::ReadMmio(address));
        self.mmio(address)
    }

    fn write_mmio32(&mut self, address: MmioAddress, value: u32) {
        self.log.push(Access::WriteMmio(address, value));
        self.mmio.insert(address, value);
    }
}

impl Cpuid for SimPlatform {
    fn cpuid(&mut self, leaf: u32, _subleaf: u32) -> CpuidResult {
        self.log.push(Access::Cpuid(leaf));
        match (leaf, self.brand) {
            (LEAF_01H, _) => {
                if self.msr(Msr::IA32_BIOS_SIGN_ID) == 0 {
                    self.msrs.insert(
                        Msr::IA32_BIOS_SIGN_ID,
                        u64::from(self.microcode_revision) << 32,
                    );
                }
                CpuidResult {
                    eax: self.signature,
                    ..CpuidResult::default()
                }
            }
            (LEAF_8000_0000H, Some(_)) => CpuidResult {
                eax: LEAF_BRAND_STRING + 2,
                ..CpuidResult::default()
            },
            (leaf, Some(brand)) if (LEAF_BRAND_STRING..LEAF_BRAND_STRING + 3).contains(&leaf) => {
                let base = (leaf - LEAF_BRAND_STRING) as usize * 16;
                let reg = |i: usize| {
                    let at = base + i * 4;
                    u32::from_le_bytes([brand[at], brand[at + 1], brand[at + 2], brand[at + 3]])
                };
                CpuidResult {
                    eax: reg(0),
                    ebx: reg(1),
                    ecx: reg(2),
                    edx: reg(3),
                }
            }
            _ => CpuidResult::default(),
        }
    }
}
