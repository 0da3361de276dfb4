//! # Xeon v3 All-Core Turbo Unlock
//!
//! A UEFI driver-style application, run from the firmware's boot order or the
//! UEFI shell before the operating system loader. It raises the turbo ratio
//! limits of every active core count to the all-core maximum, optionally
//! undervolts core and cache, and sets the OC lock so the configuration
//! survives until the next reset.
//!
//! ## Sequence
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ 1. Compatibility gate                    │
//! │    • clear IA32_BIOS_SIGN_ID             │
//! │    • CPUID signature == expected         │
//! │    • no microcode update loaded          │
//! │    • OC lock not yet set                 │
//! │ 2. OC capabilities (core, cache)         │
//! │ 3. Turbo + uncore ratio limits           │
//! │ 4. FVID voltages (core, cache)           │
//! │ 5. SVID / FIVR (optional)                │
//! │ 6. Package power limits + MCHBAR mirror  │
//! │ 7. OC lock                               │
//! └──────────────────────────────────────────┘
//! ```
//!
//! A failed gate check leaves the machine untouched. Any other failure is
//! logged and the sequence carries on, so a partially applied configuration
//! can end up locked. The application returns `EFI_SUCCESS` either way.
//!
//! ## Features
//!
//! * `preset-undervolt` (default), `preset-stock`, `preset-mild`,
//!   `preset-any-cpu`: the configuration baked into the image.
//! * `qemu`: mirror the log to QEMU's debug console (port `0x402`).
//! * `verbose`: log every register write and mailbox response.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![no_main]
#![allow(unsafe_code)]

mod logger;
mod preset;

use crate::logger::UefiLogger;
use log::{LevelFilter, error, info, warn};
use oc_lockdown::{Lockdown, LockdownState};
use oc_registers::NativePlatform;
use uefi::prelude::*;

#[cfg(feature = "verbose")]
const LOG_LEVEL: LevelFilter = LevelFilter::Trace;
#[cfg(not(feature = "verbose"))]
const LOG_LEVEL: LevelFilter = LevelFilter::Info;

static LOGGER: UefiLogger = UefiLogger::new(LOG_LEVEL);

#[entry]
fn efi_main() -> Status {
    if uefi::helpers::init().is_err() {
        // Nothing to report to without a console.
        return Status::SUCCESS;
    }

    if UefiLogger::init(&LOGGER).is_err() {
        uefi::println!("Logger already installed");
    }

    info!(
        "Xeon v3 All-Core Turbo Unlock {} ({})",
        env!("CARGO_PKG_VERSION"),
        preset::NAME
    );

    // SAFETY: the firmware runs us at CPL0 on the bootstrap processor, before
    // any application processor has been started.
    let mut platform = unsafe { NativePlatform::new() };
    let report = Lockdown::new(&mut platform, &preset::CONFIG).run();

    match report.state {
        LockdownState::Locked if report.is_clean() => info!("Success"),
        LockdownState::Locked => warn!("Locked with failed steps: {}", report.soft_failures),
        LockdownState::Aborted(err) => error!("Failure: {err}; nothing was changed"),
        state => error!("Stopped in unexpected state {state}"),
    }

    Status::SUCCESS
}
