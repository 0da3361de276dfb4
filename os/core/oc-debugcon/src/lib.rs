//! # QEMU debug console output
//!
//! When the driver is tested under QEMU with `-debugcon stdio` (or
//! `-debugcon file:debug.log`), every byte written to I/O port `0x402` shows up
//! on the host. This crate provides that sink and the [`debugcon_trace!`]
//! macro that formats straight into it, without allocating.
//!
//! Output only happens with the `enabled` feature. Without it the macro still
//! type-checks its arguments but compiles to nothing, which is what release
//! images flashed to real boards should use.
//!
//! ```rust,ignore
//! use oc_debugcon::debugcon_trace;
//!
//! debugcon_trace!("turbo ratio limit = {:#018x}\n", value);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(all(feature = "enabled", target_arch = "x86_64"))]
#[doc(hidden)]
pub mod debugcon_fmt {
    use core::fmt::{self, Write};

    /// The port QEMU's `-debugcon` device listens on.
    const DEBUGCON_PORT: u16 = 0x402;

    #[allow(clippy::inline_always)]
    #[inline(always)]
    fn putc(c: u8) {
        unsafe {
            core::arch::asm!(
            "out dx, al",
            in("dx") DEBUGCON_PORT,
            in("al") c,
            options(nomem, nostack, preserves_flags)
            );
        }
    }

    pub struct DebugconSink;

    impl Write for DebugconSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for b in s.bytes() {
                putc(b);
            }
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline]
    pub fn debugcon_write(args: fmt::Arguments) {
        // Best effort; there is nobody to report a failed debug write to.
        let _ = fmt::write(&mut DebugconSink, args);
    }
}

#[cfg(not(all(feature = "enabled", target_arch = "x86_64")))]
#[doc(hidden)]
pub mod debugcon_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline(always)]
    #[allow(clippy::inline_always, clippy::needless_pass_by_value)]
    pub fn debugcon_write(_: fmt::Arguments) {}
}

/// Formats to the QEMU debug console, if enabled.
#[macro_export]
macro_rules! debugcon_trace {
    ($($arg:tt)*) => {{
        $crate::debugcon_fmt::debugcon_write(core::format_args!($($arg)*));
    }};
}

/// Whether output actually reaches the debug port in this build.
#[must_use]
pub const fn is_enabled() -> bool {
    cfg!(all(feature = "enabled", target_arch = "x86_64"))
}

#[cfg(test)]
mod tests {
    #[test]
    fn disabled_trace_is_a_no_op() {
        // Host test builds never have the port available.
        if !super::is_enabled() {
            debugcon_trace!("value = {}\n", 42);
        }
    }
}
