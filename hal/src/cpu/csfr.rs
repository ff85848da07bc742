//! # Core Special-Function Registers
//!
//! Access to per-core CSFRs (core id, interrupt control, vector base,
//! cache control). On the TriCore target these are `mfcr`/`mtcr`
//! instructions taking the register address as an immediate, hence the
//! const-generic access functions. Host builds are routed to the register
//! model in [`crate::sim`] so the surrounding logic is testable.

// ============================================================================
// CSFR addresses
// ============================================================================

/// Core identification register.
pub const CORE_ID: u16 = 0xFE1C;

/// Base address of the interrupt vector table (vector base register).
pub const BIV: u16 = 0xFE20;

/// Interrupt control register: current priority (CCPN) and enable (IE).
pub const ICR: u16 = 0xFE2C;

/// Program cache control: bypass.
pub const PCON0: u16 = 0x920C;

/// Program cache control: invalidate.
pub const PCON1: u16 = 0x9204;

/// Data cache control: bypass.
pub const DCON0: u16 = 0x9040;

// ============================================================================
// Field layout
// ============================================================================

/// ICR.CCPN - current CPU priority number.
pub const ICR_CCPN_MASK: u32 = 0x0000_00FF;

/// ICR.IE - global interrupt enable for the core.
pub const ICR_IE: u32 = 1 << 15;

/// PCON0.PCBYP / DCON0.DCBYP - cache bypass (1 = cache disabled).
pub const CON0_BYPASS: u32 = 1 << 1;

/// PCON1.PCINV - invalidate program cache contents.
pub const PCON1_INVALIDATE: u32 = 1 << 0;

// ============================================================================
// Register access
// ============================================================================

cfg_if::cfg_if! {
    if #[cfg(target_arch = "tricore")] {
        /// Read a core special-function register.
        #[inline]
        pub fn mfcr<const ADDR: u16>() -> u32 {
            let value: u32;
            unsafe {
                core::arch::asm!(
                    "mfcr {0}, {1}",
                    out(reg) value,
                    const ADDR,
                    options(nomem, nostack, preserves_flags),
                );
            }
            value
        }

        /// Write a core special-function register.
        ///
        /// # Safety
        /// CSFRs steer core-critical behavior; the caller must hold the
        /// matching ENDINIT unlock where the register requires it.
        #[inline]
        pub unsafe fn mtcr<const ADDR: u16>(value: u32) {
            unsafe {
                core::arch::asm!(
                    "mtcr {1}, {0}",
                    in(reg) value,
                    const ADDR,
                    options(nomem, nostack),
                );
            }
        }

        /// Instruction synchronization barrier.
        ///
        /// Guarantees that CSFR updates (vector base, cache control) are
        /// observed by subsequent instruction fetches and exception entries.
        #[inline]
        pub fn isync() {
            unsafe {
                core::arch::asm!("isync", options(nostack, preserves_flags));
            }
        }

        /// Enable interrupt taking on the calling core.
        #[inline]
        pub fn enable_interrupts() {
            unsafe {
                core::arch::asm!("enable", options(nostack, preserves_flags));
            }
        }

        /// Disable interrupt taking on the calling core.
        #[inline]
        pub fn disable_interrupts() {
            unsafe {
                core::arch::asm!("disable", options(nostack, preserves_flags));
            }
        }

        /// Breakpoint trap; halts into an attached debugger.
        #[inline]
        pub fn debug_trap() {
            unsafe {
                core::arch::asm!("debug", options(nostack, preserves_flags));
            }
        }
    } else {
        use crate::sim;

        /// Read a core special-function register (host model).
        #[inline]
        pub fn mfcr<const ADDR: u16>() -> u32 {
            sim::csfr_read(sim::current_core(), ADDR)
        }

        /// Write a core special-function register (host model).
        ///
        /// # Safety
        /// Mirrors the target signature; the host model accepts any write.
        #[inline]
        pub unsafe fn mtcr<const ADDR: u16>(value: u32) {
            sim::csfr_write(sim::current_core(), ADDR, value);
        }

        /// Instruction synchronization barrier (recorded by the host model).
        #[inline]
        pub fn isync() {
            sim::record_isync();
        }

        /// Enable interrupt taking on the calling core (host model).
        #[inline]
        pub fn enable_interrupts() {
            let core = sim::current_core();
            sim::csfr_write(core, ICR, sim::csfr_read(core, ICR) | ICR_IE);
        }

        /// Disable interrupt taking on the calling core (host model).
        #[inline]
        pub fn disable_interrupts() {
            let core = sim::current_core();
            sim::csfr_write(core, ICR, sim::csfr_read(core, ICR) & !ICR_IE);
        }

        /// Breakpoint trap (recorded by the host model).
        #[inline]
        pub fn debug_trap() {
            sim::record_debug_trap();
        }
    }
}
