//! # Watchdogs & ENDINIT Protection
//!
//! Safety-gated registers (vector base, flash timing, clock and PLL
//! configuration) are writable only while the matching ENDINIT bit is
//! clear. Two lock domains exist:
//!
//! - the calling core's watchdog guards core-local registers
//!   ([`EndinitGuard`]);
//! - the safety watchdog guards SCU/CCU/PLL and power registers
//!   ([`SafetyEndinitGuard`]).
//!
//! Both guards follow the hardware's password protocol: a password access
//! opens the modify window, a modify access writes the new ENDINIT state,
//! and a bounded spin confirms the hardware took it. Dropping the guard
//! relocks; the single exit path is the `Drop` impl, so no early return
//! can leak an open window.
//!
//! The unlock sequence is not reentrant across interrupt preemption on
//! the same core. In this layer it only runs from initialization code
//! before interrupt taking is enabled, which removes the hazard.

use super::{regs, WdtRegs};
use crate::cpu::CoreId;

// ============================================================================
// CON0 / CON1 layout
// ============================================================================

/// CON0.ENDINIT - protected registers locked while set.
pub const CON0_ENDINIT: u32 = 1 << 0;

/// CON0.LCK - CON0 itself locked against modification while set.
pub const CON0_LCK: u32 = 1 << 1;

/// CON0.PW - password field.
pub const CON0_PW_MASK: u32 = 0x0000_FFFC;

/// CON1.DR - disable request; the watchdog stops counting while set.
pub const CON1_DR: u32 = 1 << 3;

// ============================================================================
// Password protocol
// ============================================================================

/// Clear ENDINIT on one watchdog instance.
fn clear_endinit(wdt: &WdtRegs) {
    let password = wdt.con0.read() & CON0_PW_MASK;

    // Password access: current password, LCK cleared, ENDINIT set.
    wdt.con0.write(password | CON0_ENDINIT);
    // Modify access: relock CON0 with ENDINIT cleared.
    wdt.con0.write(password | CON0_LCK);

    wdt.con0.wait_clear(CON0_ENDINIT);
}

/// Set ENDINIT on one watchdog instance.
fn set_endinit(wdt: &WdtRegs) {
    let password = wdt.con0.read() & CON0_PW_MASK;

    wdt.con0.write(password | CON0_ENDINIT);
    wdt.con0.write(password | CON0_LCK | CON0_ENDINIT);

    wdt.con0.wait_set(CON0_ENDINIT);
}

/// The calling core's watchdog instance.
fn cpu_wdt() -> &'static WdtRegs {
    &regs().wdtcpu[CoreId::current().index()]
}

// ============================================================================
// Scoped unlock guards
// ============================================================================

/// Open ENDINIT window on the calling core's watchdog.
///
/// Guards core-local protected registers (BIV, cache control, flash
/// timing, pad driver strength).
pub struct EndinitGuard(());

impl EndinitGuard {
    /// Clear ENDINIT; it is restored when the guard drops.
    pub fn open() -> Self {
        clear_endinit(cpu_wdt());
        Self(())
    }
}

impl Drop for EndinitGuard {
    fn drop(&mut self) {
        set_endinit(cpu_wdt());
    }
}

/// Open Safety-ENDINIT window on the safety watchdog.
///
/// Guards the SCU clock, PLL and power registers.
pub struct SafetyEndinitGuard(());

impl SafetyEndinitGuard {
    /// Clear Safety-ENDINIT; it is restored when the guard drops.
    pub fn open() -> Self {
        clear_endinit(&regs().wdts);
        Self(())
    }
}

impl Drop for SafetyEndinitGuard {
    fn drop(&mut self) {
        set_endinit(&regs().wdts);
    }
}

// ============================================================================
// Watchdog disable
// ============================================================================

/// Disable the safety watchdog.
///
/// Called once by the reset core before any long-running initialization.
pub fn disable_safety_watchdog() {
    let scu = regs();
    let _window = SafetyEndinitGuard::open();
    scu.wdts.con1.set_bits(CON1_DR);
}

/// Disable the calling core's watchdog.
pub fn disable_cpu_watchdog() {
    let _window = EndinitGuard::open();
    cpu_wdt().con1.set_bits(CON1_DR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn guard_opens_and_restores_endinit() {
        let _guard = sim::lock();
        sim::set_current_core(0);
        let wdt = cpu_wdt();

        {
            let _window = EndinitGuard::open();
            assert_eq!(wdt.con0.read() & CON0_ENDINIT, 0);
        }
        assert_ne!(wdt.con0.read() & CON0_ENDINIT, 0);
    }

    #[test]
    fn safety_guard_targets_the_safety_instance() {
        let _guard = sim::lock();
        let scu = regs();

        {
            let _window = SafetyEndinitGuard::open();
            assert_eq!(scu.wdts.con0.read() & CON0_ENDINIT, 0);
            // The per-core instance is untouched.
            assert_ne!(scu.wdtcpu[0].con0.read() & CON0_ENDINIT, 0);
        }
        assert_ne!(scu.wdts.con0.read() & CON0_ENDINIT, 0);
    }

    #[test]
    fn disable_requests_are_latched() {
        let _guard = sim::lock();
        sim::set_current_core(1);
        disable_cpu_watchdog();
        assert_ne!(regs().wdtcpu[1].con1.read() & CON1_DR, 0);

        disable_safety_watchdog();
        assert_ne!(regs().wdts.con1.read() & CON1_DR, 0);
        sim::set_current_core(0);
    }
}
