//! # Flash Wait States
//!
//! Flash access times are fixed in nanoseconds; the number of wait states
//! the flash controller must insert therefore scales with the system
//! clock. This module carries the pure ns→cycles arithmetic and the
//! (ENDINIT-protected) controller programming.

use crate::family::spec;
use crate::mmio::Reg;
use crate::scu::wdt::EndinitGuard;

// ============================================================================
// Register block
// ============================================================================

/// Flash controller host interface.
#[repr(C)]
pub struct DmuRegs {
    /// Program flash wait states.
    pub pwait: Reg,
    /// Data flash wait states.
    pub dwait: Reg,
}

impl DmuRegs {
    /// Reset-state block (host register model).
    pub const fn reset() -> Self {
        Self {
            pwait: Reg::new(0),
            dwait: Reg::new(0),
        }
    }
}

/// xWAIT.RFLASH - wait states for the array access.
pub const WAIT_RFLASH_MASK: u32 = 0x0000_003F;
/// xWAIT.RFLASH shift.
pub const WAIT_RFLASH_SHIFT: u32 = 0;

/// xWAIT.RECC - wait states for the error correction stage.
pub const WAIT_RECC_MASK: u32 = 0x0000_3F00;
/// xWAIT.RECC shift.
pub const WAIT_RECC_SHIFT: u32 = 8;

/// Access the flash controller block.
#[inline]
pub fn regs() -> &'static DmuRegs {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "tricore")] {
            // SAFETY: fixed module base from the family memory map.
            unsafe { &*(spec::DMU_BASE as *const DmuRegs) }
        } else {
            &crate::sim::DMU
        }
    }
}

// ============================================================================
// Wait state arithmetic
// ============================================================================

/// Wait states needed to cover `access_ns` at `clock_mhz`.
///
/// Rounds up: a partial cycle still stalls the access for a full one.
pub const fn waitstates(access_ns: u32, clock_mhz: u32) -> u32 {
    (access_ns * clock_mhz).div_ceil(1_000)
}

// ============================================================================
// Controller programming
// ============================================================================

/// Program the program-flash wait states.
pub fn set_pflash_waitstates(ws_access: u32, ws_ecc: u32) {
    let _window = EndinitGuard::open();
    regs().pwait.write(
        ((ws_access << WAIT_RFLASH_SHIFT) & WAIT_RFLASH_MASK)
            | ((ws_ecc << WAIT_RECC_SHIFT) & WAIT_RECC_MASK),
    );
}

/// Program the data-flash wait states.
pub fn set_dflash_waitstates(ws_access: u32, ws_ecc: u32) {
    let _window = EndinitGuard::open();
    regs().dwait.write(
        ((ws_access << WAIT_RFLASH_SHIFT) & WAIT_RFLASH_MASK)
            | ((ws_ecc << WAIT_RECC_SHIFT) & WAIT_RECC_MASK),
    );
}

/// Program both flashes for the given system clock from the family's
/// datasheet timing.
pub fn configure_for_clock(clock_mhz: u32) {
    set_pflash_waitstates(
        waitstates(spec::PFLASH_ACCESS_NS, clock_mhz),
        waitstates(spec::PFLASH_ECC_NS, clock_mhz),
    );
    set_dflash_waitstates(
        waitstates(spec::DFLASH_ACCESS_NS, clock_mhz),
        waitstates(spec::DFLASH_ECC_NS, clock_mhz),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn waitstate_arithmetic_rounds_up() {
        // 30 ns at 300 MHz = 9 cycles exactly.
        assert_eq!(waitstates(30, 300), 9);
        // 10 ns at 300 MHz = 3 cycles exactly.
        assert_eq!(waitstates(10, 300), 3);
        // 30 ns at 100 MHz = 3 cycles exactly.
        assert_eq!(waitstates(30, 100), 3);
        // 100 ns at 133 MHz = 13.3 -> 14 cycles.
        assert_eq!(waitstates(100, 133), 14);
    }

    #[test]
    fn controller_programming_packs_both_fields() {
        let _guard = sim::lock();
        sim::set_current_core(0);
        let dmu = regs();

        configure_for_clock(300);
        assert_eq!(dmu.pwait.field(WAIT_RFLASH_MASK, WAIT_RFLASH_SHIFT), 9);
        assert_eq!(dmu.pwait.field(WAIT_RECC_MASK, WAIT_RECC_SHIFT), 3);
        assert_eq!(dmu.dwait.field(WAIT_RFLASH_MASK, WAIT_RFLASH_SHIFT), 30);
        assert_eq!(dmu.dwait.field(WAIT_RECC_MASK, WAIT_RECC_SHIFT), 6);

        dmu.pwait.write(0);
        dmu.dwait.write(0);
    }
}
