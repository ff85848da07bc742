//! # System Timer
//!
//! One free-running STM instance per core, used as the time base for that
//! core's periodic work. The compare channel protocol is drift-free: a
//! reload adds the period to the *previous compare target*, not to the
//! current counter value, so ISR jitter never accumulates into the
//! period.

use crate::family::NB_CORES;
use crate::mmio::Reg;

// ============================================================================
// Register block
// ============================================================================

/// One STM instance.
#[repr(C)]
pub struct StmRegs {
    /// Free-running counter, low word.
    pub tim0: Reg,
    /// Compare values.
    pub cmp: [Reg; 2],
    /// Compare window control.
    pub cmcon: Reg,
    /// Interrupt control (enable + status).
    pub icr: Reg,
    /// Interrupt set/clear requests.
    pub iscr: Reg,
}

impl StmRegs {
    pub(crate) const RESET: Self = Self {
        tim0: Reg::new(0),
        cmp: [Reg::new(0), Reg::new(0)],
        cmcon: Reg::new(0),
        icr: Reg::new(0),
        iscr: Reg::new(0),
    };
}

/// CMCON.MSIZE0 - compare window size minus one for channel 0.
pub const CMCON_MSIZE0_MASK: u32 = 0x0000_001F;
/// CMCON.MSIZE0 shift.
pub const CMCON_MSIZE0_SHIFT: u32 = 0;

/// ICR.CMP0EN - channel 0 compare interrupt enable.
pub const ICR_CMP0EN: u32 = 1 << 0;
/// ICR.CMP0IR - channel 0 compare interrupt pending.
pub const ICR_CMP0IR: u32 = 1 << 1;

/// ISCR.CMP0IRR - reset channel 0 compare interrupt flag.
pub const ISCR_CMP0IRR: u32 = 1 << 0;

/// The STM instance serving `channel` (one per core).
#[inline]
pub fn channel(n: usize) -> Option<&'static StmRegs> {
    if n >= NB_CORES {
        return None;
    }
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "tricore")] {
            use crate::family::spec;
            // SAFETY: fixed instance addresses from the family memory map.
            Some(unsafe {
                &*(crate::mmio::instance_base(spec::STM0_BASE, spec::STM_STRIDE, n)
                    as *const StmRegs)
            })
        } else {
            Some(&crate::sim::STM[n])
        }
    }
}

// ============================================================================
// Compare channel operations
// ============================================================================

/// Advance channel 0's compare target by `ticks`.
///
/// Adds on top of the previous target so the period stays phase-locked;
/// for the very first arm after reset, add the current counter value
/// (see [`count`]) to the period.
pub fn reload_channel(n: usize, ticks: u32) {
    if let Some(stm) = channel(n) {
        stm.cmp[0].modify(|v| v.wrapping_add(ticks));
    }
}

/// Enable the channel 0 compare interrupt: full-width compare window,
/// pending flag cleared, interrupt enabled.
pub fn enable_compare_interrupt(n: usize) {
    if let Some(stm) = channel(n) {
        stm.cmcon
            .masked_write(31 << CMCON_MSIZE0_SHIFT, CMCON_MSIZE0_MASK);
        stm.iscr.write(ISCR_CMP0IRR);
        stm.icr.set_bits(ICR_CMP0EN);
    }
}

/// Clear the channel 0 compare interrupt flag.
pub fn clear_compare_flag(n: usize) {
    if let Some(stm) = channel(n) {
        stm.iscr.write(ISCR_CMP0IRR);
    }
}

/// Whether the channel 0 compare interrupt is pending.
pub fn compare_flag(n: usize) -> bool {
    channel(n).is_some_and(|stm| stm.icr.is_set(ICR_CMP0IR))
}

/// Current counter value of channel `n`.
pub fn count(n: usize) -> u32 {
    channel(n).map_or(0, |stm| stm.tim0.read())
}

/// Busy-wait for `us` microseconds on the calling core's channel.
///
/// `stm_src_mhz` is the frequency feeding the STM divider; the effective
/// tick rate honors the divider currently programmed in CCUCON0.
pub fn busy_wait_us(stm_src_mhz: u32, us: u32) {
    use crate::scu::ccu;

    let core = crate::cpu::CoreId::current().index();
    let start = count(core);
    let div = crate::scu::regs()
        .ccucon0
        .field(ccu::CCUCON0_STMDIV_MASK, ccu::CCUCON0_STMDIV_SHIFT)
        .max(1);
    let ticks = us * stm_src_mhz / div;

    while count(core).wrapping_sub(start) < ticks {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn reload_is_drift_free() {
        let _guard = sim::lock();
        let stm = channel(1).unwrap();
        stm.cmp[0].write(0);

        reload_channel(1, 250);
        reload_channel(1, 250);
        // Second target builds on the first, not on the counter.
        assert_eq!(stm.cmp[0].read(), 500);
        stm.cmp[0].write(0);
    }

    #[test]
    fn reload_wraps_with_the_counter() {
        let _guard = sim::lock();
        let stm = channel(0).unwrap();
        stm.cmp[0].write(u32::MAX - 10);
        reload_channel(0, 20);
        assert_eq!(stm.cmp[0].read(), 9);
        stm.cmp[0].write(0);
    }

    #[test]
    fn enable_arms_the_channel() {
        let _guard = sim::lock();
        let stm = channel(2).unwrap();
        stm.cmcon.write(0);
        stm.icr.write(0);

        enable_compare_interrupt(2);
        assert_eq!(stm.cmcon.field(CMCON_MSIZE0_MASK, CMCON_MSIZE0_SHIFT), 31);
        assert!(stm.icr.is_set(ICR_CMP0EN));
        assert!(stm.iscr.is_set(ISCR_CMP0IRR));

        stm.cmcon.write(0);
        stm.icr.write(0);
        stm.iscr.write(0);
    }

    #[test]
    fn out_of_range_channels_do_nothing() {
        let _guard = sim::lock();
        assert!(channel(NB_CORES).is_none());
        reload_channel(NB_CORES, 100);
        assert!(!compare_flag(NB_CORES));
        assert_eq!(count(NB_CORES), 0);
    }
}
