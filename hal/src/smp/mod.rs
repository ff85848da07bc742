//! # Secondary-Core Release
//!
//! After reset only the reset core runs; the others sit in boot halt.
//! The reset core releases them by programming each halted core's program
//! counter and clearing its halt bit, after which every released core
//! independently runs the shared startup path (watchdog, caches, its own
//! dispatch initialization) - there is no further synchronization in this
//! layer.

use crate::cpu::CoreId;
use crate::family::{self, NB_CORES};
use crate::mmio::Reg;

// ============================================================================
// Per-core register block
// ============================================================================

/// Slave interface of one core: the registers another core may use to
/// steer it.
#[repr(C)]
pub struct CpuSfrRegs {
    /// Program counter the core starts from when released.
    pub pc: Reg,
    /// System configuration; carries the boot-halt bit.
    pub syscon: Reg,
}

impl CpuSfrRegs {
    /// Reset state: core halted (host register model).
    pub const RESET_HALTED: Self = Self {
        pc: Reg::new(0),
        syscon: Reg::new(SYSCON_BHALT),
    };
}

/// SYSCON.BHALT - the core is held in boot halt while set.
pub const SYSCON_BHALT: u32 = 1 << 24;

/// Physical register-block index of a logical core.
///
/// The sixth core's block sits at the seventh slot (physical id 6).
#[inline]
pub const fn physical_core_index(logical: usize) -> usize {
    if logical == 5 {
        6
    } else {
        logical
    }
}

/// The slave-interface block of a logical core.
fn core_regs(core: usize) -> Option<&'static CpuSfrRegs> {
    if core >= NB_CORES {
        return None;
    }
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "tricore")] {
            use crate::family::spec;
            // SAFETY: fixed per-core addresses from the family memory map.
            Some(unsafe {
                &*(crate::mmio::instance_base(
                    spec::CPU0_SFR_BASE,
                    spec::CPU_SFR_STRIDE,
                    physical_core_index(core),
                ) as *const CpuSfrRegs)
            })
        } else {
            Some(&crate::sim::CPU[core])
        }
    }
}

// ============================================================================
// Core release
// ============================================================================

/// Release `core` from boot halt at `entry`.
///
/// No-ops: the calling core itself, an unconfigured core id, and a core
/// that is already running. The released core starts executing at
/// `entry` with whatever state the shared startup code establishes.
pub fn start_core(core: usize, entry: extern "C" fn() -> !) {
    if core == CoreId::current().index() {
        return; // never re-steer the core we are running on
    }

    let Some(regs) = core_regs(core) else {
        return;
    };

    if !regs.syscon.is_set(SYSCON_BHALT) {
        return; // already active
    }

    regs.pc.write(entry as usize as u32);
    regs.syscon.clear_bits(SYSCON_BHALT);

    log::debug!("smp: released core{core}");
}

/// Release every halted core at the shared `entry`.
///
/// Called once by the reset core; active cores (including the caller) are
/// left untouched.
pub fn start_all_cores(entry: extern "C" fn() -> !) {
    for core in 0..NB_CORES {
        start_core(core, entry);
    }
}

/// Whether the reset core is the caller.
#[inline]
pub fn on_reset_core() -> bool {
    CoreId::current().index() == family::RESET_CORE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    extern "C" fn entry() -> ! {
        unreachable!("never executed by the host model")
    }

    fn halt_all() {
        for core in 0..NB_CORES {
            let regs = core_regs(core).unwrap();
            regs.pc.write(0);
            regs.syscon.write(SYSCON_BHALT);
        }
    }

    #[test]
    fn physical_index_folds_the_sixth_core() {
        assert_eq!(physical_core_index(0), 0);
        assert_eq!(physical_core_index(4), 4);
        assert_eq!(physical_core_index(5), 6);
    }

    #[test]
    fn release_programs_pc_and_clears_halt() {
        let _guard = sim::lock();
        sim::set_current_core(0);
        halt_all();

        start_core(1, entry);
        let regs = core_regs(1).unwrap();
        assert_eq!(regs.pc.read(), entry as usize as u32);
        assert!(!regs.syscon.is_set(SYSCON_BHALT));
        halt_all();
    }

    #[test]
    fn the_calling_core_is_never_restarted() {
        let _guard = sim::lock();
        sim::set_current_core(0);
        halt_all();

        start_core(0, entry);
        let regs = core_regs(0).unwrap();
        assert_eq!(regs.pc.read(), 0);
        assert!(regs.syscon.is_set(SYSCON_BHALT));
        halt_all();
    }

    #[test]
    fn running_cores_are_left_untouched() {
        let _guard = sim::lock();
        sim::set_current_core(0);
        halt_all();

        let regs = core_regs(2).unwrap();
        regs.syscon.write(0); // already running
        regs.pc.write(0xAAAA_AAAA);

        start_core(2, entry);
        assert_eq!(regs.pc.read(), 0xAAAA_AAAA);
        halt_all();
    }

    #[test]
    fn start_all_releases_everyone_but_the_caller() {
        let _guard = sim::lock();
        sim::set_current_core(0);
        halt_all();

        start_all_cores(entry);
        for core in 0..NB_CORES {
            let regs = core_regs(core).unwrap();
            if core == 0 {
                assert!(regs.syscon.is_set(SYSCON_BHALT));
            } else {
                assert!(!regs.syscon.is_set(SYSCON_BHALT));
                assert_eq!(regs.pc.read(), entry as usize as u32);
            }
        }
        halt_all();
    }

    #[test]
    fn out_of_range_cores_are_no_ops() {
        let _guard = sim::lock();
        start_core(NB_CORES, entry);
        start_core(usize::MAX, entry);
    }
}
