//! # Host Register Model
//!
//! RAM-resident stand-ins for the hardware this layer programs, compiled
//! on every non-TriCore build. Peripheral drivers receive references to
//! these blocks through their `regs()`/instance accessors, and the CSFR
//! seam in [`crate::cpu::csfr`] reads and writes the per-core banks here,
//! so initialization sequences, table programming and dispatch logic run
//! unmodified under ordinary unit tests.
//!
//! The model is deliberately passive: writes are stored, reads return
//! the stored value, and nothing ticks or flips status bits on its own.
//! Tests pre-arrange the status bits a sequence waits for (see
//! [`force_stable_clock_sources`]).
//!
//! State is process-global, exactly like the hardware it stands in for;
//! tests that touch it serialize through [`lock`].

use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use spin::{Mutex, MutexGuard};

use crate::cpu::csfr;
use crate::family::{spec, NB_CORES, SIXTH_CORE_PHYSICAL_ID};
use crate::flash::DmuRegs;
use crate::interrupts::src_router::SrcRegs;
use crate::port::PortRegs;
use crate::qspi::{self, QspiRegs};
use crate::scu::pll;
use crate::scu::ScuRegs;
use crate::smp::CpuSfrRegs;
use crate::stm::StmRegs;

// ============================================================================
// Peripheral blocks
// ============================================================================

/// System control unit.
pub static SCU: ScuRegs = ScuRegs::reset();

/// Service request controller (STM section).
pub static SRC: SrcRegs = SrcRegs::reset();

/// Flash controller.
pub static DMU: DmuRegs = DmuRegs::reset();

/// Per-core system timers.
pub static STM: [StmRegs; NB_CORES] = [StmRegs::RESET; NB_CORES];

/// Ports.
pub static PORTS: [PortRegs; spec::NB_PORTS] = [PortRegs::RESET; spec::NB_PORTS];

/// QSPI instances.
pub static QSPI: [QspiRegs; qspi::NB_MODULES] = [QspiRegs::RESET; qspi::NB_MODULES];

/// Per-core slave interfaces; everything halted, as after a warm reset.
pub static CPU: [CpuSfrRegs; NB_CORES] = [CpuSfrRegs::RESET_HALTED; NB_CORES];

// ============================================================================
// Core special-function register banks
// ============================================================================

const ZERO: AtomicU32 = AtomicU32::new(0);

static BIV: [AtomicU32; NB_CORES] = [ZERO; NB_CORES];
static ICR: [AtomicU32; NB_CORES] = [ZERO; NB_CORES];
static PCON0: [AtomicU32; NB_CORES] = [ZERO; NB_CORES];
static PCON1: [AtomicU32; NB_CORES] = [ZERO; NB_CORES];
static DCON0: [AtomicU32; NB_CORES] = [ZERO; NB_CORES];

/// Read a CSFR of `core`.
pub fn csfr_read(core: usize, addr: u16) -> u32 {
    match addr {
        csfr::CORE_ID => {
            // The hardware reports the physical id; the sixth core's is 6.
            if core == SIXTH_CORE_PHYSICAL_ID as usize - 1 {
                SIXTH_CORE_PHYSICAL_ID
            } else {
                core as u32
            }
        }
        csfr::BIV => BIV[core].load(Ordering::Relaxed),
        csfr::ICR => ICR[core].load(Ordering::Relaxed),
        csfr::PCON0 => PCON0[core].load(Ordering::Relaxed),
        csfr::PCON1 => PCON1[core].load(Ordering::Relaxed),
        csfr::DCON0 => DCON0[core].load(Ordering::Relaxed),
        _ => 0,
    }
}

/// Write a CSFR of `core`; read-only registers ignore the write.
pub fn csfr_write(core: usize, addr: u16, value: u32) {
    match addr {
        csfr::BIV => BIV[core].store(value, Ordering::Relaxed),
        csfr::ICR => ICR[core].store(value, Ordering::Relaxed),
        csfr::PCON0 => PCON0[core].store(value, Ordering::Relaxed),
        csfr::PCON1 => PCON1[core].store(value, Ordering::Relaxed),
        csfr::DCON0 => DCON0[core].store(value, Ordering::Relaxed),
        _ => {}
    }
}

// ============================================================================
// Execution context
// ============================================================================

static CURRENT_CORE: AtomicUsize = AtomicUsize::new(0);
static DEBUG_TRAPS: AtomicUsize = AtomicUsize::new(0);
static ISYNCS: AtomicUsize = AtomicUsize::new(0);

/// The core the model pretends to be executing on.
#[inline]
pub fn current_core() -> usize {
    CURRENT_CORE.load(Ordering::Relaxed)
}

/// Select the core the model pretends to be executing on.
pub fn set_current_core(core: usize) {
    assert!(core < NB_CORES, "no such core on this derivative");
    CURRENT_CORE.store(core, Ordering::Relaxed);
}

/// Record a `debug` trap (undefined handler hit).
pub fn record_debug_trap() {
    DEBUG_TRAPS.fetch_add(1, Ordering::Relaxed);
}

/// Number of `debug` traps recorded so far.
pub fn debug_trap_count() -> usize {
    DEBUG_TRAPS.load(Ordering::Relaxed)
}

/// Record an instruction synchronization barrier.
pub fn record_isync() {
    ISYNCS.fetch_add(1, Ordering::Relaxed);
}

/// Number of barriers recorded so far.
pub fn isync_count() -> usize {
    ISYNCS.load(Ordering::Relaxed)
}

// ============================================================================
// Test support
// ============================================================================

static TEST_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that touch the global model state.
pub fn lock() -> MutexGuard<'static, ()> {
    TEST_LOCK.lock()
}

/// Pre-arrange a stable oscillator and locked PLLs, so clock switching
/// sequences take their select-only path.
pub fn force_stable_clock_sources() {
    SCU.osccon.set_bits(pll::OSCCON_PLLLV | pll::OSCCON_PLLHV);
    SCU.syspllstat.set_bits(pll::PLLSTAT_LOCK);
    SCU.perpllstat.set_bits(pll::PLLSTAT_LOCK);
}

/// Undo [`force_stable_clock_sources`].
pub fn clear_clock_sources() {
    SCU.osccon.clear_bits(pll::OSCCON_PLLLV | pll::OSCCON_PLLHV);
    SCU.syspllstat.clear_bits(pll::PLLSTAT_LOCK);
    SCU.perpllstat.clear_bits(pll::PLLSTAT_LOCK);
}
