//! # Interrupt Dispatch
//!
//! Per-core interrupt vector dispatch: a fixed trampoline table in
//! executable memory per core (installed into the core's vector base
//! register), indirecting through a mutable RAM handler table so service
//! routines can be attached and swapped at runtime.
//!
//! ## Control flow
//!
//! ```text
//! interrupt ──▶ trampoline stub at base + 32·priority   (vectors)
//!                  │  load handler table [core][priority]  (handlers)
//!                  ▼
//!              registered ISR, or the undefined handler
//! ```
//!
//! ## Bring-up protocol
//!
//! Every core calls [`init_current_core`] once, after its minimal runtime
//! is ready and strictly before it enables interrupt taking; afterwards
//! subsystems attach their routines with [`register_handler`] as they
//! come online. The ordering is a program-order requirement - nothing in
//! here locks against a core that enables interrupts early.
//!
//! ## Submodules
//!
//! - `handlers`: per-core handler tables, registrar, undefined handler
//! - `vectors`: trampoline generation, geometry, simulated dispatch
//! - `src_router`: service request node routing (STM compare)

pub mod handlers;
pub mod src_router;
pub mod vectors;

pub use handlers::{is_default, undefined_handler, IsrHandler};
pub use src_router::route_stm_compare;
pub use vectors::{dispatch, VECTOR_STRIDE, VECTOR_TABLE_ALIGN, VECTOR_TABLE_SIZE};

use crate::cpu::{csfr, CoreId};
use crate::scu::wdt::EndinitGuard;

// ============================================================================
// Dimensions
// ============================================================================

/// Priority slots provided per core.
///
/// Sufficient for evaluation and small applications; the hardware allows
/// up to 255, and widening only means growing the tables and the stub
/// expansion.
pub const MAX_VECTORS: usize = 32;

// ============================================================================
// Vector base programming
// ============================================================================

/// Stub spacing encodings of the vector base register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum VectorSpacing {
    /// 32 bytes between entries; the spacing the generated tables use.
    Bytes32 = 0,
    /// 8 bytes between entries (densely packed tables).
    Bytes8 = 1,
}

/// Program the calling core's vector base register.
///
/// Bit 0 of the register selects the stub spacing, the remaining bits
/// carry the table base. The register sits behind the core's ENDINIT
/// lock; the write is followed by an instruction synchronization barrier
/// so the next interrupt entry fetches through the new base - no stale
/// table residency from pipelining.
pub fn set_vector_base(base: usize, spacing: VectorSpacing) {
    let biv = (base as u32 & !0x1) | spacing as u32;

    {
        let _window = EndinitGuard::open();
        // SAFETY: BIV is written inside the ENDINIT window it requires;
        // the caller hands us the base of a correctly generated table.
        unsafe {
            csfr::mtcr::<{ csfr::BIV }>(biv);
        }
    }
    csfr::isync();
}

// ============================================================================
// Dispatch initializer
// ============================================================================

/// Wire the calling core's trampoline table into its live dispatch state
/// and reset its handler table.
///
/// Operates on the core executing the call - the core id is queried, not
/// passed. Must run once per core before that core enables interrupt
/// taking; running it again fully resets the handler table (prior
/// registrations are overwritten, not merged).
pub fn init_current_core() {
    let core = CoreId::current();

    let Some(base) = vectors::table_base(core.index()) else {
        return; // nothing to do for an unconfigured core id
    };

    set_vector_base(base, VectorSpacing::Bytes32);
    handlers::init(core.index());

    log::debug!("isr: {core} dispatch initialized, {MAX_VECTORS} vectors");
}

/// Bind `handler` to priority slot `priority` of `core`'s handler table.
///
/// Effective from the next interrupt at that priority on that core; the
/// trampoline reads the slot on every entry, so no executable memory is
/// touched. Out-of-range arguments are silent no-ops.
#[inline]
pub fn register_handler(core: usize, handler: IsrHandler, priority: usize) {
    handlers::register(core, handler, priority);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::NB_CORES;
    use crate::sim;
    use core::sync::atomic::{AtomicUsize, Ordering};

    static TIMER_HITS: AtomicUsize = AtomicUsize::new(0);
    static OTHER_HITS: AtomicUsize = AtomicUsize::new(0);
    static PRIORITY_SEEN: AtomicUsize = AtomicUsize::new(usize::MAX);

    extern "C" fn timer_isr() {
        TIMER_HITS.fetch_add(1, Ordering::Relaxed);
        PRIORITY_SEEN.store(
            crate::cpu::current_interrupt_priority() as usize,
            Ordering::Relaxed,
        );
    }

    extern "C" fn other_isr() {
        OTHER_HITS.fetch_add(1, Ordering::Relaxed);
    }

    fn init_on(core: usize) {
        sim::set_current_core(core);
        init_current_core();
    }

    #[test]
    fn default_safety_after_init() {
        // Every slot of a freshly initialized core lands on the
        // undefined handler.
        let _guard = sim::lock();
        init_on(2);

        let traps_before = sim::debug_trap_count();
        for slot in 0..MAX_VECTORS {
            assert!(is_default(2, slot));
            dispatch(2, slot);
        }
        assert_eq!(sim::debug_trap_count() - traps_before, MAX_VECTORS);
        sim::set_current_core(0);
    }

    #[test]
    fn registration_takes_effect() {
        // A registered handler replaces the previous slot contents.
        let _guard = sim::lock();
        init_on(1);

        register_handler(1, timer_isr, 10);
        assert!(!is_default(1, 10));

        let traps_before = sim::debug_trap_count();
        let hits_before = TIMER_HITS.load(Ordering::Relaxed);
        dispatch(1, 10);
        assert_eq!(TIMER_HITS.load(Ordering::Relaxed), hits_before + 1);
        assert_eq!(sim::debug_trap_count(), traps_before);

        // Re-registration swaps the slot without touching the table
        // structure.
        register_handler(1, other_isr, 10);
        let others_before = OTHER_HITS.load(Ordering::Relaxed);
        dispatch(1, 10);
        assert_eq!(OTHER_HITS.load(Ordering::Relaxed), others_before + 1);
        assert_eq!(TIMER_HITS.load(Ordering::Relaxed), hits_before + 1);
        sim::set_current_core(0);
    }

    #[test]
    fn out_of_range_slot_changes_nothing() {
        // Slot >= MAX_VECTORS leaves every entry untouched.
        let _guard = sim::lock();
        init_on(1);
        register_handler(1, timer_isr, 5);

        register_handler(1, other_isr, MAX_VECTORS);
        register_handler(1, other_isr, 99);

        assert!(!is_default(1, 5));
        for slot in 0..MAX_VECTORS {
            if slot != 5 {
                assert!(is_default(1, slot));
            }
        }
        sim::set_current_core(0);
    }

    #[test]
    fn invalid_core_changes_nothing() {
        // Unconfigured core ids neither fault nor mutate state.
        let _guard = sim::lock();
        init_on(0);

        handlers::init(NB_CORES);
        handlers::init(usize::MAX);
        register_handler(NB_CORES, timer_isr, 0);
        register_handler(usize::MAX, timer_isr, 0);
        dispatch(NB_CORES, 0);

        for slot in 0..MAX_VECTORS {
            assert!(is_default(0, slot));
        }
        sim::set_current_core(0);
    }

    #[test]
    fn per_core_isolation() {
        // Registration on one core never leaks into another core's
        // table.
        let _guard = sim::lock();
        init_on(0);
        init_on(3);

        register_handler(3, timer_isr, 7);
        assert!(!is_default(3, 7));
        assert!(is_default(0, 7));
        sim::set_current_core(0);
    }

    #[test]
    fn init_is_a_full_reset() {
        // A second init overwrites prior registrations.
        let _guard = sim::lock();
        init_on(2);
        register_handler(2, timer_isr, 4);
        register_handler(2, other_isr, 19);

        init_on(2);
        for slot in 0..MAX_VECTORS {
            assert!(is_default(2, slot));
        }
        sim::set_current_core(0);
    }

    #[test]
    fn vector_base_programming() {
        let _guard = sim::lock();
        let isyncs_before = sim::isync_count();
        init_on(1);

        let biv = sim::csfr_read(1, csfr::BIV);
        let base = vectors::table_base(1).unwrap() as u32;
        assert_eq!(biv & !0x1, base);
        assert_eq!(biv & 0x1, VectorSpacing::Bytes32 as u32);
        assert!(sim::isync_count() > isyncs_before);

        // The ENDINIT window is closed again afterwards.
        let scu = crate::scu::regs();
        assert_ne!(
            scu.wdtcpu[1].con0.read() & crate::scu::wdt::CON0_ENDINIT,
            0
        );
        sim::set_current_core(0);
    }

    #[test]
    fn dispatch_establishes_priority_context() {
        let _guard = sim::lock();
        init_on(0);
        register_handler(0, timer_isr, 12);

        PRIORITY_SEEN.store(usize::MAX, Ordering::Relaxed);
        dispatch(0, 12);
        assert_eq!(PRIORITY_SEEN.load(Ordering::Relaxed), 12);
        // Context is unwound on return.
        assert_eq!(crate::cpu::current_interrupt_priority(), 0);
    }

    #[test]
    fn four_core_scenario() {
        // The end-to-end scenario: MAX_VECTORS = 32, four cores.
        let _guard = sim::lock();
        for core in 0..NB_CORES {
            init_on(core);
        }
        sim::set_current_core(2);

        register_handler(2, timer_isr, 10);
        register_handler(2, other_isr, 99); // 99 >= 32: no change anywhere

        let hits_before = TIMER_HITS.load(Ordering::Relaxed);
        let traps_before = sim::debug_trap_count();

        dispatch(2, 10);
        assert_eq!(TIMER_HITS.load(Ordering::Relaxed), hits_before + 1);

        dispatch(2, 11);
        assert_eq!(sim::debug_trap_count(), traps_before + 1);

        for slot in 0..MAX_VECTORS {
            if slot != 10 {
                assert!(is_default(2, slot));
            }
            assert!(is_default(0, slot));
            assert!(is_default(1, slot));
            assert!(is_default(3, slot));
        }
        sim::set_current_core(0);
    }
}
