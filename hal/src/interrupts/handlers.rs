//! # Per-Core Handler Tables
//!
//! The mutable half of the dispatch machinery: one RAM-resident table of
//! handler references per core, indexed by priority slot. The trampoline
//! stubs (see [`super::vectors`]) read these tables on every interrupt
//! entry, so a slot can be re-bound at any time after initialization
//! without touching executable memory.
//!
//! ## Access discipline
//!
//! Slots are stored with natural-word atomicity: a dispatch racing a
//! registration observes either the old or the new handler, never a torn
//! pointer. The owning core's interrupt path is the only reader; writers
//! may be any core during setup, by the convention that registration for
//! core X is only performed by code installing a handler that will run
//! on X. No lock is involved.
//!
//! Out-of-range slot or core indices make registration a silent no-op -
//! a deliberate contract, not an oversight: such calls are programming
//! mistakes caught by review and tests, and the dispatch core carries no
//! diagnostic channel at all.

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use super::MAX_VECTORS;
use crate::cpu::csfr;
use crate::family::NB_CORES;

// ============================================================================
// Handler type
// ============================================================================

/// An interrupt service routine: no arguments, no return value.
pub type IsrHandler = extern "C" fn();

// ============================================================================
// Tables
// ============================================================================

/// One core's priority-indexed handler table.
///
/// `repr(C)` because the trampoline stubs address slots by fixed offset
/// from the table symbol.
#[repr(C, align(4))]
pub struct HandlerTable {
    slots: [AtomicPtr<()>; MAX_VECTORS],
}

impl HandlerTable {
    const EMPTY_SLOT: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());

    const fn new() -> Self {
        Self {
            slots: [Self::EMPTY_SLOT; MAX_VECTORS],
        }
    }
}

macro_rules! handler_tables {
    ($($core:literal),+) => {
        paste::paste! {
            $(
                // Referenced by name from the generated trampoline stubs.
                #[no_mangle]
                static [<ISR_HANDLER_TABLE_CPU $core>]: HandlerTable = HandlerTable::new();
            )+

            /// Per-core table lookup, indexed by logical core id.
            static TABLES: [&HandlerTable; NB_CORES] =
                [$( &[<ISR_HANDLER_TABLE_CPU $core>] ),+];
        }
    };
}

#[cfg(not(feature = "tc39x"))]
handler_tables!(0, 1, 2, 3);

#[cfg(feature = "tc39x")]
handler_tables!(0, 1, 2, 3, 4, 5);

// ============================================================================
// Registrar
// ============================================================================

/// Bind `handler` into priority slot `priority` of `core`'s table.
///
/// Takes effect the next time the trampoline reads the slot. Out-of-range
/// `core` or `priority` is a silent no-op.
pub fn register(core: usize, handler: IsrHandler, priority: usize) {
    let Some(table) = TABLES.get(core) else {
        return; // nothing to do for an unconfigured core
    };

    if priority < MAX_VECTORS {
        table.slots[priority].store(handler as *const () as *mut (), Ordering::Relaxed);
    }
}

/// Reset every slot of `core`'s table to the undefined handler.
///
/// Called by the dispatch initializer before the core enables interrupt
/// taking. Calling it again is a full reset: prior registrations are
/// overwritten. Out-of-range `core` is a silent no-op.
pub fn init(core: usize) {
    if core >= NB_CORES {
        return;
    }
    for priority in 0..MAX_VECTORS {
        register(core, undefined_handler, priority);
    }
}

/// The handler currently bound to a slot; `None` for an out-of-range
/// index or a table that was never initialized.
pub(crate) fn bound_handler(core: usize, slot: usize) -> Option<IsrHandler> {
    let table = TABLES.get(core)?;
    let raw = table.slots.get(slot)?.load(Ordering::Relaxed);
    if raw.is_null() {
        None
    } else {
        // SAFETY: non-null slot values only ever come from `register`,
        // which stores valid `IsrHandler` references.
        Some(unsafe { core::mem::transmute::<*mut (), IsrHandler>(raw) })
    }
}

/// Whether a slot still holds the undefined handler.
///
/// Diagnostic hook: lets tooling verify that a priority it is about to
/// route in the service request controller actually has a handler.
pub fn is_default(core: usize, slot: usize) -> bool {
    match bound_handler(core, slot) {
        Some(handler) => handler as usize == undefined_handler as usize,
        None => false,
    }
}

// ============================================================================
// Undefined handler
// ============================================================================

/// Landing point for any interrupt whose slot was never registered.
///
/// An unregistered priority firing means the service request controller
/// routes a priority nobody installed a handler for - a wiring bug.
/// Continuing would act on uninitialized application state, so the
/// failure is loud and final: trap into an attached debugger, otherwise
/// spin until the watchdog resets the part. There is no recovery path.
///
/// On host builds the trap is recorded by the register model and the
/// handler returns, so tests can observe the halt.
pub extern "C" fn undefined_handler() {
    csfr::debug_trap();

    #[cfg(target_arch = "tricore")]
    loop {
        core::hint::spin_loop();
    }
}
