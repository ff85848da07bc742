//! # Core Services
//!
//! Core identification, interrupt state, and cache control for the calling
//! core.
//!
//! ## Core identifiers
//!
//! Cores carry a logical index `0..NB_CORES`. The hardware reports a
//! *physical* id that matches the logical index except on the six-core
//! derivative, where the sixth core reports 6; [`CoreId::current`] folds
//! that quirk so the rest of the layer only ever sees the linear index.
//! The id is always obtained from the hardware query and never cached -
//! cores are pinned, but the query is the single authority.

pub mod csfr;

use crate::family::{self, NB_CORES};
use crate::scu::wdt::EndinitGuard;

// ============================================================================
// Core identity
// ============================================================================

/// Logical index of a core, guaranteed in `0..NB_CORES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct CoreId(u8);

impl CoreId {
    /// Wrap a logical index, `None` when the derivative has no such core.
    #[inline]
    pub const fn new(index: usize) -> Option<Self> {
        if index < NB_CORES {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Identify the calling core.
    #[inline]
    pub fn current() -> Self {
        let mut physical = csfr::mfcr::<{ csfr::CORE_ID }>() & 0x7;

        // The sixth TriCore slot reports physical id 6, not 5.
        if physical == family::SIXTH_CORE_PHYSICAL_ID {
            physical -= 1;
        }

        Self(physical as u8)
    }

    /// The linear index, usable for table lookups.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the core that leaves reset running.
    #[inline]
    pub const fn is_reset_core(self) -> bool {
        self.0 as usize == family::RESET_CORE
    }
}

impl core::fmt::Display for CoreId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "core{}", self.0)
    }
}

// ============================================================================
// Interrupt state
// ============================================================================

/// Priority number of the interrupt currently executing on this core
/// (ICR.CCPN); 0 outside interrupt context.
#[inline]
pub fn current_interrupt_priority() -> u32 {
    csfr::mfcr::<{ csfr::ICR }>() & csfr::ICR_CCPN_MASK
}

/// Enable interrupt taking on the calling core.
///
/// The core's dispatch state must be initialized first (see
/// [`crate::interrupts::init_current_core`]); this ordering is a program
/// order requirement, nothing enforces it at runtime.
#[inline]
pub fn enable_interrupts() {
    csfr::enable_interrupts();
}

/// Disable interrupt taking on the calling core.
#[inline]
pub fn disable_interrupts() {
    csfr::disable_interrupts();
}

// ============================================================================
// Caches
// ============================================================================

/// Enable the instruction cache on the calling core.
///
/// Invalidates any stale contents, then clears the bypass bit under the
/// ENDINIT window and synchronizes the pipeline.
pub fn enable_icache() {
    // SAFETY: PCON1 invalidation has no preconditions; PCON0 is written
    // inside the ENDINIT window it requires.
    unsafe {
        csfr::mtcr::<{ csfr::PCON1 }>(csfr::PCON1_INVALIDATE);

        let _endinit = EndinitGuard::open();
        csfr::mtcr::<{ csfr::PCON0 }>(0);
    }
    csfr::isync();
}

/// Enable the data cache on the calling core.
pub fn enable_dcache() {
    // SAFETY: DCON0 is written inside the ENDINIT window it requires.
    unsafe {
        let _endinit = EndinitGuard::open();
        csfr::mtcr::<{ csfr::DCON0 }>(0);
    }
    csfr::isync();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn core_id_bounds() {
        assert!(CoreId::new(0).is_some());
        assert!(CoreId::new(NB_CORES - 1).is_some());
        assert!(CoreId::new(NB_CORES).is_none());
        assert!(CoreId::new(99).is_none());
    }

    #[test]
    fn current_follows_the_hardware_query() {
        let _guard = sim::lock();
        sim::set_current_core(1);
        assert_eq!(CoreId::current().index(), 1);
        sim::set_current_core(0);
        assert_eq!(CoreId::current().index(), 0);
    }

    #[test]
    fn interrupt_enable_is_per_core_state() {
        let _guard = sim::lock();
        sim::set_current_core(2);
        enable_interrupts();
        assert!(sim::csfr_read(2, csfr::ICR) & csfr::ICR_IE != 0);
        disable_interrupts();
        assert!(sim::csfr_read(2, csfr::ICR) & csfr::ICR_IE == 0);
        sim::set_current_core(0);
    }
}
