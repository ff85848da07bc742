//! # Family Specification
//!
//! Build-time description of the selected TC3xx derivative: core count,
//! nominal clock targets, flash timing, and the peripheral memory map.
//!
//! The values mirror the derivative datasheet; everything the rest of the
//! layer needs to know about the silicon is routed through this module so
//! drivers stay derivative-agnostic.

pub mod tc38x;
pub mod tc39x;

cfg_if::cfg_if! {
    if #[cfg(feature = "tc39x")] {
        pub use tc39x as spec;
    } else {
        pub use tc38x as spec;
    }
}

pub use spec::{NB_CORES, RESET_CORE};

use static_assertions::const_assert;

// ============================================================================
// Family-wide limits
// ============================================================================

/// Largest core count in the family (TC39x).
pub const MAX_CORES: usize = 6;

/// Physical core-id reported by the sixth core.
///
/// The family numbers the seventh TriCore slot 6; the logical index is 5.
pub const SIXTH_CORE_PHYSICAL_ID: u32 = 6;

const_assert!(NB_CORES >= 1);
const_assert!(NB_CORES <= MAX_CORES);
const_assert!(RESET_CORE < NB_CORES);

// ============================================================================
// Derived timing helpers
// ============================================================================

/// STM ticks per microsecond at the nominal STM clock.
pub const TICKS_PER_US: u32 = spec::STM_CLOCK_MHZ;

/// STM ticks per millisecond at the nominal STM clock.
pub const TICKS_PER_MS: u32 = TICKS_PER_US * 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_count_within_family_limits() {
        assert!(NB_CORES <= MAX_CORES);
        assert!(RESET_CORE < NB_CORES);
    }

    #[test]
    fn tick_helpers_follow_stm_clock() {
        assert_eq!(TICKS_PER_MS, spec::STM_CLOCK_MHZ * 1_000);
    }
}
