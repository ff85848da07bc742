//! # Trampoline Vector Tables
//!
//! The fixed, build-time half of the dispatch machinery: one table of
//! tiny dispatch stubs per core, in executable memory, at the geometry
//! the vector base register dictates - 2 KiB base alignment, one stub
//! every 32 bytes. Entered by hardware at `base + 32 * priority`, a stub
//! does exactly this:
//!
//! 1. `bisr` - establish the interrupt context for its priority,
//! 2. load the handler reference from its core's handler table slot
//!    (core and slot are burned in at generation time),
//! 3. `calli` - call it (a call, not a jump: control must return),
//! 4. `rslcx` / `rfe` - unwind the context and return from interrupt.
//!
//! The tables are never regenerated or relocated at runtime; all runtime
//! mutability lives one indirection away in the handler tables.
//!
//! Host builds carry geometry-faithful stand-in tables so base addresses,
//! alignment and slot arithmetic stay observable; [`dispatch`] mirrors a
//! stub's behavior in software for verification.

use static_assertions::const_assert;
use static_assertions::const_assert_eq;

use super::{handlers, MAX_VECTORS};
use crate::cpu::csfr;
use crate::family::NB_CORES;

// ============================================================================
// Geometry
// ============================================================================

/// Base alignment the vector base register requires.
pub const VECTOR_TABLE_ALIGN: usize = 2048;

/// Byte distance between consecutive stubs (BIV stride select = 32 bytes).
pub const VECTOR_STRIDE: usize = 32;

/// Total size of one core's trampoline table.
pub const VECTOR_TABLE_SIZE: usize = MAX_VECTORS * VECTOR_STRIDE;

const_assert!(VECTOR_TABLE_ALIGN.is_power_of_two());
const_assert_eq!(VECTOR_TABLE_SIZE, 1024);
// A table never crosses into the next alignment slot.
const_assert!(VECTOR_TABLE_SIZE <= VECTOR_TABLE_ALIGN);

/// Address of stub `slot` inside a table at `base`.
#[inline]
pub const fn slot_address(base: usize, slot: usize) -> usize {
    base + VECTOR_STRIDE * slot
}

// ============================================================================
// Table generation (target)
// ============================================================================

// Each table is emitted into its own executable section with the required
// alignment. A stub slot is 8 instructions padded to the 32-byte stride by
// the per-slot `.align`. The handler-table symbol of the matching core is
// addressed with the movh.a/lea pair since there is no single-instruction
// 32-bit absolute load.
#[cfg(target_arch = "tricore")]
macro_rules! vector_table {
    ($core:literal: $($prio:literal),+) => {
        core::arch::global_asm!(concat!(
            ".section .isr_vector_table.cpu", stringify!($core), ", \"ax\", @progbits\n",
            ".align 11\n",
            ".global ISR_VECTOR_TABLE_CPU", stringify!($core), "\n",
            "ISR_VECTOR_TABLE_CPU", stringify!($core), ":\n",
            $(
                ".align 5\n",
                "bisr ", stringify!($prio), "\n",
                "movh.a %a14, hi:(ISR_HANDLER_TABLE_CPU", stringify!($core),
                    " + 4*", stringify!($prio), ")\n",
                "lea %a14, [%a14]lo:(ISR_HANDLER_TABLE_CPU", stringify!($core),
                    " + 4*", stringify!($prio), ")\n",
                "ld.a %a14, [%a14]0\n",
                "calli %a14\n",
                "rslcx\n",
                "rfe\n",
            )+
        ));
    };
}

#[cfg(target_arch = "tricore")]
macro_rules! vector_tables {
    ($($core:literal),+) => {
        $(
            vector_table!($core:
                 0,  1,  2,  3,  4,  5,  6,  7,
                 8,  9, 10, 11, 12, 13, 14, 15,
                16, 17, 18, 19, 20, 21, 22, 23,
                24, 25, 26, 27, 28, 29, 30, 31);
        )+
    };
}

#[cfg(all(target_arch = "tricore", not(feature = "tc39x")))]
vector_tables!(0, 1, 2, 3);

#[cfg(all(target_arch = "tricore", feature = "tc39x"))]
vector_tables!(0, 1, 2, 3, 4, 5);

// ============================================================================
// Per-core base addresses
// ============================================================================

cfg_if::cfg_if! {
    if #[cfg(target_arch = "tricore")] {
        extern "C" {
            static ISR_VECTOR_TABLE_CPU0: u32;
            static ISR_VECTOR_TABLE_CPU1: u32;
            static ISR_VECTOR_TABLE_CPU2: u32;
            static ISR_VECTOR_TABLE_CPU3: u32;
            #[cfg(feature = "tc39x")]
            static ISR_VECTOR_TABLE_CPU4: u32;
            #[cfg(feature = "tc39x")]
            static ISR_VECTOR_TABLE_CPU5: u32;
        }

        fn table_bases() -> [usize; NB_CORES] {
            use core::ptr::addr_of;
            // SAFETY: only the link-time addresses are taken, the table
            // contents are never read as data.
            unsafe {
                [
                    addr_of!(ISR_VECTOR_TABLE_CPU0) as usize,
                    addr_of!(ISR_VECTOR_TABLE_CPU1) as usize,
                    addr_of!(ISR_VECTOR_TABLE_CPU2) as usize,
                    addr_of!(ISR_VECTOR_TABLE_CPU3) as usize,
                    #[cfg(feature = "tc39x")]
                    addr_of!(ISR_VECTOR_TABLE_CPU4) as usize,
                    #[cfg(feature = "tc39x")]
                    addr_of!(ISR_VECTOR_TABLE_CPU5) as usize,
                ]
            }
        }
    } else {
        /// Geometry stand-in for one core's trampoline table on the host.
        #[repr(C, align(2048))]
        struct HostVectorTable([u8; VECTOR_TABLE_SIZE]);

        impl HostVectorTable {
            const EMPTY: Self = Self([0; VECTOR_TABLE_SIZE]);
        }

        static HOST_TABLES: [HostVectorTable; NB_CORES] =
            [HostVectorTable::EMPTY; NB_CORES];

        fn table_bases() -> [usize; NB_CORES] {
            let mut bases = [0; NB_CORES];
            let mut core = 0;
            while core < NB_CORES {
                bases[core] = core::ptr::addr_of!(HOST_TABLES[core]) as usize;
                core += 1;
            }
            bases
        }
    }
}

/// Base address of `core`'s trampoline table; `None` for an unconfigured
/// core id.
pub fn table_base(core: usize) -> Option<usize> {
    table_bases().get(core).copied()
}

// ============================================================================
// Simulated dispatch
// ============================================================================

/// Enter a trampoline slot in software.
///
/// Performs exactly what the generated stub performs: interrupt-context
/// bookkeeping for the slot's priority, a load from the handler table,
/// a call, and the context unwind. Out-of-range indices do nothing, like
/// an interrupt that cannot be routed.
pub fn dispatch(core: usize, slot: usize) {
    if core >= NB_CORES || slot >= MAX_VECTORS {
        return;
    }

    let saved_icr = csfr::mfcr::<{ csfr::ICR }>();
    // SAFETY: ICR bookkeeping mirrors the hardware's bisr/rslcx pairing;
    // the previous value is restored below.
    unsafe {
        csfr::mtcr::<{ csfr::ICR }>((saved_icr & !csfr::ICR_CCPN_MASK) | slot as u32);
    }

    match handlers::bound_handler(core, slot) {
        Some(handler) => handler(),
        // A table that was never initialized behaves like an
        // unregistered slot.
        None => handlers::undefined_handler(),
    }

    unsafe {
        csfr::mtcr::<{ csfr::ICR }>(saved_icr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_bases_are_aligned_and_distinct() {
        for core in 0..NB_CORES {
            let base = table_base(core).unwrap();
            assert_eq!(base % VECTOR_TABLE_ALIGN, 0, "core {core} misaligned");
        }
        for a in 0..NB_CORES {
            for b in (a + 1)..NB_CORES {
                assert_ne!(table_base(a), table_base(b));
            }
        }
    }

    #[test]
    fn unconfigured_cores_have_no_table() {
        assert_eq!(table_base(NB_CORES), None);
        assert_eq!(table_base(usize::MAX), None);
    }

    #[test]
    fn slot_addresses_follow_the_stride() {
        let base = table_base(0).unwrap();
        assert_eq!(slot_address(base, 0), base);
        assert_eq!(slot_address(base, 1), base + 32);
        assert_eq!(slot_address(base, 31), base + 31 * 32);
        // The last stub still fits the table.
        assert!(slot_address(base, MAX_VECTORS - 1) + VECTOR_STRIDE <= base + VECTOR_TABLE_SIZE);
    }
}
