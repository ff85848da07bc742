//! # Service Request Routing
//!
//! The service request controller decides which core services a
//! peripheral interrupt and at which priority. This module programs the
//! STM compare service request nodes - the one routing the BSP itself
//! needs; further peripherals follow the same node shape.

use crate::family::NB_CORES;
use crate::mmio::Reg;

// ============================================================================
// Service request node layout
// ============================================================================

/// SRC.SRPN - service request priority number.
pub const SRC_SRPN_MASK: u32 = 0x0000_00FF;
/// SRC.SRPN shift.
pub const SRC_SRPN_SHIFT: u32 = 0;

/// SRC.SRE - service request enable.
pub const SRC_SRE: u32 = 1 << 10;

/// SRC.TOS - type of service (servicing core).
pub const SRC_TOS_MASK: u32 = 0x0000_3800;
/// SRC.TOS shift.
pub const SRC_TOS_SHIFT: u32 = 11;

/// Service request nodes of one STM instance.
#[repr(C)]
pub struct StmSrcRegs {
    /// SR0/SR1 - one node per compare channel.
    pub sr: [Reg; 2],
}

impl StmSrcRegs {
    const RESET: Self = Self {
        sr: [Reg::new(0), Reg::new(0)],
    };
}

/// The service request controller block (STM section).
#[repr(C)]
pub struct SrcRegs {
    /// One node group per STM instance.
    pub stm: [StmSrcRegs; NB_CORES],
}

impl SrcRegs {
    /// Reset-state block (host register model).
    pub const fn reset() -> Self {
        Self {
            stm: [StmSrcRegs::RESET; NB_CORES],
        }
    }
}

/// Access the service request controller block.
#[inline]
pub fn regs() -> &'static SrcRegs {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "tricore")] {
            // SAFETY: fixed module base from the family memory map.
            unsafe { &*(crate::family::spec::SRC_BASE as *const SrcRegs) }
        } else {
            &crate::sim::SRC
        }
    }
}

// ============================================================================
// TOS encoding
// ============================================================================

/// Type-of-service code for a logical core.
///
/// The encoding skips 1 (the DMA slot): core 0 is 0, core n is n + 1.
#[inline]
pub const fn type_of_service(core: usize) -> u32 {
    if core == 0 {
        0
    } else {
        core as u32 + 1
    }
}

// ============================================================================
// Routing
// ============================================================================

/// Route STM `channel`'s compare-0 service request to `core` at
/// `priority`, and enable it.
///
/// Out-of-range channel or core indices are silent no-ops, matching the
/// registrar's contract.
pub fn route_stm_compare(channel: usize, core: usize, priority: u32) {
    if core >= NB_CORES {
        return;
    }
    let Some(node) = regs().stm.get(channel) else {
        return;
    };

    node.sr[0].modify(|v| {
        let v = (v & !SRC_SRPN_MASK) | ((priority << SRC_SRPN_SHIFT) & SRC_SRPN_MASK);
        (v & !SRC_TOS_MASK) | (type_of_service(core) << SRC_TOS_SHIFT)
    });
    node.sr[0].set_bits(SRC_SRE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn type_of_service_skips_the_dma_slot() {
        assert_eq!(type_of_service(0), 0);
        assert_eq!(type_of_service(1), 2);
        assert_eq!(type_of_service(2), 3);
        assert_eq!(type_of_service(3), 4);
    }

    #[test]
    fn routing_programs_priority_core_and_enable() {
        let _guard = sim::lock();
        let node = &regs().stm[2].sr[0];
        node.write(0);

        route_stm_compare(2, 2, 10);
        let v = node.read();
        assert_eq!((v & SRC_SRPN_MASK) >> SRC_SRPN_SHIFT, 10);
        assert_eq!((v & SRC_TOS_MASK) >> SRC_TOS_SHIFT, 3);
        assert_ne!(v & SRC_SRE, 0);
        node.write(0);
    }

    #[test]
    fn out_of_range_routing_is_a_no_op() {
        let _guard = sim::lock();
        let before: [u32; NB_CORES] =
            core::array::from_fn(|i| regs().stm[i].sr[0].read());

        route_stm_compare(NB_CORES, 0, 5);
        route_stm_compare(0, NB_CORES, 5);

        for (i, &b) in before.iter().enumerate() {
            assert_eq!(regs().stm[i].sr[0].read(), b);
        }
    }
}
