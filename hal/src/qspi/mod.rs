//! # QSPI (transmit path)
//!
//! A deliberately small slice of the QSPI peripheral: enough to push a
//! sequence of 16-bit command frames to a board power/safety IC during
//! startup (external watchdog disarm). Full-duplex data transfer, DMA and
//! interrupt operation are out of scope for the BSP.

use crate::mmio::Reg;
use crate::scu::wdt::EndinitGuard;

/// QSPI instances decoded on this family.
pub const NB_MODULES: usize = 4;

// ============================================================================
// Register block
// ============================================================================

/// One QSPI instance (transmit-relevant subset ordering).
#[repr(C)]
pub struct QspiRegs {
    /// Module clock control.
    pub clc: Reg,
    /// Input select.
    pub pisel: Reg,
    /// Global configuration.
    pub globalcon: Reg,
    /// Global configuration (move modes).
    pub globalcon1: Reg,
    /// Slave select output control.
    pub ssoc: Reg,
    /// Timing configuration per channel.
    pub econ: [Reg; 2],
    /// Status flags.
    pub status: Reg,
    /// Flag clear requests.
    pub flagsclear: Reg,
    /// Basic configuration entry.
    pub baconentry: Reg,
    /// Transmit data entry.
    pub dataentry: Reg,
    /// Receive exit register.
    pub rxexit: Reg,
    /// Kernel reset 0 (with status).
    pub krst0: Reg,
    /// Kernel reset 1.
    pub krst1: Reg,
    /// Kernel reset status clear.
    pub krstclr: Reg,
}

impl QspiRegs {
    pub(crate) const RESET: Self = Self {
        clc: Reg::new(0),
        pisel: Reg::new(0),
        globalcon: Reg::new(0),
        globalcon1: Reg::new(0),
        ssoc: Reg::new(0),
        econ: [Reg::new(0), Reg::new(0)],
        status: Reg::new(0),
        flagsclear: Reg::new(0),
        baconentry: Reg::new(0),
        dataentry: Reg::new(0),
        rxexit: Reg::new(0),
        krst0: Reg::new(0),
        krst1: Reg::new(0),
        krstclr: Reg::new(0),
    };
}

/// GLOBALCON.EN - module enable.
pub const GLOBALCON_EN: u32 = 1 << 0;

/// STATUS.TXF - transmit move finished.
pub const STATUS_TXF: u32 = 1 << 9;
/// STATUS.RXF - receive move finished.
pub const STATUS_RXF: u32 = 1 << 10;
/// STATUS error and phase flags cleared before a transfer burst.
pub const STATUS_ALL_FLAGS: u32 = 0xFFF;

/// KRST0.RST - request kernel reset.
pub const KRST0_RST: u32 = 1 << 0;
/// KRST0.RSTSTAT - kernel reset performed.
pub const KRST0_RSTSTAT: u32 = 1 << 1;
/// KRST1.RST - second reset trigger.
pub const KRST1_RST: u32 = 1 << 0;
/// KRSTCLR.CLR - clear the reset status.
pub const KRSTCLR_CLR: u32 = 1 << 0;

/// The register block of QSPI instance `n`.
#[inline]
pub fn module(n: usize) -> Option<&'static QspiRegs> {
    if n >= NB_MODULES {
        return None;
    }
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "tricore")] {
            use crate::family::spec;
            // SAFETY: fixed instance addresses from the family memory map.
            Some(unsafe {
                &*(crate::mmio::instance_base(spec::QSPI0_BASE, spec::QSPI_STRIDE, n)
                    as *const QspiRegs)
            })
        } else {
            Some(&crate::sim::QSPI[n])
        }
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Reset a QSPI kernel to a clean state.
pub fn reset_module(qspi: &QspiRegs) {
    let _window = EndinitGuard::open();
    qspi.krst1.set_bits(KRST1_RST);
    qspi.krst0.set_bits(KRST0_RST);
    qspi.krst0.wait_set(KRST0_RSTSTAT);
    qspi.krstclr.set_bits(KRSTCLR_CLR);
}

/// Enable the module clock and route the input.
pub fn enable_module(qspi: &QspiRegs) {
    let _window = EndinitGuard::open();
    qspi.clc.write(8);
    let _ = qspi.clc.read(); // read back so the enable takes effect
    qspi.pisel.write(1);
}

/// Transmit a sequence of 16-bit command frames, discarding the answers.
///
/// The channel configuration (GLOBALCON*, SSOC, ECON, BACONENTRY) must be
/// programmed by the caller beforehand; this is the blocking data phase
/// only.
pub fn transmit_commands(qspi: &QspiRegs, commands: &[u16]) {
    // Start from clean status flags.
    loop {
        qspi.flagsclear.write(STATUS_ALL_FLAGS);
        if qspi.status.read() & STATUS_ALL_FLAGS == 0 {
            break;
        }
    }

    qspi.globalcon.set_bits(GLOBALCON_EN);

    for &command in commands {
        qspi.flagsclear.write(STATUS_TXF);
        qspi.dataentry.write(command as u32);
        qspi.status.wait_set(STATUS_TXF);
        qspi.status.wait_set(STATUS_RXF);
        qspi.flagsclear.write(STATUS_RXF);
        let _ = qspi.rxexit.read(); // discard the response
    }
}
