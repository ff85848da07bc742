//! # System Control Unit
//!
//! The SCU gathers the safety-critical platform plumbing: watchdogs and
//! their ENDINIT write-protection, the external oscillator, both PLLs,
//! clock distribution, and the external clock outputs.
//!
//! ## Submodules
//!
//! - `wdt`: ENDINIT lock discipline and watchdog disable
//! - `ccu`: clock distribution (CCUCONx) and system clock switching
//! - `pll`: oscillator and PLL bring-up, divider planning
//!
//! Registers in this unit are gated by one of the two ENDINIT domains;
//! every write path here goes through the scoped guards in [`wdt`].

pub mod ccu;
pub mod pll;
pub mod wdt;

use crate::family::MAX_CORES;
use crate::mmio::Reg;

// ============================================================================
// Register block
// ============================================================================

/// One watchdog instance (per-core watchdogs and the safety watchdog share
/// this shape).
#[repr(C)]
pub struct WdtRegs {
    /// Password, lock and ENDINIT control.
    pub con0: Reg,
    /// Mode control; carries the disable request.
    pub con1: Reg,
}

impl WdtRegs {
    const RESET: Self = Self {
        // ENDINIT set out of reset: protected registers are locked.
        con0: Reg::new(wdt::CON0_ENDINIT | wdt::CON0_LCK),
        con1: Reg::new(0),
    };

    /// Reset-state block (host register model).
    pub const fn reset() -> Self {
        Self::RESET
    }
}

/// The SCU register block.
///
/// Field order is not address-faithful; the layout contract with the
/// silicon lives in the linker-visible base address plus the vendor
/// header, and is not reproduced here.
#[repr(C)]
pub struct ScuRegs {
    /// Oscillator control and supervision.
    pub osccon: Reg,
    /// System PLL configuration 0 (input select, dividers, power).
    pub syspllcon0: Reg,
    /// System PLL configuration 1 (output divider).
    pub syspllcon1: Reg,
    /// System PLL status.
    pub syspllstat: Reg,
    /// Peripheral PLL configuration 0.
    pub perpllcon0: Reg,
    /// Peripheral PLL configuration 1 (output dividers).
    pub perpllcon1: Reg,
    /// Peripheral PLL status.
    pub perpllstat: Reg,
    /// Clock distribution 0 (system dividers, clock select).
    pub ccucon0: Reg,
    /// Clock distribution 1 (QSPI clock).
    pub ccucon1: Reg,
    /// Fractional divider (EXTCLK0 path).
    pub fdr: Reg,
    /// External clock output control.
    pub extcon: Reg,
    /// Safety watchdog.
    pub wdts: WdtRegs,
    /// Per-core watchdogs (family maximum; unpopulated cores read zero).
    pub wdtcpu: [WdtRegs; MAX_CORES],
}

impl ScuRegs {
    /// Reset-state block (host register model).
    pub const fn reset() -> Self {
        Self {
            osccon: Reg::new(0),
            syspllcon0: Reg::new(0),
            syspllcon1: Reg::new(0),
            syspllstat: Reg::new(0),
            perpllcon0: Reg::new(0),
            perpllcon1: Reg::new(0),
            perpllstat: Reg::new(0),
            ccucon0: Reg::new(0),
            ccucon1: Reg::new(0),
            fdr: Reg::new(0),
            extcon: Reg::new(0),
            wdts: WdtRegs::RESET,
            wdtcpu: [WdtRegs::RESET; MAX_CORES],
        }
    }
}

// ============================================================================
// Clock system bring-up
// ============================================================================

/// Configure the clock system for the family's nominal operating point.
///
/// The one call the reset core makes during shared-resource
/// initialization: system dividers, flash wait states for the target
/// frequency, oscillator, both PLLs, and finally the switch of the system
/// clock onto the PLL. Peripheral clocks beyond the BSP's own needs stay
/// at their reset defaults.
///
/// Fails only in planning - a crystal the PLLs cannot serve - before any
/// register is touched by the PLL path.
pub fn init_clock(xtal_mhz: u32) -> Result<(), pll::ClockError> {
    let sys = pll::plan_system_pll(xtal_mhz)?;
    let per = pll::plan_peripheral_pll(xtal_mhz)?;

    ccu::set_default_dividers();
    crate::flash::configure_for_clock(crate::family::spec::PLL0_CLOCK_MHZ);

    pll::enable_xosc(xtal_mhz);
    pll::enable_system_pll(sys);
    pll::enable_peripheral_pll(per);

    ccu::switch_system_clock(ccu::SystemClock::Pll0);

    log::info!(
        "scu: clock system up, fPLL0 {} MHz from {} MHz crystal",
        crate::family::spec::PLL0_CLOCK_MHZ,
        xtal_mhz
    );
    Ok(())
}

/// Access the SCU register block.
#[inline]
pub fn regs() -> &'static ScuRegs {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "tricore")] {
            // SAFETY: the family memory map places the SCU block at this
            // address for the entire address-space lifetime.
            unsafe { &*(crate::family::spec::SCU_BASE as *const ScuRegs) }
        } else {
            &crate::sim::SCU
        }
    }
}
