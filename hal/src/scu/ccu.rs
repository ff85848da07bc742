//! # Clock Distribution
//!
//! CCUCONx programming and system clock source switching. Divider
//! registers follow a common handshake: wait until the register is not
//! locked (`LCK`), write the new content, optionally pulse `UP` to make
//! the CCU take it, and wait for the lock to clear again. The registers
//! sit in the Safety-ENDINIT domain.

use super::regs;
use super::wdt::SafetyEndinitGuard;
use crate::family::spec;
use crate::mmio::Reg;

// ============================================================================
// CCUCON0 layout
// ============================================================================

/// CCUCON0.STMDIV - system timer divider.
pub const CCUCON0_STMDIV_MASK: u32 = 0x0000_000F;
/// CCUCON0.STMDIV shift.
pub const CCUCON0_STMDIV_SHIFT: u32 = 0;

/// CCUCON0.SRIDIV - SRI interconnect divider.
pub const CCUCON0_SRIDIV_MASK: u32 = 0x0000_0F00;
/// CCUCON0.SRIDIV shift.
pub const CCUCON0_SRIDIV_SHIFT: u32 = 8;

/// CCUCON0.SPBDIV - SPB bus divider.
pub const CCUCON0_SPBDIV_MASK: u32 = 0x000F_0000;
/// CCUCON0.SPBDIV shift.
pub const CCUCON0_SPBDIV_SHIFT: u32 = 16;

/// CCUCON0.FSI2DIV - FSI2 divider.
pub const CCUCON0_FSI2DIV_MASK: u32 = 0x00F0_0000;
/// CCUCON0.FSI2DIV shift.
pub const CCUCON0_FSI2DIV_SHIFT: u32 = 20;

/// CCUCON0.FSIDIV - FSI divider.
pub const CCUCON0_FSIDIV_MASK: u32 = 0x0F00_0000;
/// CCUCON0.FSIDIV shift.
pub const CCUCON0_FSIDIV_SHIFT: u32 = 24;

/// CCUCON0.CLKSEL - system clock source.
pub const CCUCON0_CLKSEL_MASK: u32 = 0x3000_0000;
/// CCUCON0.CLKSEL shift.
pub const CCUCON0_CLKSEL_SHIFT: u32 = 28;

/// CCUCONx.UP - request the CCU to take the register content.
pub const CCUCON_UP: u32 = 1 << 30;

/// CCUCONx.LCK - register busy; writes are ignored while set.
pub const CCUCON_LCK: u32 = 1 << 31;

/// CLKSEL encoding: internal backup clock.
pub const CLKSEL_BACKUP: u32 = 0;

/// CLKSEL encoding: system PLL output.
pub const CLKSEL_PLL0: u32 = 1;

// ============================================================================
// CCUCON1 layout
// ============================================================================

/// CCUCON1.QSPIDIV - QSPI clock divider.
pub const CCUCON1_QSPIDIV_MASK: u32 = 0x0000_000F;
/// CCUCON1.QSPIDIV shift.
pub const CCUCON1_QSPIDIV_SHIFT: u32 = 0;

/// CCUCON1.CLKSELQSPI - QSPI clock source.
pub const CCUCON1_CLKSELQSPI_MASK: u32 = 0x3000_0000;
/// CCUCON1.CLKSELQSPI shift.
pub const CCUCON1_CLKSELQSPI_SHIFT: u32 = 28;

/// CLKSELQSPI encoding: peripheral PLL second output (fPLL2).
pub const CLKSELQSPI_PLL2: u32 = 2;

// ============================================================================
// Default dividers
// ============================================================================

/// STM divider for the nominal clock targets.
pub const DEFAULT_STM_DIV: u32 = spec::PLL0_CLOCK_MHZ / spec::STM_CLOCK_MHZ;

/// SRI divider for the nominal clock targets.
pub const DEFAULT_SRI_DIV: u32 = spec::PLL0_CLOCK_MHZ / spec::SRI_CLOCK_MHZ;

/// SPB divider for the nominal clock targets.
pub const DEFAULT_SPB_DIV: u32 = spec::PLL0_CLOCK_MHZ / spec::SPB_CLOCK_MHZ;

/// FSI divider: FSI runs at the SPB frequency.
pub const DEFAULT_FSI_DIV: u32 = DEFAULT_SPB_DIV;

/// FSI2 divider: FSI2 runs at the SRI frequency.
pub const DEFAULT_FSI2_DIV: u32 = DEFAULT_SRI_DIV;

/// QSPI divider from fPLL2.
pub const DEFAULT_QSPI_DIV: u32 = 1;

// ============================================================================
// System clock source
// ============================================================================

/// Selectable system clock inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemClock {
    /// Internal backup oscillator; always available.
    Backup,
    /// System PLL output.
    Pll0,
}

// ============================================================================
// CCUCON programming
// ============================================================================

/// Write a CCUCON register under the LCK/UP handshake.
///
/// With `update` the CCU takes the content immediately; without it the
/// value is only staged.
pub fn set_ccucon(con: &Reg, value: u32, update: bool) {
    let _window = SafetyEndinitGuard::open();

    con.wait_clear(CCUCON_LCK);
    let value = if update {
        value | CCUCON_UP
    } else {
        value & !CCUCON_UP
    };
    con.write(value);
}

/// Program the default system clock dividers for the nominal targets.
pub fn set_default_dividers() {
    let scu = regs();

    let mut con0 = scu.ccucon0.read();
    con0 = (con0 & !CCUCON0_STMDIV_MASK) | (DEFAULT_STM_DIV << CCUCON0_STMDIV_SHIFT);
    con0 = (con0 & !CCUCON0_SRIDIV_MASK) | (DEFAULT_SRI_DIV << CCUCON0_SRIDIV_SHIFT);
    con0 = (con0 & !CCUCON0_SPBDIV_MASK) | (DEFAULT_SPB_DIV << CCUCON0_SPBDIV_SHIFT);
    con0 = (con0 & !CCUCON0_FSIDIV_MASK) | (DEFAULT_FSI_DIV << CCUCON0_FSIDIV_SHIFT);
    con0 = (con0 & !CCUCON0_FSI2DIV_MASK) | (DEFAULT_FSI2_DIV << CCUCON0_FSI2DIV_SHIFT);
    set_ccucon(&scu.ccucon0, con0, true);

    let mut con1 = scu.ccucon1.read();
    con1 = (con1 & !CCUCON1_QSPIDIV_MASK) | (DEFAULT_QSPI_DIV << CCUCON1_QSPIDIV_SHIFT);
    con1 = (con1 & !CCUCON1_CLKSELQSPI_MASK) | (CLKSELQSPI_PLL2 << CCUCON1_CLKSELQSPI_SHIFT);
    set_ccucon(&scu.ccucon1, con1, true);
}

/// Current system clock selection.
pub fn system_clock() -> SystemClock {
    match regs().ccucon0.field(CCUCON0_CLKSEL_MASK, CCUCON0_CLKSEL_SHIFT) {
        CLKSEL_PLL0 => SystemClock::Pll0,
        _ => SystemClock::Backup,
    }
}

/// Switch the system clock source.
///
/// Switching to the PLL always routes through the backup clock first and
/// brings up the oscillator and both PLLs on demand, so the call is safe
/// from any starting state. The requested input must be stable before the
/// final select; the on-demand bring-up guarantees that.
pub fn switch_system_clock(target: SystemClock) {
    let scu = regs();

    match target {
        SystemClock::Backup => {
            if system_clock() == SystemClock::Backup {
                return;
            }
            let _window = SafetyEndinitGuard::open();
            scu.ccucon0.wait_clear(CCUCON_LCK);
            scu.ccucon0.modify(|v| {
                (v & !CCUCON0_CLKSEL_MASK) | (CLKSEL_BACKUP << CCUCON0_CLKSEL_SHIFT) | CCUCON_UP
            });
            scu.ccucon0.wait_clear(CCUCON_LCK);
        }
        SystemClock::Pll0 => {
            if system_clock() != SystemClock::Backup {
                switch_system_clock(SystemClock::Backup);
            }

            if !super::pll::xosc_stable() {
                super::pll::enable_xosc(super::pll::NOMINAL_XTAL_MHZ);
            }
            if !super::pll::system_pll_locked() {
                super::pll::enable_system_pll_nominal();
            }
            if !super::pll::peripheral_pll_locked() {
                super::pll::enable_peripheral_pll_nominal();
            }

            let _window = SafetyEndinitGuard::open();
            scu.ccucon0.wait_clear(CCUCON_LCK);
            scu.ccucon0.modify(|v| {
                (v & !CCUCON0_CLKSEL_MASK) | (CLKSEL_PLL0 << CCUCON0_CLKSEL_SHIFT) | CCUCON_UP
            });
            scu.ccucon0.wait_clear(CCUCON_LCK);

            log::debug!("ccu: system clock on PLL0");
        }
    }
}

// ============================================================================
// External clock outputs
// ============================================================================

/// EXTCON.EN0 - EXTCLK0 output enable.
pub const EXTCON_EN0: u32 = 1 << 0;
/// EXTCON.SEL0 - EXTCLK0 source select.
pub const EXTCON_SEL0_MASK: u32 = 0x0000_000E;
/// EXTCON.SEL0 shift.
pub const EXTCON_SEL0_SHIFT: u32 = 1;
/// EXTCON.EN1 - EXTCLK1 output enable.
pub const EXTCON_EN1: u32 = 1 << 16;
/// EXTCON.SEL1 - EXTCLK1 source select.
pub const EXTCON_SEL1_MASK: u32 = 0x000E_0000;
/// EXTCON.SEL1 shift.
pub const EXTCON_SEL1_SHIFT: u32 = 17;
/// EXTCON.DIV1 - EXTCLK1 divider.
pub const EXTCON_DIV1_MASK: u32 = 0x0FF0_0000;
/// EXTCON.DIV1 shift.
pub const EXTCON_DIV1_SHIFT: u32 = 20;

/// FDR.STEP - fractional divider step.
pub const FDR_STEP_MASK: u32 = 0x0000_03FF;
/// FDR.DM - divider mode (normal).
pub const FDR_DM_NORMAL: u32 = 1 << 14;

/// Route a clock to the EXTCLK0 pin.
///
/// `div` is the even output divider for the `fout` source; other sources
/// ignore it. `fout = (fspb / div)` with the fractional divider halving
/// the step internally.
pub fn select_extclk0(source: u32, div: u32) {
    let scu = regs();
    let _window = SafetyEndinitGuard::open();

    scu.fdr
        .write((1024 - ((div >> 1) & FDR_STEP_MASK)) | FDR_DM_NORMAL);
    scu.extcon.modify(|v| {
        (v & !EXTCON_SEL0_MASK) | ((source << EXTCON_SEL0_SHIFT) & EXTCON_SEL0_MASK) | EXTCON_EN0
    });
}

/// Route a clock to the EXTCLK1 pin with an output divider.
pub fn select_extclk1(source: u32, div: u32) {
    let scu = regs();
    let _window = SafetyEndinitGuard::open();

    scu.extcon.modify(|v| {
        let v = (v & !EXTCON_SEL1_MASK) | ((source << EXTCON_SEL1_SHIFT) & EXTCON_SEL1_MASK);
        let v = (v & !EXTCON_DIV1_MASK) | (((div - 1) << EXTCON_DIV1_SHIFT) & EXTCON_DIV1_MASK);
        v | EXTCON_EN1
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn default_dividers_hit_the_nominal_targets() {
        assert_eq!(DEFAULT_STM_DIV, 3);
        assert_eq!(DEFAULT_SRI_DIV, 1);
        assert_eq!(DEFAULT_SPB_DIV, 3);
    }

    #[test]
    fn set_ccucon_stages_without_update() {
        let _guard = sim::lock();
        let scu = regs();
        set_ccucon(&scu.ccucon1, 0x5, false);
        assert_eq!(scu.ccucon1.read() & CCUCON_UP, 0);
        set_ccucon(&scu.ccucon1, 0x5, true);
        assert_ne!(scu.ccucon1.read() & CCUCON_UP, 0);
        scu.ccucon1.write(0);
    }

    #[test]
    fn switch_to_backup_is_idempotent() {
        let _guard = sim::lock();
        let scu = regs();
        scu.ccucon0.write(0);
        switch_system_clock(SystemClock::Backup);
        assert_eq!(system_clock(), SystemClock::Backup);
    }

    #[test]
    fn switch_to_pll_selects_pll_once_sources_are_stable() {
        let _guard = sim::lock();
        let scu = regs();
        scu.ccucon0.write(0);

        // Pre-arrange a stable oscillator and locked PLLs so the switch
        // takes the select-only path.
        sim::force_stable_clock_sources();

        switch_system_clock(SystemClock::Pll0);
        assert_eq!(system_clock(), SystemClock::Pll0);

        scu.ccucon0.write(0);
        sim::clear_clock_sources();
    }

    #[test]
    fn extclk_field_encoding() {
        let _guard = sim::lock();
        let scu = regs();
        scu.extcon.write(0);

        select_extclk1(3, 4);
        let v = scu.extcon.read();
        assert_ne!(v & EXTCON_EN1, 0);
        assert_eq!((v & EXTCON_SEL1_MASK) >> EXTCON_SEL1_SHIFT, 3);
        assert_eq!((v & EXTCON_DIV1_MASK) >> EXTCON_DIV1_SHIFT, 3);
        scu.extcon.write(0);
    }
}
