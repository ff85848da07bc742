//! # Oscillator & PLLs
//!
//! Bring-up of the external crystal oscillator, the system PLL (CPU and
//! platform clocks) and the peripheral PLL (QSPI and friends), plus the
//! pure divider-planning arithmetic that turns a crystal frequency into
//! the divider sets for the family's nominal clock targets.
//!
//! Bring-up sequences follow the hardware protocol to the letter: power
//! the PLL down, configure the feedback path, power up, wait for the
//! power state, restart lock detection, wait for lock, then program the
//! output dividers as they become ready. Every wait is a bounded hardware
//! transition.

use super::regs;
use super::wdt::SafetyEndinitGuard;
use crate::family::spec;

// ============================================================================
// OSCCON layout
// ============================================================================

/// OSCCON.PLLLV - oscillator frequency above the lower plausibility bound.
pub const OSCCON_PLLLV: u32 = 1 << 1;
/// OSCCON.OSCRES - restart oscillator supervision.
pub const OSCCON_OSCRES: u32 = 1 << 2;
/// OSCCON.MODE - oscillator mode.
pub const OSCCON_MODE_MASK: u32 = 0x0000_0060;
/// OSCCON.MODE shift; 0 = external crystal.
pub const OSCCON_MODE_SHIFT: u32 = 5;
/// OSCCON.PLLHV - oscillator frequency below the upper plausibility bound.
pub const OSCCON_PLLHV: u32 = 1 << 8;
/// OSCCON.OSCVAL - reference divider for the oscillator watchdog.
pub const OSCCON_OSCVAL_MASK: u32 = 0x007F_0000;
/// OSCCON.OSCVAL shift.
pub const OSCCON_OSCVAL_SHIFT: u32 = 16;

// ============================================================================
// PLL configuration/status layout (shared by both PLLs)
// ============================================================================

/// CON0.NDIV - VCO feedback divider.
pub const PLLCON0_NDIV_MASK: u32 = 0x0000_7F00;
/// CON0.NDIV shift.
pub const PLLCON0_NDIV_SHIFT: u32 = 8;
/// CON0.PLLPWD - power; 0 requests power-down.
pub const PLLCON0_PLLPWD: u32 = 1 << 16;
/// CON0.RESLD - restart lock detection.
pub const PLLCON0_RESLD: u32 = 1 << 18;
/// CON0.PDIV - input divider.
pub const PLLCON0_PDIV_MASK: u32 = 0x0700_0000;
/// CON0.PDIV shift.
pub const PLLCON0_PDIV_SHIFT: u32 = 24;
/// CON0.DIVBY - peripheral PLL 1.6 pre-divider on the K3 path.
pub const PLLCON0_DIVBY: u32 = 1 << 28;
/// CON0.INSEL - input clock select.
pub const PLLCON0_INSEL_MASK: u32 = 0xC000_0000;
/// CON0.INSEL shift.
pub const PLLCON0_INSEL_SHIFT: u32 = 30;

/// INSEL encoding: external crystal oscillator.
pub const INSEL_XOSC: u32 = 1;

/// CON1.K2DIV - first output divider.
pub const PLLCON1_K2DIV_MASK: u32 = 0x0000_007F;
/// CON1.K2DIV shift.
pub const PLLCON1_K2DIV_SHIFT: u32 = 0;
/// CON1.K3DIV - second output divider (peripheral PLL).
pub const PLLCON1_K3DIV_MASK: u32 = 0x0000_7F00;
/// CON1.K3DIV shift.
pub const PLLCON1_K3DIV_SHIFT: u32 = 8;

/// STAT.PWDSTAT - PLL is powered down.
pub const PLLSTAT_PWDSTAT: u32 = 1 << 1;
/// STAT.LOCK - PLL frequency locked.
pub const PLLSTAT_LOCK: u32 = 1 << 2;
/// STAT.K2RDY - K2 divider accepts updates.
pub const PLLSTAT_K2RDY: u32 = 1 << 5;
/// STAT.K3RDY - K3 divider accepts updates.
pub const PLLSTAT_K3RDY: u32 = 1 << 6;

// ============================================================================
// Divider planning
// ============================================================================

/// Crystal frequency fitted on the family evaluation boards; used by init
/// paths that cannot thread a board value.
pub const NOMINAL_XTAL_MHZ: u32 = 20;

/// Reference frequency supervised by the oscillator watchdog [kHz].
const OSC_REFERENCE_KHZ: u32 = 2_500;

/// Divider plan for the system PLL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysPllConfig {
    /// Input divider.
    pub pdiv: u32,
    /// VCO feedback divider.
    pub ndiv: u32,
    /// Output divider.
    pub k2: u32,
}

/// Divider plan for the peripheral PLL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerPllConfig {
    /// Input divider.
    pub pdiv: u32,
    /// VCO feedback divider.
    pub ndiv: u32,
    /// 1.6 pre-divider on the K3 output path.
    pub divby: bool,
    /// fPLL1 output divider.
    pub k2: u32,
    /// fPLL2 output divider.
    pub k3: u32,
}

/// Planning failures; all are configuration errors visible at build/test
/// time, never runtime surprises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The crystal cannot be divided into the PLL input window.
    CrystalOutOfRange,
    /// No integer divider set reaches the nominal target inside the VCO
    /// window.
    TargetUnreachable,
}

/// Input divider bringing `xtal_mhz` into the `[min, max]` input window.
const fn input_divider(xtal_mhz: u32, max_mhz: u32) -> u32 {
    if xtal_mhz > max_mhz {
        2
    } else {
        1
    }
}

/// Plan the system PLL dividers for the nominal fPLL0 target.
///
/// Chooses the divider set whose VCO lands closest to the recommended
/// operating point while dividing exactly to the target.
pub fn plan_system_pll(xtal_mhz: u32) -> Result<SysPllConfig, ClockError> {
    let pdiv = input_divider(xtal_mhz, spec::PLL0_INCLK_MAX_MHZ);
    let inclk = xtal_mhz / pdiv;
    if inclk < spec::PLL0_INCLK_MIN_MHZ || inclk > spec::PLL0_INCLK_MAX_MHZ {
        return Err(ClockError::CrystalOutOfRange);
    }

    let mut best: Option<SysPllConfig> = None;
    let mut best_distance = u32::MAX;

    let mut k2 = 1;
    while k2 <= 8 {
        let vco = spec::PLL0_CLOCK_MHZ * k2;
        if vco >= spec::PLL0_VCO_MIN_MHZ && vco <= spec::PLL0_VCO_MAX_MHZ && vco % inclk == 0 {
            let distance = vco.abs_diff(spec::PLL0_VCO_REC_MHZ);
            if distance < best_distance {
                best = Some(SysPllConfig {
                    pdiv,
                    ndiv: vco / inclk,
                    k2,
                });
                best_distance = distance;
            }
        }
        k2 += 1;
    }

    best.ok_or(ClockError::TargetUnreachable)
}

/// Plan the peripheral PLL dividers for the nominal fPLL1/fPLL2 targets.
pub fn plan_peripheral_pll(xtal_mhz: u32) -> Result<PerPllConfig, ClockError> {
    let pdiv = input_divider(xtal_mhz, spec::PLL1_INCLK_MAX_MHZ);
    let inclk = xtal_mhz / pdiv;
    if inclk < spec::PLL1_INCLK_MIN_MHZ || inclk > spec::PLL1_INCLK_MAX_MHZ {
        return Err(ClockError::CrystalOutOfRange);
    }

    let mut k2 = 1;
    while k2 <= 8 {
        let vco = spec::PLL1_CLOCK_MHZ * k2;
        if vco >= spec::PLL1_VCO_MIN_MHZ && vco <= spec::PLL1_VCO_MAX_MHZ && vco % inclk == 0 {
            // fPLL2 is tapped behind the 1.6 pre-divider.
            let k3_input = vco * 5 / 8;
            if k3_input % spec::PLL2_CLOCK_MHZ == 0 {
                return Ok(PerPllConfig {
                    pdiv,
                    ndiv: vco / inclk,
                    divby: true,
                    k2,
                    k3: k3_input / spec::PLL2_CLOCK_MHZ,
                });
            }
        }
        k2 += 1;
    }

    Err(ClockError::TargetUnreachable)
}

/// OSCVAL setting for the oscillator watchdog reference divider.
///
/// `fOSCREF = fOSC / (OSCVAL + 1)`, targeted at ~2.5 MHz.
pub const fn oscval(xtal_mhz: u32) -> u32 {
    (xtal_mhz * 1_000) / OSC_REFERENCE_KHZ - 1
}

// ============================================================================
// Status queries
// ============================================================================

/// Whether the external oscillator passed both plausibility checks.
#[inline]
pub fn xosc_stable() -> bool {
    regs().osccon.is_set(OSCCON_PLLLV | OSCCON_PLLHV)
}

/// Whether the system PLL reports frequency lock.
#[inline]
pub fn system_pll_locked() -> bool {
    regs().syspllstat.is_set(PLLSTAT_LOCK)
}

/// Whether the peripheral PLL reports frequency lock.
#[inline]
pub fn peripheral_pll_locked() -> bool {
    regs().perpllstat.is_set(PLLSTAT_LOCK)
}

// ============================================================================
// Bring-up sequences
// ============================================================================

/// Enable the external crystal oscillator and wait for it to stabilize.
///
/// The system clock is parked on the backup source first so the change
/// cannot starve the part. The stabilization wait (up to ~5 ms) runs
/// outside the Safety-ENDINIT window.
pub fn enable_xosc(xtal_mhz: u32) {
    if super::ccu::system_clock() != super::ccu::SystemClock::Backup {
        super::ccu::switch_system_clock(super::ccu::SystemClock::Backup);
    }

    let scu = regs();
    {
        let _window = SafetyEndinitGuard::open();

        scu.osccon.clear_bits(OSCCON_MODE_MASK);
        scu.syspllcon0.modify(|v| {
            (v & !PLLCON0_INSEL_MASK) | (INSEL_XOSC << PLLCON0_INSEL_SHIFT)
        });

        scu.osccon.modify(|v| {
            (v & !OSCCON_OSCVAL_MASK) | (oscval(xtal_mhz) << OSCCON_OSCVAL_SHIFT)
        });
        scu.osccon.set_bits(OSCCON_OSCRES);
    }

    scu.osccon.wait_set(OSCCON_PLLLV | OSCCON_PLLHV);
}

/// Enable the system PLL with the given divider plan.
pub fn enable_system_pll(config: SysPllConfig) {
    let scu = regs();
    let _window = SafetyEndinitGuard::open();

    // Force a clean power-down state before reconfiguring.
    if !scu.syspllstat.is_set(PLLSTAT_PWDSTAT) {
        scu.syspllcon0.clear_bits(PLLCON0_PLLPWD);
        scu.syspllstat.wait_set(PLLSTAT_PWDSTAT);
    }

    scu.syspllcon0.modify(|v| {
        let v = (v & !PLLCON0_NDIV_MASK) | ((config.ndiv - 1) << PLLCON0_NDIV_SHIFT);
        let v = (v & !PLLCON0_PDIV_MASK) | ((config.pdiv - 1) << PLLCON0_PDIV_SHIFT);
        v | PLLCON0_PLLPWD
    });
    scu.syspllstat.wait_clear(PLLSTAT_PWDSTAT);

    scu.syspllcon0.set_bits(PLLCON0_RESLD);
    scu.syspllstat.wait_set(PLLSTAT_LOCK);

    scu.syspllstat.wait_set(PLLSTAT_K2RDY);
    scu.syspllcon1.modify(|v| {
        (v & !PLLCON1_K2DIV_MASK) | ((config.k2 - 1) << PLLCON1_K2DIV_SHIFT)
    });

    log::debug!("pll: system PLL locked");
}

/// Enable the peripheral PLL with the given divider plan.
pub fn enable_peripheral_pll(config: PerPllConfig) {
    let scu = regs();
    let _window = SafetyEndinitGuard::open();

    if !scu.perpllstat.is_set(PLLSTAT_PWDSTAT) {
        scu.perpllcon0.clear_bits(PLLCON0_PLLPWD);
        scu.perpllstat.wait_set(PLLSTAT_PWDSTAT);
    }

    scu.perpllcon0.modify(|v| {
        let v = (v & !PLLCON0_NDIV_MASK) | ((config.ndiv - 1) << PLLCON0_NDIV_SHIFT);
        let v = (v & !PLLCON0_PDIV_MASK) | ((config.pdiv - 1) << PLLCON0_PDIV_SHIFT);
        let v = if config.divby { v | PLLCON0_DIVBY } else { v & !PLLCON0_DIVBY };
        v | PLLCON0_PLLPWD
    });
    scu.perpllstat.wait_clear(PLLSTAT_PWDSTAT);

    scu.perpllcon0.set_bits(PLLCON0_RESLD);
    scu.perpllstat.wait_set(PLLSTAT_LOCK);

    scu.perpllstat.wait_set(PLLSTAT_K2RDY);
    scu.perpllcon1.modify(|v| {
        (v & !PLLCON1_K2DIV_MASK) | ((config.k2 - 1) << PLLCON1_K2DIV_SHIFT)
    });
    scu.perpllstat.wait_set(PLLSTAT_K3RDY);
    scu.perpllcon1.modify(|v| {
        (v & !PLLCON1_K3DIV_MASK) | ((config.k3 - 1) << PLLCON1_K3DIV_SHIFT)
    });

    log::debug!("pll: peripheral PLL locked");
}

/// Enable the system PLL planned for the nominal board crystal.
pub fn enable_system_pll_nominal() {
    if let Ok(config) = plan_system_pll(NOMINAL_XTAL_MHZ) {
        enable_system_pll(config);
    }
}

/// Enable the peripheral PLL planned for the nominal board crystal.
pub fn enable_peripheral_pll_nominal() {
    if let Ok(config) = plan_peripheral_pll(NOMINAL_XTAL_MHZ) {
        enable_peripheral_pll(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_plan_for_the_nominal_crystal() {
        let plan = plan_system_pll(20).unwrap();
        assert_eq!(
            plan,
            SysPllConfig {
                pdiv: 1,
                ndiv: 30,
                k2: 2
            }
        );
        // fVCO = 20 / 1 * 30 = 600 (recommended point), fPLL0 = 600 / 2.
        assert_eq!(20 / plan.pdiv * plan.ndiv / plan.k2, 300);
    }

    #[test]
    fn fast_crystals_take_the_input_divider() {
        let plan = plan_system_pll(40).unwrap();
        assert_eq!(plan.pdiv, 2);
        assert_eq!(40 / plan.pdiv * plan.ndiv / plan.k2, 300);
    }

    #[test]
    fn out_of_window_crystals_are_rejected() {
        assert_eq!(plan_system_pll(8), Err(ClockError::CrystalOutOfRange));
        assert_eq!(plan_peripheral_pll(8), Err(ClockError::CrystalOutOfRange));
    }

    #[test]
    fn peripheral_plan_reaches_both_outputs() {
        let plan = plan_peripheral_pll(20).unwrap();
        assert_eq!(plan.ndiv, 32);
        assert_eq!(plan.k2, 2);
        assert!(plan.divby);
        // fVCO = 640, fPLL1 = 640 / 2, fPLL2 = 640 / 1.6 / 2.
        assert_eq!(20 / plan.pdiv * plan.ndiv / plan.k2, 320);
        assert_eq!((640 * 5 / 8) / plan.k3, 200);
    }

    #[test]
    fn oscillator_reference_divider() {
        assert_eq!(oscval(20), 7);
        assert_eq!(oscval(25), 9);
    }
}
