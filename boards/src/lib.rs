//! # Board Definitions
//!
//! Per-board facts the generic family layer cannot know: the crystal on
//! the board, which pins carry the user LEDs, and whether an external
//! watchdog IC must be disarmed before long-running initialization.
//!
//! One board is selected by cargo feature (`triboard-tc387` by default);
//! all definitions compile everywhere, the feature only picks the
//! [`active`] alias.

#![no_std]

pub mod appkit_tc387_adas;
pub mod triboard_tc387;

cfg_if::cfg_if! {
    if #[cfg(feature = "appkit-tc387-adas")] {
        pub use appkit_tc387_adas as active;
    } else {
        pub use triboard_tc387 as active;
    }
}

use tc3xx_hal::port::{self, PadLevel, PadSpeed, PinCommand};
use tc3xx_hal::qspi;

// ============================================================================
// Board description
// ============================================================================

/// One board LED line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Led {
    /// Port index.
    pub port: usize,
    /// Pin index within the port.
    pub pin: usize,
}

/// SPI wiring towards an external watchdog/safety IC.
#[derive(Debug, Clone, Copy)]
pub struct SpiPins {
    /// Slave select: port, pin, output source.
    pub sls: (usize, usize, u32),
    /// Clock: port, pin, output source.
    pub sclk: (usize, usize, u32),
    /// Master transmit: port, pin, output source.
    pub mtsr: (usize, usize, u32),
    /// Master receive: port, pin (input, pulled up).
    pub mrst: (usize, usize),
}

/// An external watchdog that must be disarmed over QSPI.
#[derive(Debug, Clone, Copy)]
pub struct ExternalWatchdog {
    /// QSPI instance wired to the IC.
    pub qspi_module: usize,
    /// Slave select output configuration.
    pub ssoc: u32,
    /// Command frames that unprotect, disarm and re-protect the IC.
    pub commands: &'static [u16],
    /// Pin wiring.
    pub pins: SpiPins,
}

/// Everything the application needs to know about a board.
pub struct BoardInfo {
    /// Human-readable board name.
    pub name: &'static str,
    /// Crystal frequency [MHz].
    pub xtal_mhz: u32,
    /// User LEDs, one per core by convention.
    pub leds: &'static [Led],
    /// LED polarity: true when driving low lights the LED.
    pub leds_active_low: bool,
    /// External watchdog to disarm, if the board carries one.
    pub external_watchdog: Option<ExternalWatchdog>,
}

/// The selected board.
#[inline]
pub fn board() -> &'static BoardInfo {
    &active::BOARD
}

// ============================================================================
// LEDs
// ============================================================================

/// Requested LED states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    /// LED lit.
    On,
    /// LED dark.
    Off,
    /// Invert.
    Toggle,
}

fn led_command(state: LedState, active_low: bool) -> PinCommand {
    match (state, active_low) {
        (LedState::Toggle, _) => PinCommand::Toggle,
        (LedState::On, false) | (LedState::Off, true) => PinCommand::Set,
        (LedState::On, true) | (LedState::Off, false) => PinCommand::Clear,
    }
}

/// Configure every board LED as a GPIO output and apply `state`.
pub fn led_init_all(state: LedState) {
    let info = board();
    for led in info.leds {
        port::configure_output(
            led.port,
            led.pin,
            port::OUTPUT_SOURCE_GPIO,
            PadLevel::Automotive,
            PadSpeed::Grade1,
        );
        port::set_pin(led.port, led.pin, led_command(state, info.leds_active_low));
    }
    log::debug!("board: {} LEDs ready", info.leds.len());
}

/// Apply `state` to board LED `index`; unknown indices do nothing.
pub fn led_set(index: usize, state: LedState) {
    let info = board();
    if let Some(led) = info.leds.get(index) {
        port::set_pin(led.port, led.pin, led_command(state, info.leds_active_low));
    }
}

// ============================================================================
// External watchdog
// ============================================================================

// QSPI channel setup towards the watchdog IC; identical across the
// boards that carry one.
const WDG_GLOBALCON: u32 = 0x6000_3C00;
const WDG_GLOBALCON1: u32 = 0x0000_0600;
const WDG_ECON: u32 = 0x0000_2947;
const WDG_BACONENTRY: u32 = 0x17A2_4025;

/// Disarm the board's external watchdog, if any.
///
/// Runs once on the reset core before the clock tree is switched; the
/// QSPI kernel is reset before and after so no state leaks into the
/// application's own use of the module.
pub fn disable_external_watchdog() {
    let Some(wdg) = board().external_watchdog.as_ref() else {
        return;
    };
    let Some(module) = qspi::module(wdg.qspi_module) else {
        return;
    };

    if module.globalcon.is_set(qspi::GLOBALCON_EN) {
        qspi::reset_module(module);
    }

    let pins = &wdg.pins;
    port::configure_output(
        pins.sls.0,
        pins.sls.1,
        pins.sls.2,
        PadLevel::Automotive,
        PadSpeed::Grade1,
    );
    port::configure_output(
        pins.sclk.0,
        pins.sclk.1,
        pins.sclk.2,
        PadLevel::Automotive,
        PadSpeed::Grade1,
    );
    port::configure_output(
        pins.mtsr.0,
        pins.mtsr.1,
        pins.mtsr.2,
        PadLevel::Automotive,
        PadSpeed::Grade1,
    );
    port::configure_input(pins.mrst.0, pins.mrst.1, port::InputMode::PullUp);

    qspi::enable_module(module);
    module.globalcon.write(WDG_GLOBALCON);
    module.globalcon1.write(WDG_GLOBALCON1);
    module.ssoc.write(wdg.ssoc);
    module.econ[1].write(WDG_ECON);
    module.baconentry.write(WDG_BACONENTRY);

    qspi::transmit_commands(module, wdg.commands);
    qspi::reset_module(module);

    log::debug!("board: external watchdog disarmed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc3xx_hal::sim;

    #[test]
    fn board_crystal_is_servable_by_both_plls() {
        let info = board();
        assert!(tc3xx_hal::scu::pll::plan_system_pll(info.xtal_mhz).is_ok());
        assert!(tc3xx_hal::scu::pll::plan_peripheral_pll(info.xtal_mhz).is_ok());
    }

    #[test]
    fn one_led_per_core_with_distinct_lines() {
        let leds = board().leds;
        assert!(leds.len() >= tc3xx_hal::family::NB_CORES);
        for a in 0..leds.len() {
            for b in (a + 1)..leds.len() {
                assert_ne!(leds[a], leds[b]);
            }
        }
    }

    #[test]
    fn active_low_leds_invert_the_drive() {
        assert_eq!(led_command(LedState::On, true), PinCommand::Clear);
        assert_eq!(led_command(LedState::Off, true), PinCommand::Set);
        assert_eq!(led_command(LedState::On, false), PinCommand::Set);
        assert_eq!(led_command(LedState::Toggle, true), PinCommand::Toggle);
    }

    #[test]
    fn led_set_drives_the_mapped_pin() {
        let _guard = sim::lock();
        let info = board();
        let led = info.leds[0];
        let regs = tc3xx_hal::port::port(led.port).unwrap();
        regs.omr.write(0);

        led_set(0, LedState::Toggle);
        assert_eq!(regs.omr.read(), (1 << (led.pin + 16)) | (1 << led.pin));
        regs.omr.write(0);
    }

    #[test]
    fn unknown_led_indices_do_nothing() {
        let _guard = sim::lock();
        led_set(usize::MAX, LedState::On);
    }
}
