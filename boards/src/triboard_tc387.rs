//! # TriBoard TC387
//!
//! The family evaluation board: 20 MHz crystal, eight LED lines (four
//! on-board LEDs, four more on the GPIO header), and a TLF-class power
//! and safety IC whose window watchdog must be disarmed over QSPI before
//! the startup sequence can take its time.

use super::{BoardInfo, ExternalWatchdog, Led, SpiPins};

/// LED lines; the first four are the on-board LEDs.
pub const LEDS: [Led; 8] = [
    Led { port: 33, pin: 4 },
    Led { port: 33, pin: 5 },
    Led { port: 33, pin: 6 },
    Led { port: 33, pin: 7 },
    Led { port: 1, pin: 4 },
    Led { port: 1, pin: 5 },
    Led { port: 1, pin: 6 },
    Led { port: 1, pin: 7 },
];

/// Command frames for the safety IC's window watchdog:
/// clear the duration error event, unprotect the configuration register,
/// disable the window watchdog, and protect the register again.
pub const WDG_DISARM_COMMANDS: [u16; 10] = [
    0xBE09, // clear duration error event
    0x8756, 0x87DE, 0x86AD, 0x8625, // unprotect PROTCFG
    0x8D27, // disable window watchdog
    0x87BE, 0x8668, 0x877D, 0x8795, // protect PROTCFG
];

/// The board description.
pub static BOARD: BoardInfo = BoardInfo {
    name: "TriBoard TC387",
    xtal_mhz: 20,
    leds: &LEDS,
    leds_active_low: true,
    external_watchdog: Some(ExternalWatchdog {
        qspi_module: 2,
        // SLSO21, low active.
        ssoc: 0x0002_0000,
        commands: &WDG_DISARM_COMMANDS,
        pins: SpiPins {
            sls: (20, 13, 3),
            sclk: (15, 6, 2),
            mtsr: (15, 5, 2),
            mrst: (15, 7),
        },
    }),
};
