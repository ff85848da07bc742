//! # Application Kit TC387 ADAS
//!
//! Compact application kit: 20 MHz crystal, four LEDs on port 13, and no
//! external watchdog - the power stage is supervised on-die.

use super::{BoardInfo, Led};

/// LED lines, one per core.
pub const LEDS: [Led; 4] = [
    Led { port: 13, pin: 0 },
    Led { port: 13, pin: 1 },
    Led { port: 13, pin: 2 },
    Led { port: 13, pin: 3 },
];

/// The board description.
pub static BOARD: BoardInfo = BoardInfo {
    name: "Application Kit TC387 ADAS",
    xtal_mhz: 20,
    leds: &LEDS,
    leds_active_low: true,
    external_watchdog: None,
};
