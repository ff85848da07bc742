//! # Ports & GPIO
//!
//! Pin configuration and GPIO access. A port carries 16 pins; pin control
//! lives in lane-structured registers - 8 bits per pin in the IOCR group,
//! 4 bits per pin in the pad driver group - so configuration is always a
//! masked read-modify-write of the pin's lane.
//!
//! Output commands go through the OMR register, which sets, clears or
//! toggles a pin in a single write without touching its neighbors.

use crate::family::spec;
use crate::mmio::Reg;
use crate::scu::wdt::EndinitGuard;

// ============================================================================
// Register block
// ============================================================================

/// One port instance.
#[repr(C)]
pub struct PortRegs {
    /// Output latch.
    pub out: Reg,
    /// Output modification: set/clear/toggle single pins.
    pub omr: Reg,
    /// Pin control, 4 pins per register, 8 bits per pin.
    pub iocr: [Reg; 4],
    /// Pin input levels.
    pub input: Reg,
    /// Pad driver control, 8 pins per register, 4 bits per pin.
    pub pdr: [Reg; 2],
}

impl PortRegs {
    pub(crate) const RESET: Self = Self {
        out: Reg::new(0),
        omr: Reg::new(0),
        iocr: [Reg::new(0), Reg::new(0), Reg::new(0), Reg::new(0)],
        input: Reg::new(0),
        pdr: [Reg::new(0), Reg::new(0)],
    };
}

/// The register block of port `n`.
#[inline]
pub fn port(n: usize) -> Option<&'static PortRegs> {
    if n >= spec::NB_PORTS {
        return None;
    }
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "tricore")] {
            // SAFETY: fixed instance addresses from the family memory map.
            Some(unsafe {
                &*(crate::mmio::instance_base(spec::P00_BASE, spec::PORT_STRIDE, n)
                    as *const PortRegs)
            })
        } else {
            Some(&crate::sim::PORTS[n])
        }
    }
}

// ============================================================================
// Pin modes
// ============================================================================

/// Input termination selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum InputMode {
    /// No termination.
    Tristate = 0,
    /// Weak pull-down.
    PullDown = 1,
    /// Weak pull-up.
    PullUp = 2,
}

/// Pad level selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PadLevel {
    /// Automotive level pads.
    Automotive = 0,
    /// TTL level pads.
    Ttl = 1,
}

/// Pad driver speed grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PadSpeed {
    /// Strongest edge.
    Grade1 = 1,
    /// Medium edge.
    Grade2 = 2,
    /// Weak edge (EMC friendly).
    Grade3 = 3,
}

/// Output commands accepted by OMR: set = 1, clear = 2, toggle = both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PinCommand {
    /// Drive high.
    Set = 1,
    /// Drive low.
    Clear = 2,
    /// Invert.
    Toggle = 3,
}

/// Output signal source: the GPIO output latch (alternate functions use
/// 1..=7).
pub const OUTPUT_SOURCE_GPIO: u32 = 0;

// IOCR pin-control encoding: bit 4 of the PC field selects output,
// bits 0..=1 the input termination; the whole field sits at bits 3..=7
// of the pin's lane.
const IOCR_PC_OUTPUT: u32 = 0x10;

// ============================================================================
// Pin configuration
// ============================================================================

/// Configure a pin as input with the given termination.
pub fn configure_input(port_index: usize, pin: usize, mode: InputMode) {
    let Some(regs) = port(port_index) else {
        return;
    };
    if pin >= 16 {
        return;
    }

    let lane = 8 * (pin % 4) as u32;
    regs.iocr[pin / 4].masked_write(((mode as u32) << 3) << lane, 0xFF << lane);
}

/// Configure a pin as output.
///
/// `source` selects the driving signal (see the PC coding table of the
/// user manual); pad level and speed program the pin's driver stage.
pub fn configure_output(
    port_index: usize,
    pin: usize,
    source: u32,
    level: PadLevel,
    speed: PadSpeed,
) {
    let Some(regs) = port(port_index) else {
        return;
    };
    if pin >= 16 {
        return;
    }

    let lane = 8 * (pin % 4) as u32;
    regs.iocr[pin / 4].masked_write(((IOCR_PC_OUTPUT | source) << 3) << lane, 0xFF << lane);

    // The pad driver registers sit behind the ENDINIT lock.
    let _window = EndinitGuard::open();
    let lane = 4 * (pin % 8) as u32;
    regs.pdr[pin / 8].masked_write((((level as u32) << 3) | speed as u32) << lane, 0xF << lane);
}

// ============================================================================
// GPIO
// ============================================================================

/// Apply an output command to a single pin.
#[inline]
pub fn set_pin(port_index: usize, pin: usize, command: PinCommand) {
    let Some(regs) = port(port_index) else {
        return;
    };
    if pin >= 16 {
        return;
    }

    let ps = (command as u32 & 0x1) << pin;
    let pcl = (command as u32 & 0x2) << (pin + 15);
    regs.omr.write(pcl | ps);
}

/// Read the input level of a pin.
#[inline]
pub fn pin_state(port_index: usize, pin: usize) -> bool {
    match port(port_index) {
        Some(regs) if pin < 16 => regs.input.read() & (1 << pin) != 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn input_configuration_hits_the_right_lane() {
        let _guard = sim::lock();
        let regs = port(14).unwrap();
        regs.iocr[1].write(0xFFFF_FFFF);

        // Pin 5 lives in IOCR1, lane 1 (bits 8..=15).
        configure_input(14, 5, InputMode::PullUp);
        assert_eq!(regs.iocr[1].read(), 0xFFFF_10FF);
        regs.iocr[1].write(0);
    }

    #[test]
    fn output_configuration_programs_control_and_driver() {
        let _guard = sim::lock();
        sim::set_current_core(0);
        let regs = port(33).unwrap();
        regs.iocr[1].write(0);
        regs.pdr[0].write(0);

        configure_output(33, 6, OUTPUT_SOURCE_GPIO, PadLevel::Automotive, PadSpeed::Grade1);
        // Pin 6: IOCR1 lane 2 carries PC = 0x10 << 3.
        assert_eq!(regs.iocr[1].read(), 0x0080_0000);
        // PDR0 lane 6 carries level/speed.
        assert_eq!(regs.pdr[0].read(), 0x0100_0000);

        regs.iocr[1].write(0);
        regs.pdr[0].write(0);
    }

    #[test]
    fn omr_encoding() {
        let _guard = sim::lock();
        let regs = port(0).unwrap();

        set_pin(0, 3, PinCommand::Set);
        assert_eq!(regs.omr.read(), 1 << 3);

        set_pin(0, 3, PinCommand::Clear);
        assert_eq!(regs.omr.read(), 1 << 19);

        set_pin(0, 3, PinCommand::Toggle);
        assert_eq!(regs.omr.read(), (1 << 19) | (1 << 3));
        regs.omr.write(0);
    }

    #[test]
    fn pin_state_reads_the_input_register() {
        let _guard = sim::lock();
        let regs = port(2).unwrap();
        regs.input.write(1 << 9);
        assert!(pin_state(2, 9));
        assert!(!pin_state(2, 8));
        regs.input.write(0);
    }

    #[test]
    fn out_of_range_pins_and_ports_are_no_ops() {
        let _guard = sim::lock();
        assert!(port(spec::NB_PORTS).is_none());
        set_pin(spec::NB_PORTS, 0, PinCommand::Set);
        set_pin(0, 16, PinCommand::Set);
        assert!(!pin_state(spec::NB_PORTS, 0));
        assert!(!pin_state(0, 16));
    }
}
