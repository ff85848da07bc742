//! # Multicore Blink
//!
//! The reference application for the BSP: every core toggles its own LED
//! from a periodic STM interrupt, with a period proportional to its core
//! id - four LEDs blinking at 250/500/750/1000 ms show all cores alive
//! and dispatching independently.
//!
//! ## Startup shape
//!
//! The runtime startup code calls [`pre_init_hook`] before memory
//! initialization and [`post_init_hook`] just before entering
//! [`shared_main`]; all three are shared by every core, branching on the
//! core id where the reset core has extra duties:
//!
//! 1. reset core: safety watchdog off, clocks up, board watchdog
//!    disarmed, LEDs off, release the other cores;
//! 2. every core: own watchdog off, icache on, dispatch initialized,
//!    timer handler attached, interrupts enabled, idle loop.

#![no_std]

use tc3xx_boards as boards;
use tc3xx_hal as hal;

use hal::cpu::CoreId;

// ============================================================================
// Timing
// ============================================================================

/// Base period: 250 ms in STM ticks; core `n` blinks at `(n + 1)` times
/// this.
pub const TIMER_BASE_PERIOD: u32 = 250 * hal::family::TICKS_PER_MS;

/// Timer interrupt priority, the same slot on every core.
pub const TIMER_INTERRUPT_PRIO: usize = 10;

/// Blink period of a core in STM ticks.
#[inline]
pub const fn core_period(core: usize) -> u32 {
    (core as u32 + 1) * TIMER_BASE_PERIOD
}

// ============================================================================
// Timer interrupt
// ============================================================================

/// Shared timer ISR: toggle the core's LED, advance the compare target
/// drift-free, acknowledge the interrupt.
pub extern "C" fn timer_isr() {
    let core = CoreId::current().index();

    boards::led_set(core, boards::LedState::Toggle);
    hal::stm::reload_channel(core, core_period(core));
    hal::stm::clear_compare_flag(core);
}

/// Attach the periodic timer to the calling core: register the handler,
/// arm the first compare target from the live counter, route the service
/// request to this core, enable the compare interrupt.
pub fn attach_core_timer() {
    let core = CoreId::current().index();

    hal::register_handler(core, timer_isr, TIMER_INTERRUPT_PRIO);
    hal::stm::reload_channel(core, core_period(core).wrapping_add(hal::stm::count(core)));
    hal::interrupts::route_stm_compare(core, core, TIMER_INTERRUPT_PRIO as u32);
    hal::stm::enable_compare_interrupt(core);
}

// ============================================================================
// Startup hooks
// ============================================================================

/// Runtime hook before memory clear/copy; global data is not usable yet.
pub fn pre_init_hook() {
    let core = CoreId::current();

    if core.is_reset_core() {
        hal::scu::wdt::disable_safety_watchdog();
    }
    hal::scu::wdt::disable_cpu_watchdog();
    hal::cpu::enable_icache();
}

/// Runtime hook after runtime initialization, before [`shared_main`].
///
/// The reset core initializes the shared hardware and releases the other
/// cores; every core then wires its own interrupt dispatch.
pub fn post_init_hook() {
    let core = CoreId::current();

    if core.is_reset_core() {
        if let Err(err) = hal::scu::init_clock(boards::board().xtal_mhz) {
            // Keep running on the backup clock; the blink is just slow.
            log::error!("clock bring-up failed: {err:?}");
        }

        boards::disable_external_watchdog();
        boards::led_init_all(boards::LedState::Off);
        hal::smp::start_all_cores(shared_entry);
    }

    hal::interrupts::init_current_core();
}

/// Entry point released cores start at; the reset core arrives here from
/// the runtime startup path instead.
pub extern "C" fn shared_entry() -> ! {
    pre_init_hook();
    post_init_hook();
    shared_main()
}

/// Shared main: attach the timer, enable interrupt taking, idle - all
/// activity happens in the periodic interrupts.
pub fn shared_main() -> ! {
    attach_core_timer();
    hal::cpu::enable_interrupts();

    loop {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc3xx_hal::sim;

    #[test]
    fn periods_scale_with_the_core_id() {
        assert_eq!(core_period(0), 25_000_000);
        assert_eq!(core_period(3), 100_000_000);
    }

    #[test]
    fn attach_wires_handler_timer_and_routing() {
        let _guard = sim::lock();
        sim::set_current_core(2);
        hal::interrupts::init_current_core();

        attach_core_timer();

        assert!(!hal::interrupts::is_default(2, TIMER_INTERRUPT_PRIO));
        // First compare target = period (counter is at zero).
        let stm = hal::stm::channel(2).unwrap();
        assert_eq!(stm.cmp[0].read(), core_period(2));
        assert!(stm.icr.is_set(hal::stm::ICR_CMP0EN));
        // Service request routed to this core at the timer priority.
        let node = &hal::interrupts::src_router::regs().stm[2].sr[0];
        assert_eq!(
            node.field(
                hal::interrupts::src_router::SRC_SRPN_MASK,
                hal::interrupts::src_router::SRC_SRPN_SHIFT
            ),
            TIMER_INTERRUPT_PRIO as u32
        );

        // Cleanup.
        stm.cmp[0].write(0);
        stm.icr.write(0);
        stm.cmcon.write(0);
        stm.iscr.write(0);
        node.write(0);
        sim::set_current_core(0);
    }

    #[test]
    fn timer_interrupt_toggles_and_rearms() {
        let _guard = sim::lock();
        sim::set_current_core(1);
        hal::interrupts::init_current_core();
        attach_core_timer();

        let led = tc3xx_boards::board().leds[1];
        let omr = &tc3xx_hal::port::port(led.port).unwrap().omr;
        omr.write(0);
        let stm = hal::stm::channel(1).unwrap();
        let armed = stm.cmp[0].read();

        hal::interrupts::dispatch(1, TIMER_INTERRUPT_PRIO);

        // LED toggled...
        assert_eq!(omr.read(), (1 << (led.pin + 16)) | (1 << led.pin));
        // ...compare target advanced by one period...
        assert_eq!(stm.cmp[0].read(), armed.wrapping_add(core_period(1)));
        // ...and the flag acknowledged.
        assert!(stm.iscr.is_set(tc3xx_hal::stm::ISCR_CMP0IRR));

        // Cleanup.
        omr.write(0);
        stm.cmp[0].write(0);
        stm.icr.write(0);
        stm.cmcon.write(0);
        stm.iscr.write(0);
        hal::interrupts::src_router::regs().stm[1].sr[0].write(0);
        sim::set_current_core(0);
    }
}
