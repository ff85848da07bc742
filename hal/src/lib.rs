//! # TC3xx Hardware Layer
//!
//! Low-level support for AURIX TC3xx-class multicore automotive
//! microcontrollers: clock tree bring-up, per-core interrupt dispatch,
//! GPIO, system timers, and secondary-core release.
//!
//! ## Components
//!
//! - **cpu**: core identification, interrupt state, cache control
//! - **interrupts**: per-core vector tables, handler registration, dispatch
//! - **scu**: watchdogs, ENDINIT protection, oscillator, PLLs, clock dividers
//! - **stm**: per-core system timer channels
//! - **port**: pin configuration and GPIO
//! - **flash**: flash controller wait states
//! - **smp**: releasing secondary cores from boot halt
//! - **qspi**: minimal QSPI transmit path (board power-IC commands)
//! - **bmhd**: boot-mode headers read by the boot firmware
//!
//! ## Host builds
//!
//! On anything other than the TriCore target the hardware seams (core
//! special-function registers, peripheral base addresses) are backed by an
//! in-memory register model (see [`sim`]), so drivers and the dispatch
//! logic can be exercised by ordinary unit tests.
//!
//! ## Derivative selection
//!
//! The `tc38x` feature (default) configures four cores; `tc39x` configures
//! six. Family constants live in [`family`].

#![no_std]

pub mod bmhd;
pub mod cpu;
pub mod family;
pub mod flash;
pub mod interrupts;
pub mod mmio;
pub mod port;
pub mod qspi;
pub mod scu;
pub mod smp;
pub mod stm;

#[cfg(not(target_arch = "tricore"))]
pub mod sim;

pub use cpu::CoreId;
pub use interrupts::{init_current_core, register_handler, IsrHandler, MAX_VECTORS};
