//! # TC38x Derivative Specification
//!
//! Four-core member of the TC3xx family. Parameters are taken from the
//! derivative datasheet and reference manual; clock targets are the maximum
//! recommended operating points.

// ============================================================================
// Cores
// ============================================================================

/// Number of core instances.
pub const NB_CORES: usize = 4;

/// Core that leaves reset running; it releases the others.
pub const RESET_CORE: usize = 0;

// ============================================================================
// Nominal clock targets [MHz]
// ============================================================================

/// System PLL output: CPU cores, SRI interconnect, platform clocks.
pub const PLL0_CLOCK_MHZ: u32 = 300;

/// Peripheral PLL first output (fPLL1): high-speed peripherals (QSPI).
pub const PLL1_CLOCK_MHZ: u32 = 320;

/// Peripheral PLL second output (fPLL2).
pub const PLL2_CLOCK_MHZ: u32 = 200;

/// Internal backup oscillator; the fallback source when the crystal or a
/// PLL is unavailable.
pub const BACKUP_CLOCK_MHZ: u32 = 100;

/// SRI interconnect clock.
pub const SRI_CLOCK_MHZ: u32 = 300;

/// SPB peripheral bus clock (datasheet maximum 100 MHz).
pub const SPB_CLOCK_MHZ: u32 = 100;

/// System timer clock; 10 ns resolution without overflowing quickly.
pub const STM_CLOCK_MHZ: u32 = 100;

// ============================================================================
// PLL operating windows [MHz]
// ============================================================================

/// System PLL input clock window.
pub const PLL0_INCLK_MIN_MHZ: u32 = 16;
/// System PLL input clock window.
pub const PLL0_INCLK_MAX_MHZ: u32 = 24;
/// System PLL VCO window.
pub const PLL0_VCO_MIN_MHZ: u32 = 400;
/// System PLL VCO window.
pub const PLL0_VCO_MAX_MHZ: u32 = 800;
/// Recommended system PLL VCO operating point.
pub const PLL0_VCO_REC_MHZ: u32 = 600;

/// Peripheral PLL input clock window.
pub const PLL1_INCLK_MIN_MHZ: u32 = 10;
/// Peripheral PLL input clock window.
pub const PLL1_INCLK_MAX_MHZ: u32 = 24;
/// Peripheral PLL VCO window.
pub const PLL1_VCO_MIN_MHZ: u32 = 400;
/// Peripheral PLL VCO window.
pub const PLL1_VCO_MAX_MHZ: u32 = 800;
/// Recommended peripheral PLL VCO operating point.
pub const PLL1_VCO_REC_MHZ: u32 = 640;

// ============================================================================
// Flash timing [ns]
// ============================================================================

/// Program flash access delay.
pub const PFLASH_ACCESS_NS: u32 = 30;
/// Program flash ECC delay.
pub const PFLASH_ECC_NS: u32 = 10;
/// Data flash access delay.
pub const DFLASH_ACCESS_NS: u32 = 100;
/// Data flash ECC delay.
pub const DFLASH_ECC_NS: u32 = 20;

// ============================================================================
// Memory map (module base addresses)
// ============================================================================

/// System Control Unit.
pub const SCU_BASE: usize = 0xF003_6000;

/// Service Request Controller.
pub const SRC_BASE: usize = 0xF003_8000;

/// First system timer instance; one instance per core at [`STM_STRIDE`].
pub const STM0_BASE: usize = 0xF000_1000;

/// Byte distance between STM instances.
pub const STM_STRIDE: usize = 0x100;

/// First port instance; subsequent ports at [`PORT_STRIDE`].
pub const P00_BASE: usize = 0xF003_A000;

/// Byte distance between port instances.
pub const PORT_STRIDE: usize = 0x100;

/// Highest decoded port index.
pub const NB_PORTS: usize = 34;

/// Flash controller (DMU host interface).
pub const DMU_BASE: usize = 0xF804_0000;

/// First QSPI instance; subsequent instances at [`QSPI_STRIDE`].
pub const QSPI0_BASE: usize = 0xF000_1C00;

/// Byte distance between QSPI instances.
pub const QSPI_STRIDE: usize = 0x100;

/// CPU0 slave-interface register block (PC, SYSCON of remote cores).
pub const CPU0_SFR_BASE: usize = 0xF880_0000;

/// Byte distance between the per-core register blocks.
pub const CPU_SFR_STRIDE: usize = 0x2_0000;
