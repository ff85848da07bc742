//! # Boot-Mode Headers
//!
//! After reset the boot firmware scans fixed flash locations for a valid
//! boot-mode header before it lets the reset core run: the header names
//! the user-code start address, carries the boot-mode index, and protects
//! both behind a checksum pair (value plus bitwise inverse) and a fixed
//! confirmation code. Four header slots exist, each with an original and
//! a copy location.
//!
//! Header construction and its self-consistency rules are ordinary
//! arithmetic and fully testable; only the placement into the `.bmhd_*`
//! sections is a link-time concern.

use bitflags::bitflags;

// ============================================================================
// Constants
// ============================================================================

/// Identification code every valid header carries.
pub const BMHD_ID: u16 = 0xB359;

/// Fixed confirmation code at the end of the header.
pub const CONFIRMATION_CODE: u32 = 0x4321_1234;

/// Default user-code start address (first program flash bank).
pub const DEFAULT_START_ADDRESS: u32 = 0xA000_0000;

bitflags! {
    /// Boot-mode index: how the firmware starts the part.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BootModeIndex: u16 {
        /// Ignore the hardware configuration pins.
        const PIN_DISABLE     = 1 << 0;
        /// Start from internal flash.
        const START_INTERNAL  = 1 << 1;
        /// The mode field of this header is valid.
        const MODE_VALID      = 1 << 2;
        /// Lockstep enable, core pair 0.
        const LOCKSTEP_CORE0  = 1 << 3;
        /// Lockstep enable, core pair 1.
        const LOCKSTEP_CORE1  = 1 << 4;
        /// Lockstep enable, core pair 2.
        const LOCKSTEP_CORE2  = 1 << 5;
        /// Run the logic BIST before releasing the reset core.
        const LBIST_ENABLE    = 1 << 6;
    }
}

impl BootModeIndex {
    /// The shipping configuration: internal start, all lockstep pairs
    /// on, LBIST off.
    pub const APPLICATION: Self = Self::START_INTERNAL
        .union(Self::MODE_VALID)
        .union(Self::LOCKSTEP_CORE0)
        .union(Self::LOCKSTEP_CORE1)
        .union(Self::LOCKSTEP_CORE2);
}

// ============================================================================
// Header structure
// ============================================================================

/// The flash-resident boot-mode header; layout is fixed by the boot
/// firmware (confirmation code at offset 0x1F0).
#[repr(C)]
pub struct BootModeHeader {
    /// Boot-mode index.
    pub bmi: u16,
    /// Header identification ([`BMHD_ID`]).
    pub bmhdid: u16,
    /// User-code start address.
    pub stad: u32,
    /// Check result over the first eight bytes.
    pub crc: u32,
    /// Bitwise inverse of [`Self::crc`].
    pub crc_inv: u32,
    /// Reserved up to offset 0x1F0.
    pub reserved: [u32; 120],
    /// Fixed confirmation code ([`CONFIRMATION_CODE`]).
    pub confirmation: u32,
}

impl BootModeHeader {
    /// Build a header for a start address and boot mode; the checksum
    /// pair is derived from the leading eight bytes.
    pub const fn new(stad: u32, bmi: BootModeIndex) -> Self {
        let bmi = bmi.bits();
        let head = [
            bmi as u8,
            (bmi >> 8) as u8,
            BMHD_ID as u8,
            (BMHD_ID >> 8) as u8,
            stad as u8,
            (stad >> 8) as u8,
            (stad >> 16) as u8,
            (stad >> 24) as u8,
        ];
        let crc = crc32(&head);

        Self {
            bmi,
            bmhdid: BMHD_ID,
            stad,
            crc,
            crc_inv: !crc,
            reserved: [0; 120],
            confirmation: CONFIRMATION_CODE,
        }
    }

    /// The header the application images ship with.
    pub const fn application() -> Self {
        Self::new(DEFAULT_START_ADDRESS, BootModeIndex::APPLICATION)
    }

    /// Whether the checksum pair and codes are self-consistent.
    pub const fn is_valid(&self) -> bool {
        self.bmhdid == BMHD_ID
            && self.confirmation == CONFIRMATION_CODE
            && self.crc ^ self.crc_inv == u32::MAX
    }
}

// ============================================================================
// Checksum
// ============================================================================

/// CRC-32 (IEEE, reflected) over a byte slice.
pub const fn crc32(bytes: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;

    let mut crc = u32::MAX;
    let mut i = 0;
    while i < bytes.len() {
        crc ^= bytes[i] as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        i += 1;
    }
    !crc
}

// ============================================================================
// Flash images
// ============================================================================

// The boot firmware reads the headers from fixed locations; the linker
// script maps each .bmhd_* section there.
#[cfg(target_arch = "tricore")]
mod images {
    use super::BootModeHeader;

    #[used]
    #[link_section = ".bmhd_0_orig"]
    static BMHD_0_ORIG: BootModeHeader = BootModeHeader::application();

    #[used]
    #[link_section = ".bmhd_1_orig"]
    static BMHD_1_ORIG: BootModeHeader = BootModeHeader::application();

    #[used]
    #[link_section = ".bmhd_0_copy"]
    static BMHD_0_COPY: BootModeHeader = BootModeHeader::application();

    #[used]
    #[link_section = ".bmhd_1_copy"]
    static BMHD_1_COPY: BootModeHeader = BootModeHeader::application();
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{offset_of, size_of};

    #[test]
    fn header_is_self_consistent() {
        let header = BootModeHeader::application();
        assert!(header.is_valid());
        assert_eq!(header.stad, DEFAULT_START_ADDRESS);
        assert_eq!(header.crc ^ header.crc_inv, u32::MAX);
    }

    #[test]
    fn layout_matches_the_firmware_contract() {
        assert_eq!(offset_of!(BootModeHeader, stad), 0x4);
        assert_eq!(offset_of!(BootModeHeader, confirmation), 0x1F0);
        assert_eq!(size_of::<BootModeHeader>(), 0x1F4);
    }

    #[test]
    fn checksum_is_deterministic_and_input_sensitive() {
        let a = BootModeHeader::new(0xA000_0000, BootModeIndex::APPLICATION);
        let b = BootModeHeader::new(0xA000_0000, BootModeIndex::APPLICATION);
        let c = BootModeHeader::new(0xA010_0000, BootModeIndex::APPLICATION);
        assert_eq!(a.crc, b.crc);
        assert_ne!(a.crc, c.crc);
    }

    #[test]
    fn crc32_known_vector() {
        // The classic check value for "123456789".
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn application_mode_bits() {
        // Internal start, mode valid, three lockstep pairs: 0x3E.
        assert_eq!(BootModeIndex::APPLICATION.bits(), 0x003E);
    }
}
