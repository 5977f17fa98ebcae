//! Flash device descriptor types

use core::fmt;

use super::protocol::DeviceProtocol;
use crate::bus::{
    AddressSize, ClockMode, EraseInstruction, ExitContinuousInstruction, OpcodeLen,
    PageProgramInstruction, ReadInstruction, ReadStatusInstruction, SuspendResumeInstruction,
    WriteEnableInstruction,
};

/// JEDEC identification bytes, in the order the device sends them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JedecId {
    /// Manufacturer ID
    pub manufacturer: u8,
    /// Memory type
    pub device_type: u8,
    /// Capacity/density code
    pub density: u8,
}

impl JedecId {
    /// Create a JEDEC ID from its three bytes
    pub const fn new(manufacturer: u8, device_type: u8, density: u8) -> Self {
        Self {
            manufacturer,
            device_type,
            density,
        }
    }

    /// Build from the raw bytes read after RDID
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Returns the raw bytes in wire order
    pub const fn to_bytes(&self) -> [u8; 3] {
        [self.manufacturer, self.device_type, self.density]
    }

    /// Whether the manufacturer byte looks like a real device
    ///
    /// A floating bus reads 0xFF and a shorted one 0x00; no JEDEC
    /// manufacturer uses either code.
    pub const fn is_valid(&self) -> bool {
        self.manufacturer != 0xFF && self.manufacturer != 0x00
    }
}

impl fmt::Display for JedecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X} {:02X} {:02X}",
            self.manufacturer, self.device_type, self.density
        )
    }
}

/// JEDEC ID pattern stored in the device table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JedecMatch {
    /// Expected ID
    pub id: JedecId,
    /// Mask applied to the density byte read from the device
    pub density_mask: u8,
}

impl JedecMatch {
    /// Pattern matching `id` exactly
    pub const fn exact(id: JedecId) -> Self {
        Self {
            id,
            density_mask: 0xFF,
        }
    }

    /// Check an ID read from the device against this pattern
    ///
    /// Manufacturer and type must be equal; the density byte only has to
    /// keep its expected value once masked.
    pub const fn matches(&self, read: &JedecId) -> bool {
        self.id.manufacturer == read.manufacturer
            && self.id.device_type == read.device_type
            && (read.density & self.density_mask) == self.id.density
    }
}

/// Device timing requirements, in microseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlashDelays {
    /// Time the device needs after a software reset
    pub reset_us: u32,
    /// Time to enter deep power-down
    pub power_down_us: u32,
    /// Time to leave deep power-down
    pub release_power_down_us: u32,
    /// Time from power-on to the first command
    pub power_up_us: u32,
}

/// Everything the driver needs to know about one flash part
///
/// Instances are compile-time constants. The active configuration of a
/// controller is either one of them or a copy of a device table entry.
#[derive(Clone, Copy)]
pub struct FlashDeviceConfig {
    /// Part name
    pub name: &'static str,
    /// Vendor name
    pub vendor: &'static str,
    /// JEDEC ID pattern
    pub jedec: JedecMatch,
    /// Density in bits
    pub size_bits: u32,
    /// Address width
    pub address_size: AddressSize,
    /// Clock polarity the part needs
    pub clock_mode: ClockMode,
    /// Opcode phase length in octal mode
    pub opcode_len: OpcodeLen,
    /// Auto mode read instruction
    pub read: ReadInstruction,
    /// Sector erase instruction
    pub erase: EraseInstruction,
    /// Read status instruction
    pub read_status: ReadStatusInstruction,
    /// Write enable instruction
    pub write_enable: WriteEnableInstruction,
    /// Page program instruction
    pub page_program: PageProgramInstruction,
    /// Suspend/resume instructions
    pub suspend_resume: SuspendResumeInstruction,
    /// Continuous read exit sequence
    pub exit_continuous: ExitContinuousInstruction,
    /// Timing requirements
    pub delays: FlashDelays,
    /// Device specific command sequences
    pub protocol: &'static dyn DeviceProtocol,
    /// Background operations must be resumed before status registers change
    pub resume_before_writing_regs: bool,
}

impl FlashDeviceConfig {
    /// Size of the device in bytes
    pub const fn size_bytes(&self) -> u32 {
        self.size_bits / 8
    }
}

impl fmt::Debug for FlashDeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlashDeviceConfig")
            .field("name", &self.name)
            .field("vendor", &self.vendor)
            .field("jedec", &self.jedec)
            .field("size_bits", &self.size_bits)
            .field("address_size", &self.address_size)
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::format;

    #[test]
    fn test_jedec_validity() {
        assert!(JedecId::new(0xEF, 0x80, 0x17).is_valid());
        assert!(!JedecId::new(0xFF, 0xFF, 0xFF).is_valid());
        assert!(!JedecId::new(0x00, 0x00, 0x00).is_valid());
    }

    #[test]
    fn test_jedec_density_mask() {
        let pattern = JedecMatch {
            id: JedecId::new(0xC2, 0x25, 0x37),
            density_mask: 0x3F,
        };
        assert!(pattern.matches(&JedecId::new(0xC2, 0x25, 0x37)));
        // Upper density bits are masked off
        assert!(pattern.matches(&JedecId::new(0xC2, 0x25, 0xF7)));
        assert!(!pattern.matches(&JedecId::new(0xC2, 0x25, 0x38)));
        assert!(!pattern.matches(&JedecId::new(0xC2, 0x26, 0x37)));
    }

    #[test]
    fn test_jedec_display() {
        let id = JedecId::from_bytes([0x1F, 0x43, 0x17]);
        assert_eq!(format!("{}", id), "1F 43 17");
    }
}
