//! Per-instruction bus configuration
//!
//! Each flash instruction class has its own opcode and its own bus mode per
//! phase. These descriptors are shared by the device tables (what a part
//! expects) and by the controller setup (what the hardware is programmed with).

use super::BusMode;
use super::opcodes;

/// Level of the busy bit that means "operation in progress"
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BusyLevel {
    /// Busy when the bit reads 0
    Low,
    /// Busy when the bit reads 1
    #[default]
    High,
}

/// Memory-mapped read instruction used in Auto mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadInstruction {
    /// Read opcode
    pub opcode: u8,
    /// Bus mode of the opcode phase
    pub opcode_bus_mode: BusMode,
    /// Bus mode of the address phase
    pub addr_bus_mode: BusMode,
    /// Bus mode of the extra (mode) byte phase
    pub extra_byte_bus_mode: BusMode,
    /// Bus mode of the dummy phase
    pub dummy_bus_mode: BusMode,
    /// Bus mode of the data phase
    pub data_bus_mode: BusMode,
    /// Device stays in continuous (opcode-less) read mode between bursts
    pub continuous_mode: bool,
    /// Mode byte sent after the address, if any
    pub extra_byte: Option<u8>,
    /// Minimum chip-select idle time between reads
    pub cs_idle_delay_ns: u16,
}

impl ReadInstruction {
    /// Plain 0x03 read on a single line, valid for every serial NOR part
    pub const SINGLE: Self = Self {
        opcode: opcodes::READ,
        opcode_bus_mode: BusMode::Single,
        addr_bus_mode: BusMode::Single,
        extra_byte_bus_mode: BusMode::Single,
        dummy_bus_mode: BusMode::Single,
        data_bus_mode: BusMode::Single,
        continuous_mode: false,
        extra_byte: None,
        cs_idle_delay_ns: 10,
    };

    /// Fast Read Quad I/O (1-4-4) with a continuous-mode byte
    pub const fn quad_io_continuous(extra_byte: u8, cs_idle_delay_ns: u16) -> Self {
        Self {
            opcode: opcodes::QIOR,
            opcode_bus_mode: BusMode::Single,
            addr_bus_mode: BusMode::Quad,
            extra_byte_bus_mode: BusMode::Quad,
            dummy_bus_mode: BusMode::Quad,
            data_bus_mode: BusMode::Quad,
            continuous_mode: true,
            extra_byte: Some(extra_byte),
            cs_idle_delay_ns,
        }
    }
}

/// Sector erase instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EraseInstruction {
    /// Erase opcode
    pub opcode: u8,
    /// Bus mode of the opcode phase
    pub opcode_bus_mode: BusMode,
    /// Bus mode of the address phase
    pub addr_bus_mode: BusMode,
    /// Bus clock cycles between erase and status polling in auto-erase mode
    pub hclk_cycles: u8,
    /// Minimum chip-select idle time after the erase command
    pub cs_idle_delay_ns: u16,
}

impl EraseInstruction {
    /// 4KB sector erase on a single line
    pub const fn sector_single(cs_idle_delay_ns: u16) -> Self {
        Self {
            opcode: opcodes::SE_20,
            opcode_bus_mode: BusMode::Single,
            addr_bus_mode: BusMode::Single,
            hclk_cycles: 0,
            cs_idle_delay_ns,
        }
    }
}

/// Read status register instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadStatusInstruction {
    /// Read status opcode
    pub opcode: u8,
    /// Bus mode of the opcode phase
    pub opcode_bus_mode: BusMode,
    /// Bus mode of the receive phase
    pub receive_bus_mode: BusMode,
    /// Bus mode of the dummy phase
    pub dummy_bus_mode: BusMode,
    /// Number of dummy bytes before the status byte
    pub dummy_bytes: u8,
    /// Bit position of the busy flag
    pub busy_bit: u8,
    /// Level of the busy flag that means busy
    pub busy_level: BusyLevel,
    /// Minimum delay between consecutive status reads
    pub delay_ns: u16,
}

impl ReadStatusInstruction {
    /// RDSR on a single line, busy on bit 0 active high
    pub const fn single(delay_ns: u16) -> Self {
        Self {
            opcode: opcodes::RDSR,
            opcode_bus_mode: BusMode::Single,
            receive_bus_mode: BusMode::Single,
            dummy_bus_mode: BusMode::Single,
            dummy_bytes: 0,
            busy_bit: 0,
            busy_level: BusyLevel::High,
            delay_ns,
        }
    }
}

/// Write enable instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteEnableInstruction {
    /// Write enable opcode
    pub opcode: u8,
    /// Bus mode of the opcode phase
    pub opcode_bus_mode: BusMode,
}

impl WriteEnableInstruction {
    /// WREN on a single line
    pub const SINGLE: Self = Self {
        opcode: opcodes::WREN,
        opcode_bus_mode: BusMode::Single,
    };
}

/// Page program instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageProgramInstruction {
    /// Page program opcode
    pub opcode: u8,
    /// Bus mode of the opcode phase
    pub opcode_bus_mode: BusMode,
    /// Bus mode of the address phase
    pub addr_bus_mode: BusMode,
    /// Bus mode of the data phase
    pub data_bus_mode: BusMode,
}

/// Program/erase suspend and resume instructions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuspendResumeInstruction {
    /// Suspend opcode
    pub suspend_opcode: u8,
    /// Resume opcode
    pub resume_opcode: u8,
    /// Bus mode of the suspend opcode
    pub suspend_bus_mode: BusMode,
    /// Bus mode of the resume opcode
    pub resume_bus_mode: BusMode,
    /// Time for the suspend flag to become valid
    pub suspend_latency_us: u16,
    /// Time for the device to restart the operation after resume
    pub resume_latency_us: u16,
    /// Minimum time between a resume and the next suspend
    pub resume_to_suspend_latency_us: u16,
}

/// Continuous read mode exit instruction, used by the controller's auto-erase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitContinuousInstruction {
    /// Byte shifted in place of the mode byte
    pub opcode: u8,
    /// Bus mode of the sequence
    pub opcode_bus_mode: BusMode,
    /// Number of bytes in the sequence
    pub sequence_len: u8,
    /// Send only the first half of each byte
    pub disable_second_half: bool,
}

impl ExitContinuousInstruction {
    /// Four 0xFF bytes on the quad bus
    pub const QUAD: Self = Self {
        opcode: opcodes::RSTQIO,
        opcode_bus_mode: BusMode::Quad,
        sequence_len: 4,
        disable_second_half: false,
    };
}
