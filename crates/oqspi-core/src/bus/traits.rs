//! Bus transport trait definitions
//!
//! The OQSPI controller is a memory-mapped peripheral with two personalities:
//! in Auto mode it translates CPU reads of the mapped window into flash read
//! instructions, in Manual mode software drives chip select and pushes raw
//! words through the data register. [`OqspiBus`] is the thin register-level
//! surface the driver needs from either a real controller or an emulator.

use super::instruction::{
    EraseInstruction, ExitContinuousInstruction, ReadInstruction, ReadStatusInstruction,
    SuspendResumeInstruction, WriteEnableInstruction,
};
use super::{AccessMode, AddressSize, BusMode, ClockDivider, ClockMode, OpcodeLen, SysClock};
use bitflags::bitflags;

bitflags! {
    /// OQSPI controller feature flags
    ///
    /// These flags indicate what the controller instance is wired for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BusFeatures: u32 {
        /// IO4-IO7 are routed to the controller (octal bus available)
        const OCTA_PINS  = 1 << 0;
        /// Controller can run a sector erase on its own in Auto mode
        const AUTO_ERASE = 1 << 1;
    }
}

impl Default for BusFeatures {
    fn default() -> Self {
        BusFeatures::empty()
    }
}

/// Controller-wide setup applied by [`OqspiBus::init`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerSetup {
    /// Address width of flash instructions
    pub address_size: AddressSize,
    /// Clock polarity
    pub clock_mode: ClockMode,
    /// Bus clock divider
    pub clock_divider: ClockDivider,
    /// Opcode phase length
    pub opcode_len: OpcodeLen,
    /// Read pipe clock delay
    pub read_pipe_delay: u8,
    /// Auto mode read instruction
    pub read: ReadInstruction,
    /// Dummy bytes of the read instruction
    pub dummy_bytes: u8,
}

impl ControllerSetup {
    /// Conservative setup every serial NOR part accepts after reset
    ///
    /// Single bus for every phase, 24-bit address, plain 0x03 read and no
    /// clock division, so the device can be identified before its
    /// configuration is known.
    pub const PRELIMINARY: Self = Self {
        address_size: AddressSize::ThreeByte,
        clock_mode: ClockMode::Low,
        clock_divider: ClockDivider::Div1,
        opcode_len: OpcodeLen::OneByte,
        read_pipe_delay: super::READ_PIPE_DELAY_0V9,
        read: ReadInstruction::SINGLE,
        dummy_bytes: 0,
    };
}

/// OQSPI bus transport
///
/// Implementations expose the raw controller. None of these primitives can
/// fail: the hardware has no error reporting for manual transfers, so the
/// driver's retry loops work purely on status register contents.
///
/// ## Manual transfers
///
/// In Manual mode a transaction is framed by [`cs_enable`](Self::cs_enable)
/// and [`cs_disable`](Self::cs_disable). Every `write*`/`read*` call shifts
/// its bytes MSB first on the number of lines last selected with
/// [`set_manual_bus_mode`](Self::set_manual_bus_mode).
///
/// ## Interrupt masking
///
/// Switching access modes while code executes from the mapped window is
/// only safe with interrupts masked. [`disable_interrupts`](Self::disable_interrupts)
/// returns the previous mask state so that nested sections restore it exactly.
pub trait OqspiBus {
    /// Get the features of this controller instance
    fn features(&self) -> BusFeatures;

    /// Apply the controller-wide setup and the Auto mode read instruction
    fn init(&mut self, setup: &ControllerSetup);

    // Manual mode transfers

    /// Assert chip select
    fn cs_enable(&mut self);
    /// Release chip select
    fn cs_disable(&mut self);
    /// Shift out one byte
    fn write8(&mut self, value: u8);
    /// Shift out two bytes, MSB first
    fn write16(&mut self, value: u16);
    /// Shift out four bytes, MSB first
    fn write32(&mut self, value: u32);
    /// Shift in one byte
    fn read8(&mut self) -> u8;

    // Mode control

    /// Get the current access mode
    fn access_mode(&self) -> AccessMode;
    /// Switch the access mode
    fn set_access_mode(&mut self, mode: AccessMode);
    /// Select the number of lines used by manual transfers
    fn set_manual_bus_mode(&mut self, mode: BusMode);
    /// Set the IO pin direction for `mode`
    fn set_io(&mut self, mode: BusMode);

    // Clocking

    /// Get the bus clock divider
    fn clock_divider(&self) -> ClockDivider;
    /// Set the bus clock divider
    fn set_clock_divider(&mut self, divider: ClockDivider);
    /// Set the read pipe clock delay
    fn set_read_pipe_delay(&mut self, delay: u8);
    /// Set the dummy bytes of the Auto mode read instruction
    fn set_dummy_bytes(&mut self, count: u8);
    /// Get the system clock feeding the controller
    fn system_clock(&self) -> SysClock;
    /// Ungate the controller clock
    fn clock_enable(&mut self);
    /// Gate the controller clock
    fn clock_disable(&mut self);

    // Instruction registers

    /// Program the read status instruction used by the controller
    fn set_read_status_instruction(&mut self, instr: &ReadStatusInstruction);
    /// Program the write enable instruction used by the controller
    fn set_write_enable_instruction(&mut self, instr: &WriteEnableInstruction);
    /// Program the auto-erase instruction and its continuous mode exit sequence
    fn set_erase_instruction(
        &mut self,
        instr: &EraseInstruction,
        exit_continuous: &ExitContinuousInstruction,
    );
    /// Program the suspend/resume instructions used by the controller
    fn set_suspend_resume_instruction(&mut self, instr: &SuspendResumeInstruction);

    // Auto-erase engine

    /// Start a hardware sector erase at `addr`
    ///
    /// Only meaningful when [`BusFeatures::AUTO_ERASE`] is reported.
    fn start_auto_erase(&mut self, addr: u32);
    /// Returns true while the hardware erase is running
    fn erase_in_progress(&mut self) -> bool;

    // Memory-mapped window

    /// Copy from the mapped window at flash offset `addr`
    ///
    /// Only valid in Auto mode.
    fn read_mapped(&mut self, addr: u32, buf: &mut [u8]);

    // System

    /// Mask interrupts, returning whether they were enabled before
    fn disable_interrupts(&mut self) -> bool;
    /// Restore the interrupt mask saved by [`disable_interrupts`](Self::disable_interrupts)
    fn restore_interrupts(&mut self, was_enabled: bool);
    /// Returns true if an interrupt is pending
    fn irq_pending(&self) -> bool;
    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}
