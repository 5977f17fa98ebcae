//! Device specific command sequences
//!
//! Everything the driver cannot express as an opcode in
//! [`FlashDeviceConfig`](super::FlashDeviceConfig) goes through a
//! [`DeviceProtocol`]: where the suspend flag lives, how Quad Enable is set,
//! which dummy cycles a part needs at a given clock. Configurations hold a
//! `&'static dyn DeviceProtocol`, so implementations are unit structs.
//!
//! All methods are called in Manual mode with the bus mode already selected.

use core::fmt;

use crate::bus::{opcodes, BusMode, OqspiBus, ReadStatusInstruction, SysClock};
use crate::error::Result;
use crate::protocol;

/// Device callbacks used by the controller
pub trait DeviceProtocol: fmt::Debug + Sync {
    /// Read the status register
    fn read_status(&self, bus: &mut dyn OqspiBus) -> u8 {
        protocol::read_status1(bus)
    }

    /// Write the status register
    fn write_status(&self, bus: &mut dyn OqspiBus, value: u8) {
        protocol::write_enable(bus);
        protocol::write_register(bus, opcodes::WRSR, &[value]);
        protocol::wait_ready(bus);
    }

    /// Returns true while a program or erase is running
    fn is_busy(&self, bus: &mut dyn OqspiBus, instr: &ReadStatusInstruction) -> bool {
        protocol::is_busy(bus, instr)
    }

    /// Returns true if a program or erase is suspended
    fn is_suspended(&self, bus: &mut dyn OqspiBus) -> bool;

    /// Bring the device into the state the configuration expects
    ///
    /// `mode` is the bus mode the device currently listens on.
    fn initialize(&self, bus: &mut dyn OqspiBus, mode: BusMode, sys_clk: SysClock) -> Result<()> {
        let _ = (bus, mode, sys_clk);
        Ok(())
    }

    /// Dummy bytes of the read instruction at `sys_clk`
    fn dummy_bytes(&self, sys_clk: SysClock) -> u8;

    /// Whether the device's dummy cycle setting depends on the system clock
    ///
    /// If so, [`write_dummy_config`](Self::write_dummy_config) is called
    /// every time the system clock changes.
    fn clock_dependent(&self) -> bool {
        false
    }

    /// Store the dummy cycle setting in the device
    fn write_dummy_config(&self, bus: &mut dyn OqspiBus, dummy_bytes: u8) -> Result<()> {
        let _ = (bus, dummy_bytes);
        Ok(())
    }

    /// Leave QPI mode, returning true if a command was sent
    fn exit_qpi(&self, bus: &mut dyn OqspiBus) -> bool {
        protocol::command(bus, opcodes::RSTQIO);
        true
    }
}

/// Protocol of any JEDEC SPI25 part driven on a single line
///
/// Used by the preliminary configuration before the real device is known,
/// and as the fallback under the Default detection policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericSpi;

impl DeviceProtocol for GenericSpi {
    fn is_suspended(&self, _bus: &mut dyn OqspiBus) -> bool {
        false
    }

    fn dummy_bytes(&self, _sys_clk: SysClock) -> u8 {
        0
    }
}
