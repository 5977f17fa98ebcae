//! SPI25 register command sequences
//!
//! These helpers frame the common JEDEC register commands with chip select
//! and push them through an [`OqspiBus`] in Manual mode. They use whatever
//! manual bus mode the caller selected and never touch the access mode, so
//! the controller stays in charge of Auto/Manual transitions.
//!
//! None of the loops here are bounded: a device that never clears WIP or
//! never sets WEL hangs the caller, exactly like the hardware would.

use crate::bus::{opcodes, BusyLevel, OqspiBus, ReadStatusInstruction};
use crate::chip::JedecId;
use crate::error::{Error, Result};

/// Send a single-byte command with no address or data
pub fn command<B: OqspiBus + ?Sized>(bus: &mut B, opcode: u8) {
    bus.cs_enable();
    bus.write8(opcode);
    bus.cs_disable();
}

/// Read a one-byte register
pub fn read_register<B: OqspiBus + ?Sized>(bus: &mut B, opcode: u8) -> u8 {
    bus.cs_enable();
    bus.write8(opcode);
    let value = bus.read8();
    bus.cs_disable();
    value
}

/// Write register bytes following `opcode` in one transaction
pub fn write_register<B: OqspiBus + ?Sized>(bus: &mut B, opcode: u8, data: &[u8]) {
    bus.cs_enable();
    bus.write8(opcode);
    for &byte in data {
        bus.write8(byte);
    }
    bus.cs_disable();
}

/// Read the status register 1
pub fn read_status1<B: OqspiBus + ?Sized>(bus: &mut B) -> u8 {
    read_register(bus, opcodes::RDSR)
}

/// Read the status register 2
pub fn read_status2<B: OqspiBus + ?Sized>(bus: &mut B) -> u8 {
    read_register(bus, opcodes::RDSR2)
}

/// Check the busy flag described by a read status instruction
pub fn is_busy<B: OqspiBus + ?Sized>(bus: &mut B, instr: &ReadStatusInstruction) -> bool {
    let status = read_register(bus, instr.opcode);
    let bit = (status >> instr.busy_bit) & 1 != 0;
    match instr.busy_level {
        BusyLevel::High => bit,
        BusyLevel::Low => !bit,
    }
}

/// Wait for the WIP (Write In Progress) bit to clear
pub fn wait_ready<B: OqspiBus + ?Sized>(bus: &mut B) {
    while read_status1(bus) & opcodes::SR1_WIP != 0 {}
}

/// Send WREN until the Write Enable Latch reads back set
pub fn write_enable<B: OqspiBus + ?Sized>(bus: &mut B) {
    loop {
        command(bus, opcodes::WREN);
        let status = loop {
            let status = read_status1(bus);
            if status & opcodes::SR1_WIP == 0 {
                break status;
            }
        };
        if status & opcodes::SR1_WEL != 0 {
            return;
        }
    }
}

/// Read the JEDEC ID
///
/// The alternate form clocks three zero bytes after the opcode, which some
/// parts coming out of an unknown mode need before they answer.
pub fn read_jedec_id<B: OqspiBus + ?Sized>(bus: &mut B, alternate: bool) -> JedecId {
    bus.cs_enable();
    if alternate {
        bus.write32(u32::from(opcodes::RDID) << 24);
    } else {
        bus.write8(opcodes::RDID);
    }
    let mut bytes = [0u8; 3];
    for byte in bytes.iter_mut() {
        *byte = bus.read8();
    }
    bus.cs_disable();
    JedecId::from_bytes(bytes)
}

/// Issue the 0x66/0x99 software reset pair
pub fn software_reset<B: OqspiBus + ?Sized>(bus: &mut B) {
    command(bus, opcodes::RSTEN);
    command(bus, opcodes::RST);
}

// ============================================================================
// Quad Enable
// ============================================================================

/// Location of the Quad Enable bit and how to write it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadEnableMethod {
    /// QE is bit 1 of SR2, written with the dedicated 0x31 command
    Sr2Bit1WriteSr2,
    /// QE is bit 6 of SR1; WRSR also carries the configuration register
    Sr1Bit6WithCr {
        /// Opcode reading the configuration register
        read_cr_opcode: u8,
    },
}

/// Status Register 1 QE bit used by Macronix parts
pub const SR1_QE_BIT6: u8 = 0x40;

/// Write SR2 directly using opcode 0x31, then wait and verify
pub fn write_status2_verified<B: OqspiBus + ?Sized>(bus: &mut B, value: u8) -> Result<()> {
    write_enable(bus);
    write_register(bus, opcodes::WRSR2, &[value]);
    wait_ready(bus);
    if read_status2(bus) != value {
        log::warn!("SR2 write verify failed: wrote 0x{:02X}", value);
        return Err(Error::RegisterVerifyFailed);
    }
    Ok(())
}

/// Write SR1 and a second register with one WRSR, then wait and verify SR1
///
/// The pair is shifted as a single big-endian word after the opcode.
pub fn write_status_pair_verified<B: OqspiBus + ?Sized>(
    bus: &mut B,
    sr1: u8,
    second: u8,
) -> Result<()> {
    write_enable(bus);
    bus.cs_enable();
    bus.write8(opcodes::WRSR);
    bus.write16(u16::from_be_bytes([sr1, second]));
    bus.cs_disable();
    wait_ready(bus);
    // WEL/WIP are volatile, only compare the non-volatile bits
    let mask = !(opcodes::SR1_WIP | opcodes::SR1_WEL);
    if read_status1(bus) & mask != sr1 & mask {
        log::warn!("SR1 write verify failed: wrote 0x{:02X}", sr1);
        return Err(Error::RegisterVerifyFailed);
    }
    Ok(())
}

/// Enable quad mode using the appropriate method for the chip
pub fn enable_quad_mode<B: OqspiBus + ?Sized>(bus: &mut B, method: QuadEnableMethod) -> Result<()> {
    match method {
        QuadEnableMethod::Sr2Bit1WriteSr2 => {
            let sr2 = read_status2(bus);
            if sr2 & opcodes::SR2_QE != 0 {
                return Ok(()); // Already enabled
            }
            write_status2_verified(bus, sr2 | opcodes::SR2_QE)
        }
        QuadEnableMethod::Sr1Bit6WithCr { read_cr_opcode } => {
            let sr1 = read_status1(bus);
            if sr1 & SR1_QE_BIT6 != 0 {
                return Ok(()); // Already enabled
            }
            let cr = read_register(bus, read_cr_opcode);
            write_status_pair_verified(bus, sr1 | SR1_QE_BIT6, cr)
        }
    }
}

/// Check if quad mode is enabled
pub fn is_quad_enabled<B: OqspiBus + ?Sized>(bus: &mut B, method: QuadEnableMethod) -> bool {
    match method {
        QuadEnableMethod::Sr2Bit1WriteSr2 => read_status2(bus) & opcodes::SR2_QE != 0,
        QuadEnableMethod::Sr1Bit6WithCr { .. } => read_status1(bus) & SR1_QE_BIT6 != 0,
    }
}
