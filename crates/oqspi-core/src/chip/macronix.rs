//! Macronix quad parts
//!
//! Macronix keeps Quad Enable in SR1 and the dummy cycle setting in the
//! configuration register. Both are written together with one WRSR, so
//! every status write has to carry the current configuration register
//! along. Suspend state lives in the security register.

use super::protocol::DeviceProtocol;
use super::types::{FlashDelays, FlashDeviceConfig, JedecId, JedecMatch};
use crate::bus::{
    opcodes, AddressSize, BusMode, ClockMode, EraseInstruction, ExitContinuousInstruction,
    OpcodeLen, OqspiBus, PageProgramInstruction, ReadInstruction, ReadStatusInstruction,
    SuspendResumeInstruction, SysClock, WriteEnableInstruction,
};
use crate::error::{Error, Result};
use crate::protocol::{self, QuadEnableMethod};

/// Read Configuration Register
pub const RDCR: u8 = 0x15;
/// Read Security Register
pub const RDSCUR: u8 = 0x2B;
/// Quad Page Program (1-4-4)
pub const PP4: u8 = 0x38;
/// Program/Erase Suspend
pub const SUSPEND: u8 = 0xB0;
/// Program/Erase Resume
pub const RESUME: u8 = 0x30;

/// Security register: program suspended (bit 2) or erase suspended (bit 3)
pub const SCUR_SUSPEND_MASK: u8 = 0x0C;

/// Configuration register dummy cycle field (DC bits 7:6)
pub const CR_DUMMY_POS: u8 = 6;
/// Mask of the dummy cycle field
pub const CR_DUMMY_MASK: u8 = 0x3 << CR_DUMMY_POS;

const QUAD_ENABLE: QuadEnableMethod = QuadEnableMethod::Sr1Bit6WithCr {
    read_cr_opcode: RDCR,
};

/// Encode a dummy byte count into the DC field value
pub const fn dummy_field(dummy_bytes: u8) -> Option<u8> {
    match dummy_bytes {
        1 => Some(0x01),
        2 => Some(0x00),
        3 => Some(0x02),
        4 => Some(0x03),
        _ => None,
    }
}

fn write_status_and_config(bus: &mut dyn OqspiBus, sr: u8, cr: u8) {
    protocol::write_enable(bus);
    bus.cs_enable();
    bus.write8(opcodes::WRSR);
    bus.write16(u16::from_be_bytes([sr, cr]));
    bus.cs_disable();
    protocol::wait_ready(bus);
}

/// Macronix MX25U6432 protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct Mx25u6432;

impl DeviceProtocol for Mx25u6432 {
    fn write_status(&self, bus: &mut dyn OqspiBus, value: u8) {
        let cr = protocol::read_register(bus, RDCR);
        write_status_and_config(bus, value, cr);
    }

    fn is_suspended(&self, bus: &mut dyn OqspiBus) -> bool {
        protocol::read_register(bus, RDSCUR) & SCUR_SUSPEND_MASK != 0
    }

    fn initialize(&self, bus: &mut dyn OqspiBus, mode: BusMode, sys_clk: SysClock) -> Result<()> {
        self.write_dummy_config(bus, self.dummy_bytes(sys_clk))?;
        if mode == BusMode::Single {
            protocol::enable_quad_mode(bus, QUAD_ENABLE)?;
        }
        Ok(())
    }

    fn dummy_bytes(&self, sys_clk: SysClock) -> u8 {
        match sys_clk {
            SysClock::Xtal32M | SysClock::Rchs32 | SysClock::Rchs64 => 1,
            SysClock::Rchs96 => 3,
            // The controller runs PLL160 through divider 2, so 80 MHz
            SysClock::Pll160 => 2,
        }
    }

    fn clock_dependent(&self) -> bool {
        true
    }

    fn write_dummy_config(&self, bus: &mut dyn OqspiBus, dummy_bytes: u8) -> Result<()> {
        let field = dummy_field(dummy_bytes).ok_or(Error::InvalidLength)?;

        let sr1 = protocol::read_status1(bus);
        let cr = protocol::read_register(bus, RDCR);
        let new_cr = (cr & !CR_DUMMY_MASK) | (field << CR_DUMMY_POS);
        write_status_and_config(bus, sr1, new_cr);

        if protocol::read_register(bus, RDCR) != new_cr {
            log::warn!("MX25U6432: dummy cycle config did not stick (CR 0x{:02X})", new_cr);
            return Err(Error::RegisterVerifyFailed);
        }
        log::trace!("MX25U6432: {} dummy bytes, CR 0x{:02X}", dummy_bytes, new_cr);
        Ok(())
    }
}

/// Macronix MX25U6432F, 64 Mbit 1.8V quad SPI
pub const MX25U6432: FlashDeviceConfig = FlashDeviceConfig {
    name: "MX25U6432",
    vendor: "Macronix",
    jedec: JedecMatch::exact(JedecId::new(0xC2, 0x25, 0x37)),
    size_bits: 64 * 1024 * 1024,
    address_size: AddressSize::ThreeByte,
    clock_mode: ClockMode::Low,
    opcode_len: OpcodeLen::OneByte,
    read: ReadInstruction::quad_io_continuous(0xA5, 7),
    erase: EraseInstruction::sector_single(30),
    read_status: ReadStatusInstruction::single(0),
    write_enable: WriteEnableInstruction::SINGLE,
    page_program: PageProgramInstruction {
        opcode: PP4,
        opcode_bus_mode: BusMode::Single,
        addr_bus_mode: BusMode::Quad,
        data_bus_mode: BusMode::Quad,
    },
    suspend_resume: SuspendResumeInstruction {
        suspend_opcode: SUSPEND,
        resume_opcode: RESUME,
        suspend_bus_mode: BusMode::Single,
        resume_bus_mode: BusMode::Single,
        suspend_latency_us: 25,
        resume_latency_us: 1,
        resume_to_suspend_latency_us: 100,
    },
    exit_continuous: ExitContinuousInstruction::QUAD,
    delays: FlashDelays {
        reset_us: 12000,
        power_down_us: 10,
        release_power_down_us: 30,
        power_up_us: 800,
    },
    protocol: &Mx25u6432,
    resume_before_writing_regs: true,
};
