//! Adesto (Renesas) quad parts
//!
//! The status register layout follows Winbond: SR2 holds the suspend flag
//! in bit 7 and Quad Enable in bit 1, written through 0x31.

use super::protocol::DeviceProtocol;
use super::types::{FlashDelays, FlashDeviceConfig, JedecId, JedecMatch};
use crate::bus::{
    opcodes, AddressSize, BusMode, ClockMode, EraseInstruction, ExitContinuousInstruction,
    OpcodeLen, OqspiBus, PageProgramInstruction, ReadInstruction, ReadStatusInstruction,
    SuspendResumeInstruction, SysClock, WriteEnableInstruction,
};
use crate::error::Result;
use crate::protocol::{self, QuadEnableMethod};

/// Erase/Program Suspend
pub const SUSPEND: u8 = 0x75;
/// Erase/Program Resume
pub const RESUME: u8 = 0x7A;

/// Adesto quad SPI protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct AdestoQuad;

impl DeviceProtocol for AdestoQuad {
    fn is_suspended(&self, bus: &mut dyn OqspiBus) -> bool {
        protocol::read_status2(bus) & opcodes::SR2_SUS != 0
    }

    fn initialize(&self, bus: &mut dyn OqspiBus, mode: BusMode, _sys_clk: SysClock) -> Result<()> {
        if mode == BusMode::Single
            && !protocol::is_quad_enabled(bus, QuadEnableMethod::Sr2Bit1WriteSr2)
        {
            log::debug!("Adesto: setting QE");
            protocol::enable_quad_mode(bus, QuadEnableMethod::Sr2Bit1WriteSr2)?;
        }
        Ok(())
    }

    fn dummy_bytes(&self, _sys_clk: SysClock) -> u8 {
        2
    }
}

const fn adesto_suspend_resume(
    suspend_latency_us: u16,
    resume_latency_us: u16,
    resume_to_suspend_latency_us: u16,
) -> SuspendResumeInstruction {
    SuspendResumeInstruction {
        suspend_opcode: SUSPEND,
        resume_opcode: RESUME,
        suspend_bus_mode: BusMode::Single,
        resume_bus_mode: BusMode::Single,
        suspend_latency_us,
        resume_latency_us,
        resume_to_suspend_latency_us,
    }
}

/// Adesto AT25SL128A, 128 Mbit 1.8V quad SPI
pub const AT25SL128: FlashDeviceConfig = FlashDeviceConfig {
    name: "AT25SL128",
    vendor: "Adesto",
    jedec: JedecMatch::exact(JedecId::new(0x1F, 0x42, 0x18)),
    size_bits: 128 * 1024 * 1024,
    address_size: AddressSize::ThreeByte,
    clock_mode: ClockMode::Low,
    opcode_len: OpcodeLen::OneByte,
    read: ReadInstruction::quad_io_continuous(0xA0, 100),
    erase: EraseInstruction::sector_single(100),
    read_status: ReadStatusInstruction::single(200),
    write_enable: WriteEnableInstruction::SINGLE,
    page_program: PageProgramInstruction {
        opcode: opcodes::QPP_4IO,
        opcode_bus_mode: BusMode::Single,
        addr_bus_mode: BusMode::Quad,
        data_bus_mode: BusMode::Quad,
    },
    suspend_resume: adesto_suspend_resume(30, 1, 64),
    exit_continuous: ExitContinuousInstruction::QUAD,
    delays: FlashDelays {
        reset_us: 30,
        power_down_us: 3,
        release_power_down_us: 3,
        power_up_us: 10000,
    },
    protocol: &AdestoQuad,
    resume_before_writing_regs: false,
};

/// Adesto AT25QL641, 64 Mbit 1.8V quad SPI
pub const AT25QL641: FlashDeviceConfig = FlashDeviceConfig {
    name: "AT25QL641",
    vendor: "Adesto",
    jedec: JedecMatch::exact(JedecId::new(0x1F, 0x43, 0x17)),
    size_bits: 64 * 1024 * 1024,
    address_size: AddressSize::ThreeByte,
    clock_mode: ClockMode::High,
    opcode_len: OpcodeLen::OneByte,
    read: ReadInstruction::quad_io_continuous(0xA0, 70),
    erase: EraseInstruction::sector_single(100),
    read_status: ReadStatusInstruction::single(200),
    write_enable: WriteEnableInstruction::SINGLE,
    page_program: PageProgramInstruction {
        opcode: opcodes::QPP,
        opcode_bus_mode: BusMode::Single,
        addr_bus_mode: BusMode::Single,
        data_bus_mode: BusMode::Quad,
    },
    suspend_resume: adesto_suspend_resume(30, 3, 64),
    exit_continuous: ExitContinuousInstruction::QUAD,
    delays: FlashDelays {
        reset_us: 30,
        power_down_us: 3,
        release_power_down_us: 3,
        power_up_us: 10000,
    },
    protocol: &AdestoQuad,
    resume_before_writing_regs: false,
};
