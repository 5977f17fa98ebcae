//! Winbond quad parts

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

/// Winbond quad SPI protocol
///
/// Suspend status is SR2 bit 7 and Quad Enable is SR2 bit 1, written with
/// the dedicated 0x31 command.
#[derive(Debug, Clone, Copy, Default)]
pub struct WinbondQuad;

impl DeviceProtocol for WinbondQuad {
    fn is_suspended(&self, bus: &mut dyn OqspiBus) -> bool {
        protocol::read_status2(bus) & opcodes::SR2_SUS != 0
    }

    fn initialize(&self, bus: &mut dyn OqspiBus, mode: BusMode, _sys_clk: SysClock) -> Result<()> {
        if mode == BusMode::Single {
            protocol::enable_quad_mode(bus, QuadEnableMethod::Sr2Bit1WriteSr2)?;
        }
        Ok(())
    }

    fn dummy_bytes(&self, _sys_clk: SysClock) -> u8 {
        2
    }
}

/// Winbond W25Q64JW-IM, 64 Mbit 1.8V quad SPI
pub const W25Q64JWIM: FlashDeviceConfig = FlashDeviceConfig {
    name: "W25Q64JWIM",
    vendor: "Winbond",
    jedec: JedecMatch::exact(JedecId::new(0xEF, 0x80, 0x17)),
    size_bits: 64 * 1024 * 1024,
    address_size: AddressSize::ThreeByte,
    clock_mode: ClockMode::High,
    opcode_len: OpcodeLen::OneByte,
    read: ReadInstruction::quad_io_continuous(0xA0, 10),
    erase: EraseInstruction::sector_single(50),
    read_status: ReadStatusInstruction::single(200),
    write_enable: WriteEnableInstruction::SINGLE,
    page_program: PageProgramInstruction {
        opcode: opcodes::QPP,
        opcode_bus_mode: BusMode::Single,
        addr_bus_mode: BusMode::Single,
        data_bus_mode: BusMode::Quad,
    },
    suspend_resume: SuspendResumeInstruction {
        suspend_opcode: SUSPEND,
        resume_opcode: RESUME,
        suspend_bus_mode: BusMode::Single,
        resume_bus_mode: BusMode::Single,
        suspend_latency_us: 20,
        resume_latency_us: 1,
        resume_to_suspend_latency_us: 20,
    },
    exit_continuous: ExitContinuousInstruction::QUAD,
    delays: FlashDelays {
        reset_us: 12000,
        power_down_us: 3,
        release_power_down_us: 30,
        power_up_us: 20,
    },
    protocol: &WinbondQuad,
    resume_before_writing_regs: false,
};
