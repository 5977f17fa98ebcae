//! Flash-side behaviour of the emulator
//!
//! Commands are decoded when chip select is released, like a real part
//! latches them on the rising CS edge. Status reads count as polls: they
//! advance the running program or erase and may raise an interrupt.

use oqspi_core::bus::{opcodes, AccessMode, BusMode, OqspiBus};
use oqspi_core::chip::macronix;
use oqspi_core::protocol::SR1_QE_BIT6;

use crate::{BusyKind, BusyState, DummyOqspi, ProgramRecord, Transaction, Violation};

const PAGE_SIZE: u32 = 256;
const SECTOR_SIZE: u32 = 4096;

/// Chip erase (alternate opcode)
const CE_60: u8 = 0x60;

impl DummyOqspi {
    /// Whether the emulated part uses the Macronix register layout
    fn is_macronix(&self) -> bool {
        self.config.chip.vendor.eq_ignore_ascii_case("Macronix")
    }

    pub(crate) fn qe(&self) -> bool {
        if self.is_macronix() {
            self.sr1 & SR1_QE_BIT6 != 0
        } else {
            self.sr2 & opcodes::SR2_QE != 0
        }
    }

    pub(crate) fn read_sr1(&self) -> u8 {
        let mut status = self.sr1;
        if self.is_busy() {
            status |= opcodes::SR1_WIP;
        }
        if self.wel {
            status |= opcodes::SR1_WEL;
        }
        status
    }

    pub(crate) fn read_sr2(&self) -> u8 {
        if self.is_suspended() {
            self.sr2 | opcodes::SR2_SUS
        } else {
            self.sr2
        }
    }

    fn read_security(&self) -> u8 {
        match self.busy {
            Some(BusyState {
                kind: BusyKind::Program,
                suspended: true,
                ..
            }) => 0x04,
            Some(BusyState {
                kind: BusyKind::Erase { .. },
                suspended: true,
                ..
            }) => 0x08,
            _ => 0x00,
        }
    }

    /// Bus mode the part decodes opcodes on
    fn listening_mode(&self) -> BusMode {
        if self.qpi {
            BusMode::Quad
        } else {
            BusMode::Single
        }
    }

    /// Whether the part ignores `t` entirely
    fn deaf_to(&self, t: &Transaction) -> bool {
        self.continuous || self.powered_down || t.mode != self.listening_mode()
    }

    fn parse_address(&self, t: &Transaction) -> Option<(u32, usize)> {
        let len = self.address_size().bytes() as usize;
        let bytes = t.bytes.get(1..1 + len)?;
        let addr = bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        Some((addr, 1 + len))
    }

    fn wrap(&self, addr: u32) -> usize {
        addr as usize % self.data.len().max(1)
    }

    /// Byte shifted in for the next read8 of transaction `t`
    pub(crate) fn respond(&self, t: &Transaction) -> u8 {
        let Some(opcode) = t.opcode() else {
            return 0xFF;
        };
        if self.deaf_to(t) {
            return 0xFF;
        }

        let mx = self.is_macronix();
        match opcode {
            opcodes::RDSR => self.read_sr1(),
            opcodes::RDSR2 if !mx => self.read_sr2(),
            macronix::RDCR => {
                if mx {
                    self.cr
                } else {
                    0x00
                }
            }
            macronix::RDSCUR if mx => self.read_security(),
            opcodes::RDID => self.respond_rdid(t),
            _ => 0xFF,
        }
    }

    fn respond_rdid(&self, t: &Transaction) -> u8 {
        if self.is_busy() || self.divider() < self.config.rdid_min_divider {
            return 0xFF;
        }
        if self.config.rdid_alternate_only && t.bytes.len() < 4 {
            return 0xFF;
        }
        let id = self.config.jedec.to_bytes();
        id.get(t.read.len()).copied().unwrap_or(0xFF)
    }

    /// Decode and run a finished transaction
    pub(crate) fn execute(&mut self, t: &Transaction) {
        let Some(opcode) = t.opcode() else {
            return;
        };

        // Exit sequences are recognised in any bus mode
        if t.bytes.iter().all(|&b| b == 0xFF) {
            if self.continuous {
                log::trace!("dummy: continuous read mode exited");
                self.continuous = false;
            } else if self.qpi && t.mode == BusMode::Quad {
                log::trace!("dummy: QPI exited");
                self.qpi = false;
            }
            return;
        }

        if self.continuous {
            self.violations
                .push(Violation::CommandInContinuousMode(opcode));
            return;
        }
        if t.mode != self.listening_mode() {
            log::trace!(
                "dummy: ignoring 0x{:02X} sent on {:?}{}",
                opcode,
                t.mode,
                if t.is_dual_byte() { " (dual-byte)" } else { "" }
            );
            return;
        }
        if self.powered_down {
            if opcode == opcodes::RDP {
                log::trace!("dummy: released from deep power-down");
                self.powered_down = false;
            }
            return;
        }

        let reset_enabled = core::mem::take(&mut self.reset_enabled);
        let occupied = self.busy.is_some();
        let chip = self.config.chip;
        let mx = self.is_macronix();

        match opcode {
            opcodes::RDSR | opcodes::RDSR2 | macronix::RDSCUR => {
                self.count_poll();
                self.tick();
            }
            opcodes::WREN => {
                if !self.is_busy() {
                    self.wel = true;
                }
            }
            opcodes::RSTEN => self.reset_enabled = true,
            opcodes::RST => {
                if reset_enabled {
                    self.software_reset();
                }
            }
            op if op == chip.suspend_resume.suspend_opcode => self.suspend(),
            op if op == chip.suspend_resume.resume_opcode => {
                if let Some(busy) = self.busy.as_mut() {
                    busy.suspended = false;
                }
            }
            opcodes::RDID | macronix::RDCR => {}
            _ if occupied => {
                log::debug!("dummy: 0x{:02X} ignored while busy", opcode);
            }
            opcodes::WRSR => self.write_status(t, mx),
            opcodes::WRSR2 if !mx => {
                if self.wel {
                    if let Some(&value) = t.bytes.get(1) {
                        self.sr2 = value & !opcodes::SR2_SUS;
                    }
                    self.start_busy(BusyKind::Register, 1);
                }
            }
            op if op == opcodes::PP || op == chip.page_program.opcode => self.program(t),
            op if op == opcodes::SE_20 || op == chip.erase.opcode => {
                if self.wel {
                    if let Some((addr, _)) = self.parse_address(t) {
                        self.start_erase(addr);
                    }
                }
            }
            opcodes::CE_C7 | CE_60 => {
                if self.wel {
                    let ticks = self.config.erase_ticks;
                    self.start_busy(BusyKind::ChipErase, ticks);
                }
            }
            opcodes::DP => self.powered_down = true,
            opcodes::EQIO => self.qpi = true,
            _ => {}
        }
    }

    fn write_status(&mut self, t: &Transaction, mx: bool) {
        if !self.wel {
            return;
        }
        let mask = !(opcodes::SR1_WIP | opcodes::SR1_WEL);
        if let Some(&sr1) = t.bytes.get(1) {
            self.sr1 = sr1 & mask;
        }
        if let Some(&second) = t.bytes.get(2) {
            if mx {
                self.cr = second;
            } else {
                self.sr2 = second & !opcodes::SR2_SUS;
            }
        }
        self.start_busy(BusyKind::Register, 1);
    }

    fn program(&mut self, t: &Transaction) {
        if !self.wel {
            return;
        }
        let Some((addr, data_start)) = self.parse_address(t) else {
            return;
        };
        let opcode = t.bytes[0];
        let quad = t.modes[1..].iter().any(|&m| m == BusMode::Quad);
        if quad && !self.qe() {
            self.violations.push(Violation::QuadPhaseWithoutQe(opcode));
            self.wel = false;
            return;
        }

        let data = &t.bytes[data_start..];
        let offset = addr % PAGE_SIZE;
        if offset as usize + data.len() > PAGE_SIZE as usize {
            self.violations.push(Violation::PageWrap {
                addr,
                len: data.len(),
            });
        }
        let page = addr - offset;
        for (i, &byte) in data.iter().enumerate() {
            let target = page + (offset + i as u32) % PAGE_SIZE;
            let index = self.wrap(target);
            self.data[index] &= byte;
        }
        self.programs.push(ProgramRecord {
            addr,
            len: data.len(),
        });
        let ticks = self.config.program_ticks;
        self.start_busy(BusyKind::Program, ticks);
    }

    /// Start a sector erase; the array changes when it completes
    pub(crate) fn start_erase(&mut self, addr: u32) {
        if self.busy.is_some() {
            log::debug!("dummy: erase at 0x{:08X} ignored while busy", addr);
            return;
        }
        let sector = self.wrap(addr) as u32 & !(SECTOR_SIZE - 1);
        self.erases.push(sector);
        let ticks = self.config.erase_ticks;
        self.start_busy(BusyKind::Erase { addr: sector }, ticks);
    }

    fn start_busy(&mut self, kind: BusyKind, ticks: u32) {
        self.wel = false;
        self.busy = Some(BusyState {
            kind,
            ticks: ticks.max(1),
            suspended: false,
        });
    }

    fn suspend(&mut self) {
        if let Some(busy) = self.busy.as_mut() {
            let suspendable = matches!(busy.kind, BusyKind::Program | BusyKind::Erase { .. });
            if suspendable && !busy.suspended {
                busy.suspended = true;
                self.suspends += 1;
            }
        }
    }

    fn software_reset(&mut self) {
        log::trace!("dummy: software reset");
        self.busy = None;
        self.wel = false;
        self.qpi = false;
        self.continuous = false;
    }

    /// Advance a running program or erase by one step
    pub(crate) fn tick(&mut self) {
        let Some(busy) = self.busy.as_mut() else {
            return;
        };
        if busy.suspended {
            return;
        }
        busy.ticks = busy.ticks.saturating_sub(1);
        if busy.ticks > 0 {
            return;
        }

        let kind = busy.kind;
        self.busy = None;
        match kind {
            BusyKind::Erase { addr } => {
                let start = addr as usize;
                let end = (start + SECTOR_SIZE as usize).min(self.data.len());
                self.data[start..end].fill(0xFF);
            }
            BusyKind::ChipErase => self.data.fill(0xFF),
            BusyKind::Program | BusyKind::Register => {}
        }
    }

    /// Serve a read of the memory-mapped window
    pub(crate) fn mapped_read(&mut self, addr: u32, buf: &mut [u8]) {
        buf.fill(0xFF);

        if self.access_mode() != AccessMode::Auto {
            self.violations.push(Violation::MappedReadInManual);
            return;
        }
        if !self.clock_enabled() {
            self.violations.push(Violation::ClockGated);
            return;
        }
        if self.is_busy() {
            self.violations.push(Violation::MappedReadWhileBusy);
            return;
        }
        if self.powered_down {
            return;
        }

        let read = self
            .setup()
            .map(|s| s.read)
            .unwrap_or(oqspi_core::bus::ReadInstruction::SINGLE);
        let quad = [read.addr_bus_mode, read.data_bus_mode].contains(&BusMode::Quad);
        if quad && !self.qe() {
            self.violations.push(Violation::QuadPhaseWithoutQe(read.opcode));
            return;
        }
        if self.is_macronix() && quad {
            let configured = (self.cr & macronix::CR_DUMMY_MASK) >> macronix::CR_DUMMY_POS;
            if macronix::dummy_field(self.dummy_bytes()) != Some(configured) {
                self.violations.push(Violation::DummyMismatch {
                    programmed: self.dummy_bytes(),
                });
                return;
            }
        }

        for (i, byte) in buf.iter_mut().enumerate() {
            let target = addr as usize + i;
            if let Some(&value) = self.data.get(target) {
                *byte = value;
            }
        }
        self.continuous = read.continuous_mode;
    }
}
