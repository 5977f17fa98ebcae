//! Manual transaction primitives
//!
//! Functions that leave the controller in Manual mode are crate-private and
//! must be called with interrupts masked; the scheduler relies on them to
//! start an operation and return before it finishes. The public blocking
//! variants mask interrupts themselves and always return in Auto mode.

use crate::bus::{opcodes, BusFeatures, BusMode, BusyLevel, OqspiBus};
use crate::config::PAGE_SIZE;
use crate::error::{Error, Result};

use super::controller::FlashController;

impl<B: OqspiBus> FlashController<B> {
    /// Send `opcode` with the manual bus in `mode`
    pub(crate) fn command_in(&mut self, opcode: u8, mode: BusMode) {
        self.set_bus_mode(mode, false);
        self.send_command(opcode);
    }

    /// Busy state of a status byte, per the active read status instruction
    fn status_is_busy(&self, status: u8) -> bool {
        let instr = &self.active.read_status;
        let bit = (status >> instr.busy_bit) & 1 != 0;
        match instr.busy_level {
            BusyLevel::High => bit,
            BusyLevel::Low => !bit,
        }
    }

    /// Query the busy flag, assuming Manual mode
    fn busy_manual(&mut self) -> bool {
        let protocol = self.active.protocol;
        self.set_bus_mode(self.active.read_status.opcode_bus_mode, false);
        protocol.is_busy(&mut self.bus, &self.active.read_status)
    }

    /// Spin until the device is idle, assuming Manual mode
    pub(crate) fn poll_busy(&mut self) {
        while self.busy_manual() {}
    }

    /// Returns true while a program or erase is running
    ///
    /// Leaves the controller in Manual mode.
    pub(crate) fn is_busy(&mut self) -> bool {
        self.enter_manual();
        self.busy_manual()
    }

    /// Returns true if a program or erase is suspended
    ///
    /// Leaves the controller in Manual mode.
    pub(crate) fn is_suspended(&mut self) -> bool {
        let protocol = self.active.protocol;
        self.enter_manual();
        self.set_bus_mode(self.active.suspend_resume.suspend_bus_mode, false);
        protocol.is_suspended(&mut self.bus)
    }

    /// Send WREN until the Write Enable Latch is set
    ///
    /// There is no retry bound: the latch always sets on a healthy device.
    pub(crate) fn write_enable(&mut self, mode: BusMode) {
        let protocol = self.active.protocol;
        let opcode = self.active.write_enable.opcode;
        loop {
            self.command_in(opcode, mode);
            let status = loop {
                self.set_bus_mode(self.active.read_status.opcode_bus_mode, false);
                let status = protocol.read_status(&mut self.bus);
                if !self.status_is_busy(status) {
                    break status;
                }
            };
            if status & opcodes::SR1_WEL != 0 {
                return;
            }
            log::trace!("WEL not set (status 0x{:02X}), retrying", status);
        }
    }

    /// Program up to one chunk at `addr`, returning the bytes accepted
    ///
    /// The chunk is clamped to the configured maximum and never crosses the
    /// page containing `addr`. The program cycle is started but not waited
    /// for, and the controller stays in Manual mode.
    pub(crate) fn write_page(&mut self, addr: u32, buf: &[u8]) -> usize {
        let max = self.settings.effective_max_write_size();
        let to_page_end = PAGE_SIZE - (addr & (PAGE_SIZE - 1));
        let size = buf.len().min(max.min(to_page_end) as usize);
        let data = &buf[..size];
        let pp = self.active.page_program;

        self.enter_manual();
        self.write_enable(self.active.write_enable.opcode_bus_mode);

        self.set_bus_mode(pp.opcode_bus_mode, false);
        self.bus.cs_enable();
        self.write_opcode(pp.opcode);
        self.set_bus_mode(pp.addr_bus_mode, false);
        self.write_address(addr);
        self.set_bus_mode(pp.data_bus_mode, false);

        // Bytes up to the next word boundary of the source, then whole
        // words, then the tail
        let misalign = data.as_ptr() as usize & 3;
        let lead = if misalign == 0 { 0 } else { (4 - misalign).min(size) };
        let (head, body) = data.split_at(lead);
        for &byte in head {
            self.bus.write8(byte);
        }
        let mut words = body.chunks_exact(4);
        for word in &mut words {
            self.bus
                .write32(u32::from_be_bytes([word[0], word[1], word[2], word[3]]));
        }
        for &byte in words.remainder() {
            self.bus.write8(byte);
        }
        self.bus.cs_disable();

        log::trace!("Program 0x{:08X}: {} bytes", addr, size);
        size
    }

    /// Start a sector erase at `addr` and return without waiting
    ///
    /// Leaves the controller in Manual mode.
    pub(crate) fn erase_sector_manual(&mut self, addr: u32) {
        let erase = self.active.erase;

        self.enter_manual();
        self.write_enable(self.active.write_enable.opcode_bus_mode);

        self.set_bus_mode(erase.opcode_bus_mode, false);
        self.bus.cs_enable();
        self.write_opcode(erase.opcode);
        self.set_bus_mode(erase.addr_bus_mode, false);
        self.write_address(addr);
        self.bus.cs_disable();

        log::trace!("Erase sector 0x{:08X} started", addr);
    }

    /// Suspend a running program or erase
    ///
    /// Keeps sending the suspend opcode while the device reports busy, then
    /// waits the suspend latency. Leaves the controller in Manual mode.
    #[cfg(feature = "alloc")]
    pub(crate) fn suspend(&mut self) {
        let sr = self.active.suspend_resume;
        self.enter_manual();
        while self.busy_manual() {
            self.command_in(sr.suspend_opcode, sr.suspend_bus_mode);
        }
        self.bus.delay_us(u32::from(sr.suspend_latency_us));
    }

    /// Resume a suspended program or erase
    ///
    /// Does nothing if the device is not suspended. Leaves the controller
    /// in Manual mode.
    pub(crate) fn resume(&mut self) {
        let sr = self.active.suspend_resume;
        if !self.is_suspended() {
            return;
        }
        loop {
            self.command_in(sr.resume_opcode, sr.resume_bus_mode);
            if !self.is_suspended() {
                break;
            }
        }
        self.bus.delay_us(u32::from(sr.resume_latency_us));
    }

    /// Returns true if the device can accept a program or erase
    pub fn is_writable(&mut self) -> bool {
        let mut guard = self.mask_interrupts();
        let writable = !guard.is_busy();
        guard.enter_auto();
        writable
    }

    /// Program one chunk and wait for it to finish
    ///
    /// Returns the number of bytes written, which may be less than
    /// `buf.len()`; see [`write_page`](Self::write_page) for the clamping.
    pub fn write_flash_page(&mut self, addr: u32, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(Error::InvalidLength);
        }

        let mut guard = self.mask_interrupts();
        guard.enter_manual();
        guard.poll_busy();
        let written = guard.write_page(addr, buf);
        guard.poll_busy();
        guard.enter_auto();
        Ok(written)
    }

    /// Erase the sector containing `addr` and wait for it to finish
    pub fn erase_sector_blocking(&mut self, addr: u32) {
        while !self.is_writable() {}

        if self.settings.erase_in_auto_mode && self.bus.features().contains(BusFeatures::AUTO_ERASE)
        {
            // The controller drives the erase and keeps serving mapped reads
            self.bus.start_auto_erase(addr);
            while self.bus.erase_in_progress() {}
            return;
        }

        let mut guard = self.mask_interrupts();
        guard.erase_sector_manual(addr);
        guard.poll_busy();
        guard.enter_auto();
    }

    /// Erase the whole device and wait for it to finish
    pub fn chip_erase(&mut self) {
        let mut guard = self.mask_interrupts();
        guard.enter_manual();
        let wren_mode = guard.active.write_enable.opcode_bus_mode;
        guard.write_enable(wren_mode);
        let erase_mode = guard.active.erase.opcode_bus_mode;
        guard.command_in(opcodes::CE_C7, erase_mode);
        guard.poll_busy();
        guard.enter_auto();
        log::debug!("Chip erase complete");
    }

    /// Copy from the memory-mapped window
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) {
        self.bus.read_mapped(addr, buf);
    }
}
