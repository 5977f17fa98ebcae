//! OQSPI flash device adapter
//!
//! [`OqspiFlash`] is the public face of the driver: address validation on
//! top of the controller primitives, plus the [`FlashDevice`] impl.

use crate::bus::{OqspiBus, SysClock};
use crate::chip::JedecId;
use crate::config::{DriverConfig, MAPPED_BASE, MAPPED_WINDOW_SIZE, SECTOR_SIZE};
use crate::error::{Error, Result};
use crate::flash::controller::FlashController;
use crate::flash::device::FlashDevice;

/// Flash attached to an OQSPI controller
///
/// # Example
///
/// ```ignore
/// use oqspi_core::config::DriverConfig;
/// use oqspi_core::flash::OqspiFlash;
///
/// let mut flash = OqspiFlash::new(bus, DriverConfig::default());
/// flash.init()?;
/// let mut buf = [0u8; 16];
/// flash.read(0, &mut buf)?;
/// ```
pub struct OqspiFlash<B: OqspiBus> {
    ctrl: FlashController<B>,
}

impl<B: OqspiBus> OqspiFlash<B> {
    /// Create an adapter; the device is not touched until [`init`](Self::init)
    pub fn new(bus: B, settings: DriverConfig) -> Self {
        Self {
            ctrl: FlashController::new(bus, settings),
        }
    }

    /// Get a reference to the controller
    pub fn controller(&self) -> &FlashController<B> {
        &self.ctrl
    }

    /// Get a mutable reference to the controller
    pub fn controller_mut(&mut self) -> &mut FlashController<B> {
        &mut self.ctrl
    }

    /// Consume the adapter and return the bus
    pub fn into_bus(self) -> B {
        self.ctrl.into_bus()
    }

    /// Identify the device and program the controller for it
    ///
    /// See [`FlashController::init`] for the meaning of the returned flag.
    pub fn init(&mut self) -> Result<bool> {
        self.ctrl.init()
    }

    /// Reset the device and read its JEDEC ID against the detection policy
    pub fn identify(&mut self) -> Option<JedecId> {
        self.ctrl.identify()
    }

    /// Size of the active device in bytes
    pub fn device_size(&self) -> u32 {
        self.ctrl.active_config().size_bytes()
    }

    /// Whether `addr` lies inside the device and the mapped window
    pub fn is_valid_address(&self, addr: u32) -> bool {
        addr < MAPPED_WINDOW_SIZE && addr < self.device_size()
    }

    /// CPU address of flash offset `addr`
    pub fn physical_address(&self, addr: u32) -> u32 {
        MAPPED_BASE + addr
    }

    /// JEDEC ID of the active device and whether it is a real one
    pub fn get_config(&self) -> (JedecId, bool) {
        let id = self.ctrl.jedec_id().unwrap_or_default();
        (id, id.is_valid())
    }

    /// Copy `buf.len()` bytes starting at `addr`
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        if !self.is_valid_range(addr, buf.len()) {
            return Err(Error::AddressOutOfBounds);
        }
        self.ctrl.read(addr, buf);
        Ok(())
    }

    /// Program one chunk of `buf` at `addr`
    ///
    /// Returns the number of bytes written: at most the configured maximum
    /// write size, and never past the end of the page containing `addr`.
    pub fn write_page(&mut self, addr: u32, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Err(Error::InvalidLength);
        }
        if !self.is_valid_address(addr) {
            return Err(Error::AddressOutOfBounds);
        }
        self.ctrl.write_flash_page(addr, buf)
    }

    /// Erase the sector containing `addr`
    pub fn erase_sector(&mut self, addr: u32) -> Result<()> {
        if !self.is_valid_address(addr) {
            return Err(Error::AddressOutOfBounds);
        }
        self.ctrl.erase_sector_blocking(addr);
        Ok(())
    }

    /// Erase the whole device
    pub fn erase_chip(&mut self) {
        self.ctrl.chip_erase();
    }

    /// Bring the flash back after [`power_down`](Self::power_down)
    pub fn power_up(&mut self) -> Result<()> {
        self.ctrl.power_up()
    }

    /// Prepare the flash for controller sleep
    pub fn power_down(&mut self) {
        self.ctrl.power_down();
    }

    /// Retune for a new system clock with no background operation queued
    ///
    /// Use `BackgroundScheduler::sys_clock_cfg` when background operations
    /// may be pending.
    pub fn sys_clock_cfg(&mut self, sys_clk: SysClock) -> Result<()> {
        self.ctrl.sys_clock_cfg(sys_clk, false)
    }
}

impl<B: OqspiBus> FlashDevice for OqspiFlash<B> {
    fn size(&self) -> u32 {
        self.device_size()
    }

    fn erase_granularity(&self) -> u32 {
        SECTOR_SIZE
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        OqspiFlash::read(self, addr, buf)
    }

    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidLength);
        }
        if !self.is_valid_range(addr, data.len()) {
            return Err(Error::AddressOutOfBounds);
        }

        let mut offset = 0usize;
        while offset < data.len() {
            let written = self.write_page(addr + offset as u32, &data[offset..])?;
            offset += written;
        }
        Ok(())
    }

    fn erase(&mut self, addr: u32, len: u32) -> Result<()> {
        if !self.is_valid_range(addr, len as usize) {
            return Err(Error::AddressOutOfBounds);
        }
        if addr % SECTOR_SIZE != 0 || len % SECTOR_SIZE != 0 {
            return Err(Error::InvalidAlignment);
        }

        let mut current = addr;
        while current < addr + len {
            self.erase_sector(current)?;
            current += SECTOR_SIZE;
        }
        Ok(())
    }
}
