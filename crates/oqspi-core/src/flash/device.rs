//! Flash device trait
//!
//! `FlashDevice` is the address-based view of an attached flash that the
//! CLI and the embedded-storage adapter are written against.

use crate::error::Result;

/// Address-based flash access
///
/// # Example
///
/// ```ignore
/// use oqspi_core::flash::FlashDevice;
///
/// fn read_first_sector<D: FlashDevice>(device: &mut D) -> Result<Vec<u8>> {
///     let mut buf = vec![0u8; 4096];
///     device.read(0, &mut buf)?;
///     Ok(buf)
/// }
/// ```
pub trait FlashDevice {
    /// Get the total flash size in bytes
    fn size(&self) -> u32;

    /// Get the erase block size in bytes
    fn erase_granularity(&self) -> u32;

    /// Read flash contents into the provided buffer
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the read extends beyond flash size
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// Write data to flash
    ///
    /// The target region should be erased first (all bytes 0xFF). Page
    /// boundaries are handled internally.
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the write extends beyond flash size
    /// * `InvalidLength` - If `data` is empty
    fn write(&mut self, addr: u32, data: &[u8]) -> Result<()>;

    /// Erase a region of flash
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the erase extends beyond flash size
    /// * `InvalidAlignment` - If address or length is not a multiple of
    ///   `erase_granularity()`
    fn erase(&mut self, addr: u32, len: u32) -> Result<()>;

    /// Check if a range is valid for this device
    fn is_valid_range(&self, addr: u32, len: usize) -> bool {
        let end = addr as u64 + len as u64;
        end <= self.size() as u64
    }
}

/// Derived operations over any [`FlashDevice`]
#[cfg(feature = "alloc")]
pub trait FlashDeviceExt: FlashDevice {
    /// Read the entire flash contents
    fn read_all(&mut self) -> Result<alloc::vec::Vec<u8>> {
        let size = self.size() as usize;
        let mut buf = alloc::vec![0u8; size];
        self.read(0, &mut buf)?;
        Ok(buf)
    }

    /// Erase the entire flash sector by sector
    fn erase_all(&mut self) -> Result<()> {
        self.erase(0, self.size())
    }
}

#[cfg(feature = "alloc")]
impl<D: FlashDevice + ?Sized> FlashDeviceExt for D {}
