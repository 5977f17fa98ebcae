//! `embedded-storage` NOR flash traits for [`OqspiFlash`]

use embedded_storage::nor_flash::{
    check_erase, check_read, check_write, ErrorType, NorFlash, NorFlashError, NorFlashErrorKind,
    ReadNorFlash,
};

use crate::bus::OqspiBus;
use crate::config::SECTOR_SIZE;
use crate::error::Error;
use crate::flash::device::FlashDevice;
use crate::flash::oqspi_device::OqspiFlash;

impl NorFlashError for Error {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Self::AddressOutOfBounds => NorFlashErrorKind::OutOfBounds,
            Self::InvalidAlignment => NorFlashErrorKind::NotAligned,
            Self::ChipNotFound
            | Self::InvalidLength
            | Self::RegisterVerifyFailed
            | Self::OperationAborted => NorFlashErrorKind::Other,
        }
    }
}

impl From<NorFlashErrorKind> for Error {
    fn from(value: NorFlashErrorKind) -> Self {
        match value {
            NorFlashErrorKind::NotAligned => Self::InvalidAlignment,
            _ => Self::AddressOutOfBounds,
        }
    }
}

impl<B: OqspiBus> ErrorType for OqspiFlash<B> {
    type Error = Error;
}

impl<B: OqspiBus> ReadNorFlash for OqspiFlash<B> {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        check_read(self, offset, bytes.len())?;
        OqspiFlash::read(self, offset, bytes)
    }

    fn capacity(&self) -> usize {
        self.device_size() as usize
    }
}

impl<B: OqspiBus> NorFlash for OqspiFlash<B> {
    const WRITE_SIZE: usize = 1;
    const ERASE_SIZE: usize = SECTOR_SIZE as usize;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        if from == to {
            return Ok(());
        }
        check_erase(self, from, to)?;
        FlashDevice::erase(self, from, to - from)
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        check_write(self, offset, bytes.len())?;
        FlashDevice::write(self, offset, bytes)
    }
}
