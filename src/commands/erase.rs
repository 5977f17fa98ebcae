//! Erase command implementation

use super::{byte_progress, spinner};
use crate::error::Result;
use crate::target::{check_range, Target};
use oqspi_core::flash::FlashDevice;

/// Erase a sector aligned range
pub fn run_erase<D: FlashDevice + ?Sized>(device: &mut D, start: u32, len: u32) -> Result<()> {
    check_range(start, len, device.size())?;
    erase_with_progress(device, start, len)?;
    println!("Erased 0x{:08X}-0x{:08X}", start, start + len);
    Ok(())
}

/// Erase `len` bytes at `start`, one erase block at a time
pub fn erase_with_progress<D: FlashDevice + ?Sized>(
    device: &mut D,
    start: u32,
    len: u32,
) -> Result<()> {
    let block = device.erase_granularity();
    // Let the driver reject misaligned ranges before any progress output
    if start % block != 0 || len % block != 0 {
        device.erase(start, len)?;
        return Ok(());
    }

    let pb = byte_progress(len as u64)?;
    let mut addr = start;
    while addr < start + len {
        device.erase(addr, block)?;
        addr += block;
        pb.inc(block as u64);
    }
    pb.finish_with_message("Erase complete");
    Ok(())
}

/// Erase the whole chip with the chip erase instruction
pub fn run_chip_erase(flash: &mut Target) -> Result<()> {
    let pb = spinner("Erasing chip...")?;
    flash.erase_chip();
    pb.finish_with_message("Chip erase complete");

    let mut first = [0u8; 16];
    flash.read(0, &mut first)?;
    if first.iter().any(|&b| b != 0xFF) {
        log::warn!("Flash start does not read back erased after chip erase");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use oqspi_core::config::DriverConfig;
    use oqspi_core::flash::OqspiFlash;
    use oqspi_dummy::{DummyConfig, DummyOqspi};

    fn flash_with(byte: u8) -> Target {
        let image = vec![byte; 0x10000];
        let bus = DummyOqspi::with_data(DummyConfig::default(), &image);
        let mut flash = OqspiFlash::new(bus, DriverConfig::default());
        assert!(flash.init().unwrap());
        flash
    }

    #[test]
    fn test_erase_range() {
        let mut flash = flash_with(0x00);
        run_erase(&mut flash, 0x2000, 0x2000).unwrap();
        let bus = flash.controller().bus();
        assert_eq!(bus.erase_log(), &[0x2000, 0x3000]);
        assert!(bus.data()[0x2000..0x4000].iter().all(|&b| b == 0xFF));
        assert_eq!(bus.data()[0x1FFF], 0x00);
        assert_eq!(bus.data()[0x4000], 0x00);
    }

    #[test]
    fn test_erase_misaligned_is_rejected() {
        let mut flash = flash_with(0x00);
        assert!(matches!(
            run_erase(&mut flash, 0x100, 0x1000),
            Err(CliError::Flash(oqspi_core::Error::InvalidAlignment))
        ));
        assert!(flash.controller().bus().erase_log().is_empty());
    }

    #[test]
    fn test_erase_past_end_is_rejected() {
        let mut flash = flash_with(0x00);
        let size = FlashDevice::size(&flash);
        assert!(matches!(
            run_erase(&mut flash, size - 0x1000, 0x2000),
            Err(CliError::BadRange { .. })
        ));
    }

    #[test]
    fn test_chip_erase() {
        let mut flash = flash_with(0x5A);
        run_chip_erase(&mut flash).unwrap();
        assert!(flash.controller().bus().data().iter().all(|&b| b == 0xFF));
    }
}
