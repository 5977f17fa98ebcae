//! Write command implementation

use super::erase::erase_with_progress;
use super::read::read_with_progress;
use super::{byte_progress, CHUNK_SIZE};
use crate::error::{CliError, Result};
use crate::target::check_range;
use oqspi_core::flash::FlashDevice;
use std::fs;
use std::path::Path;

/// Run the write command
///
/// Unless `no_erase` is set, every erase block the file touches is read
/// first, erased, and programmed back with the file merged in, so bytes
/// around the written range survive.
pub fn run_write<D: FlashDevice + ?Sized>(
    device: &mut D,
    input: &Path,
    start: u32,
    no_erase: bool,
    do_verify: bool,
) -> Result<()> {
    let data = fs::read(input)?;
    if data.is_empty() {
        println!("{:?} is empty, nothing to write", input);
        return Ok(());
    }
    let len = u32::try_from(data.len()).map_err(|_| CliError::BadRange {
        start,
        len: u32::MAX,
        size: device.size(),
    })?;
    check_range(start, len, device.size())?;

    if no_erase {
        write_with_progress(device, start, &data)?;
    } else {
        let block = device.erase_granularity();
        let first = start - start % block;
        let end = (start + len).div_ceil(block) * block;

        println!("Reading 0x{:08X}-0x{:08X} to preserve it...", first, end);
        let mut merged = read_with_progress(device, first, (end - first) as usize)?;
        let offset = (start - first) as usize;
        merged[offset..offset + data.len()].copy_from_slice(&data);

        println!("Erasing...");
        erase_with_progress(device, first, end - first)?;
        println!("Writing...");
        write_with_progress(device, first, &merged)?;
    }

    if do_verify {
        println!("Verifying...");
        verify(device, start, &data)?;
        println!("Verification passed");
    }

    println!("Wrote {} bytes at 0x{:08X}", data.len(), start);
    Ok(())
}

/// Program `data` at `start` with a progress bar
///
/// Chunks that are entirely 0xFF are skipped since they would not change
/// erased flash.
fn write_with_progress<D: FlashDevice + ?Sized>(
    device: &mut D,
    start: u32,
    data: &[u8],
) -> Result<()> {
    let pb = byte_progress(data.len() as u64)?;

    for (i, chunk) in data.chunks(CHUNK_SIZE).enumerate() {
        if chunk.iter().any(|&b| b != 0xFF) {
            device.write(start + (i * CHUNK_SIZE) as u32, chunk)?;
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_with_message("Write complete");
    Ok(())
}

/// Compare flash contents at `start` with `expected`
fn verify<D: FlashDevice + ?Sized>(device: &mut D, start: u32, expected: &[u8]) -> Result<()> {
    let actual = read_with_progress(device, start, expected.len())?;
    match expected.iter().zip(&actual).position(|(e, a)| e != a) {
        Some(pos) => Err(CliError::VerifyMismatch {
            addr: start + pos as u32,
            expected: expected[pos],
            found: actual[pos],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oqspi_core::config::DriverConfig;
    use oqspi_core::flash::OqspiFlash;
    use oqspi_dummy::{DummyConfig, DummyOqspi};
    use std::path::PathBuf;

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("oqspi-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_write_preserves_surrounding_bytes() {
        let image = vec![0x11u8; 0x4000];
        let bus = DummyOqspi::with_data(DummyConfig::default(), &image);
        let mut flash = OqspiFlash::new(bus, DriverConfig::default());
        assert!(flash.init().unwrap());

        let data = pattern(5000);
        let input = temp_file("merge.bin", &data);
        run_write(&mut flash, &input, 0x0F00, false, true).unwrap();
        fs::remove_file(&input).unwrap();

        let bus = flash.controller().bus();
        assert_eq!(bus.erase_log(), &[0x0000, 0x1000, 0x2000]);
        assert_eq!(&bus.data()[0x0F00..0x0F00 + 5000], &data[..]);
        assert!(bus.data()[..0x0F00].iter().all(|&b| b == 0x11));
        assert!(bus.data()[0x0F00 + 5000..0x4000].iter().all(|&b| b == 0x11));
        assert!(bus.violations().is_empty());
    }

    #[test]
    fn test_write_without_erase_reports_mismatch() {
        let image = vec![0x00u8; 0x1000];
        let bus = DummyOqspi::with_data(DummyConfig::default(), &image);
        let mut flash = OqspiFlash::new(bus, DriverConfig::default());
        assert!(flash.init().unwrap());

        let input = temp_file("noerase.bin", &[0xA5; 64]);
        let result = run_write(&mut flash, &input, 0x100, true, true);
        fs::remove_file(&input).unwrap();

        assert!(matches!(
            result,
            Err(CliError::VerifyMismatch {
                addr: 0x100,
                expected: 0xA5,
                found: 0x00
            })
        ));
        assert!(flash.controller().bus().erase_log().is_empty());
    }

    #[test]
    fn test_write_past_end_is_rejected() {
        let mut flash = OqspiFlash::new(DummyOqspi::new_default(), DriverConfig::default());
        assert!(flash.init().unwrap());
        let size = FlashDevice::size(&flash);

        let input = temp_file("end.bin", &[0u8; 32]);
        let result = run_write(&mut flash, &input, size - 16, false, false);
        fs::remove_file(&input).unwrap();

        assert!(matches!(result, Err(CliError::BadRange { .. })));
    }
}
