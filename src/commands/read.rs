//! Read command implementation

use super::{byte_progress, CHUNK_SIZE};
use crate::error::Result;
use crate::target::check_range;
use oqspi_core::flash::FlashDevice;
use std::fs;
use std::path::Path;

/// Run the read command
pub fn run_read<D: FlashDevice + ?Sized>(
    device: &mut D,
    output: &Path,
    start: u32,
    length: Option<u32>,
) -> Result<()> {
    let size = device.size();
    let len = length.unwrap_or_else(|| size.saturating_sub(start));
    check_range(start, len, size)?;

    let data = read_with_progress(device, start, len as usize)?;
    fs::write(output, &data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read `len` bytes starting at `start` with a progress bar
pub fn read_with_progress<D: FlashDevice + ?Sized>(
    device: &mut D,
    start: u32,
    len: usize,
) -> Result<Vec<u8>> {
    let mut data = vec![0u8; len];
    let pb = byte_progress(len as u64)?;

    for (i, chunk) in data.chunks_mut(CHUNK_SIZE).enumerate() {
        device.read(start + (i * CHUNK_SIZE) as u32, chunk)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
