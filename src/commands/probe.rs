//! Probe command implementation

use super::format_size;
use crate::error::{CliError, Result};
use crate::target::Target;
use oqspi_core::error::Error;

/// Identify the flash again and print what the driver configured
pub fn run_probe(flash: &mut Target) -> Result<()> {
    let jedec = flash.identify().ok_or(CliError::Flash(Error::ChipNotFound))?;
    let (active_id, valid) = flash.get_config();
    if active_id != jedec {
        log::warn!("Re-read ID {} differs from the configured {}", jedec, active_id);
    }

    let size = flash.device_size();
    let chip = flash.controller().active_config();
    println!("Found: {} {} ({})", chip.vendor, chip.name, format_size(size));
    println!("  JEDEC ID:      {}{}", jedec, if valid { "" } else { " (invalid)" });
    println!(
        "  Mapped window: 0x{:08X}-0x{:08X}",
        flash.physical_address(0),
        flash.physical_address(size - 1)
    );
    println!(
        "  Read:          0x{:02X} {:?}/{:?}/{:?}{}",
        chip.read.opcode,
        chip.read.opcode_bus_mode,
        chip.read.addr_bus_mode,
        chip.read.data_bus_mode,
        if chip.read.continuous_mode {
            ", continuous"
        } else {
            ""
        }
    );
    println!("  Program:       0x{:02X}", chip.page_program.opcode);
    println!("  Erase:         0x{:02X}", chip.erase.opcode);

    let bus = flash.controller().bus();
    println!("  Dummy bytes:   {}", bus.dummy_bytes());
    println!("  Quad enabled:  {}", bus.quad_enabled());
    println!("  Clock:         {:?}", bus.config().system_clock);
    Ok(())
}
