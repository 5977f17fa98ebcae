//! List command implementation

use super::format_size;
use oqspi_core::chip::{DeviceDatabase, FlashDeviceConfig};

/// List all supported chips
pub fn list_chips(vendor_filter: Option<&str>) {
    let db = DeviceDatabase::builtin();

    println!("Supported flash chips:");
    println!();
    println!(
        "{:<10} {:<12} {:>8} {:>10} {:>6}",
        "Vendor", "Name", "Size", "JEDEC ID", "Read"
    );
    println!("{}", "-".repeat(50));

    let chips: Vec<&FlashDeviceConfig> = match vendor_filter {
        Some(vendor) => db.find_by_vendor(vendor).collect(),
        None => db.iter().collect(),
    };

    for chip in chips {
        println!(
            "{:<10} {:<12} {:>8} {:>10} {:>5X}h",
            chip.vendor,
            chip.name,
            format_size(chip.size_bytes()),
            chip.jedec.id.to_string(),
            chip.read.opcode
        );
    }
}
