//! Emulated flash target construction
//!
//! Every command runs the driver against a [`DummyOqspi`] built from the
//! global target arguments. The emulator can be preloaded from an image
//! file and its contents saved back once the command finishes.

use crate::cli::{Policy, TargetArgs};
use crate::error::{CliError, Result};
use oqspi_core::bus::BusFeatures;
use oqspi_core::chip::{DeviceDatabase, FlashDeviceConfig, DEVICE_TABLE};
use oqspi_core::config::{DetectionPolicy, DriverConfig};
use oqspi_core::flash::OqspiFlash;
use oqspi_dummy::{DummyConfig, DummyOqspi};
use std::fs;
use std::path::Path;

/// Driver instance used by all commands
pub type Target = OqspiFlash<DummyOqspi>;

/// Look up a part by name in the builtin device table
pub fn find_chip(name: &str) -> Result<&'static FlashDeviceConfig> {
    DeviceDatabase::builtin()
        .find_by_name(name)
        .ok_or_else(|| CliError::UnknownChip(name.to_string()))
}

/// Build the driver settings from the command line
pub fn driver_config(args: &TargetArgs, chip: &'static FlashDeviceConfig) -> DriverConfig {
    let policy = match args.policy {
        Policy::Autodetect => DetectionPolicy::Autodetect(&DEVICE_TABLE),
        Policy::Verify => DetectionPolicy::ConfigVerify(chip),
        Policy::Default => DetectionPolicy::Default(chip),
    };
    DriverConfig::new(policy)
        .with_max_write_size(args.max_write_size)
        .with_erase_in_auto_mode(args.auto_erase)
}

/// Build the emulated controller and flash
pub fn emulator(args: &TargetArgs, chip: &'static FlashDeviceConfig) -> Result<DummyOqspi> {
    let mut features = BusFeatures::empty();
    if args.octa {
        features |= BusFeatures::OCTA_PINS;
    }
    if args.auto_erase {
        features |= BusFeatures::AUTO_ERASE;
    }

    let mut config = DummyConfig::new(chip).with_features(features);
    if let Some(polls) = args.irq_every {
        config = config.with_irq_every(polls);
    }

    match &args.image {
        Some(path) => {
            let image = fs::read(path)?;
            if image.len() > config.size {
                return Err(CliError::ImageTooLarge {
                    len: image.len(),
                    size: chip.size_bytes(),
                });
            }
            log::info!("Preloaded {} bytes from {}", image.len(), path.display());
            Ok(DummyOqspi::with_data(config, &image))
        }
        None => Ok(DummyOqspi::new(config)),
    }
}

/// Create the driver over a fresh emulator and initialize it
pub fn open(args: &TargetArgs) -> Result<Target> {
    let chip = find_chip(&args.chip)?;
    let bus = emulator(args, chip)?;
    let mut flash = OqspiFlash::new(bus, driver_config(args, chip));

    if !flash.init()? {
        log::warn!("No device answered, running on the generic configuration");
    }
    Ok(flash)
}

/// Write the emulated flash contents to `path`
pub fn save(flash: &Target, path: &Path) -> Result<()> {
    let data = flash.controller().bus().data();
    fs::write(path, data)?;
    println!("Saved {} bytes of flash to {}", data.len(), path.display());
    Ok(())
}

/// Report anything the emulator flagged as a protocol violation
pub fn report_violations(flash: &Target) {
    for violation in flash.controller().bus().violations() {
        log::warn!("Emulator flagged: {:?}", violation);
    }
}

/// Check that `start..start + len` lies inside a flash of `size` bytes
pub fn check_range(start: u32, len: u32, size: u32) -> Result<()> {
    match start.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(CliError::BadRange { start, len, size }),
    }
}
