//! oqspi - exercise the OQSPI flash driver
//!
//! Runs the driver in `oqspi-core` against the `oqspi-dummy` emulator so
//! that identification, the blocking operations and the background
//! scheduler can be watched from the command line.
//!
//! The emulated part, the detection policy and the controller wiring are
//! global options; `--image` and `--save` move flash contents in and out
//! of the emulator.

mod cli;
mod commands;
mod error;
mod target;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Commands::ListChips { vendor } = &cli.command {
        commands::list_chips(vendor.as_deref());
        return Ok(());
    }

    let mut flash = target::open(&cli.target)?;

    let result = match cli.command {
        Commands::ListChips { .. } => Ok(()),
        Commands::Probe => commands::run_probe(&mut flash),
        Commands::Read {
            output,
            start,
            length,
        } => commands::run_read(&mut flash, &output, start, length),
        Commands::Write {
            input,
            start,
            no_erase,
            verify,
        } => commands::run_write(&mut flash, &input, start, no_erase, verify),
        Commands::Erase { start, length } => commands::run_erase(&mut flash, start, length),
        Commands::ChipErase => commands::run_chip_erase(&mut flash),
        Commands::Clock { clock } => commands::run_clock(&mut flash, clock.into()),
        Commands::Background {
            address,
            length,
            threads,
        } => commands::run_background(&mut flash, address, length, threads),
    };

    target::report_violations(&flash);
    result?;

    if let Some(path) = &cli.target.save {
        target::save(&flash, path)?;
    }
    Ok(())
}
