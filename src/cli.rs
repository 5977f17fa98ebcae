//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use oqspi_core::bus::SysClock;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "oqspi")]
#[command(author, version, about = "OQSPI flash driver exerciser", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// How the driver should identify the emulated part
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Scan the whole device table
    Autodetect,
    /// Require the part named by --chip
    Verify,
    /// Assume the part named by --chip if anything answers
    Default,
}

/// System clock choices for the clock command
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Clock {
    /// 32 MHz crystal
    Xtal32m,
    /// 32 MHz internal RC
    Rchs32,
    /// 64 MHz internal RC
    Rchs64,
    /// 96 MHz internal RC
    Rchs96,
    /// 160 MHz PLL
    Pll160,
}

impl From<Clock> for SysClock {
    fn from(clock: Clock) -> Self {
        match clock {
            Clock::Xtal32m => SysClock::Xtal32M,
            Clock::Rchs32 => SysClock::Rchs32,
            Clock::Rchs64 => SysClock::Rchs64,
            Clock::Rchs96 => SysClock::Rchs96,
            Clock::Pll160 => SysClock::Pll160,
        }
    }
}

/// Emulated controller and flash options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct TargetArgs {
    /// Part to emulate
    #[arg(short, long, global = true, default_value = "W25Q64JWIM")]
    pub chip: String,

    /// Device detection policy
    #[arg(long, global = true, value_enum, default_value_t = Policy::Autodetect)]
    pub policy: Policy,

    /// Preload the emulated flash from this file
    #[arg(long, global = true)]
    pub image: Option<PathBuf>,

    /// Save the emulated flash to this file when the command finishes
    #[arg(long, global = true)]
    pub save: Option<PathBuf>,

    /// Largest chunk programmed per page write (at most 256)
    #[arg(long, global = true, default_value_t = oqspi_core::config::DEFAULT_MAX_WRITE_SIZE)]
    pub max_write_size: u32,

    /// Raise an interrupt every N status polls
    #[arg(long, global = true)]
    pub irq_every: Option<u32>,

    /// Route IO4-IO7 to the controller
    #[arg(long, global = true)]
    pub octa: bool,

    /// Erase sectors with the controller's auto-erase engine
    #[arg(long, global = true)]
    pub auto_erase: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the flash and print its configuration
    Probe,

    /// List supported flash chips
    ListChips {
        /// Filter by vendor name
        #[arg(long)]
        vendor: Option<String>,
    },

    /// Read flash contents to file
    Read {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex with 0x prefix or decimal)
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Number of bytes to read (defaults to the rest of the flash)
        #[arg(short, long, value_parser = parse_hex_u32)]
        length: Option<u32>,
    },

    /// Write a file to flash
    Write {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex with 0x prefix or decimal)
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Skip erasing the covered sectors
        #[arg(long)]
        no_erase: bool,

        /// Verify after writing
        #[arg(long)]
        verify: bool,
    },

    /// Erase a sector aligned range
    Erase {
        /// Start address (hex with 0x prefix or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        start: u32,

        /// Number of bytes to erase
        #[arg(short, long, value_parser = parse_hex_u32)]
        length: u32,
    },

    /// Erase the whole chip
    ChipErase,

    /// Reconfigure the driver for a new system clock
    Clock {
        /// New system clock
        #[arg(value_enum)]
        clock: Clock,
    },

    /// Program a pattern through the background scheduler
    Background {
        /// Start address (hex with 0x prefix or decimal)
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0")]
        address: u32,

        /// Number of bytes to program
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0x2000")]
        length: u32,

        /// Number of requester threads sharing the range
        #[arg(short, long, default_value_t = 2)]
        threads: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_hex_u32("0XfF"), Ok(0xFF));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
        assert!(parse_hex_u32("ten").is_err());
    }

    #[test]
    fn test_global_target_args() {
        let cli = Cli::try_parse_from([
            "oqspi",
            "erase",
            "--start",
            "0x1000",
            "--length",
            "4096",
            "--chip",
            "MX25U6432",
            "--policy",
            "verify",
            "--auto-erase",
        ])
        .unwrap();
        assert_eq!(cli.target.chip, "MX25U6432");
        assert_eq!(cli.target.policy, Policy::Verify);
        assert!(cli.target.auto_erase);
        assert!(matches!(
            cli.command,
            Commands::Erase {
                start: 0x1000,
                length: 4096
            }
        ));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
