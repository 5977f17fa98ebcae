//! Error types for the oqspi command line tool

use thiserror::Error;

/// Errors raised by the CLI itself
#[derive(Debug, Error)]
pub enum CliError {
    /// The requested part is not in the device table
    #[error("Unknown chip '{0}'. Use `oqspi list-chips` to see the supported parts")]
    UnknownChip(String),

    /// Preloaded image does not fit the emulated flash
    #[error("Image is {len} bytes but the flash only holds {size} bytes")]
    ImageTooLarge { len: usize, size: u32 },

    /// Range is outside the flash or wraps around
    #[error("Range 0x{start:08X}+0x{len:X} does not fit a {size} byte flash")]
    BadRange { start: u32, len: u32, size: u32 },

    /// Read back data differs from what was written
    #[error("Verify failed at 0x{addr:08X}: expected 0x{expected:02X}, found 0x{found:02X}")]
    VerifyMismatch { addr: u32, expected: u8, found: u8 },

    /// Driver error
    #[error("Flash error: {0}")]
    Flash(#[from] oqspi_core::Error),

    /// File access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Progress bar template rejected
    #[error("Invalid progress template: {0}")]
    Template(#[from] indicatif::style::TemplateError),

    /// A requester thread died before its operation finished
    #[error("Background requester thread panicked")]
    RequesterPanicked,
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
