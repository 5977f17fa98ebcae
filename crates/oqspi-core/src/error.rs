//! Error types for oqspi-core
//!
//! Bus primitives cannot fail, so errors only come from identification,
//! argument checking and device initialization.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Identification errors
    /// Flash chip not found (JEDEC ID unreadable or not in the device table)
    ChipNotFound,

    // Argument errors
    /// Address is beyond the flash or the mapped window
    AddressOutOfBounds,
    /// Zero-length or oversized transfer
    InvalidLength,
    /// Operation requires aligned address or size
    InvalidAlignment,

    // Device errors
    /// A register write did not read back the written value
    RegisterVerifyFailed,

    // Background errors
    /// The scheduler went away before completing a queued operation
    OperationAborted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChipNotFound => write!(f, "flash chip not found"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidLength => write!(f, "invalid transfer length"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
            Self::RegisterVerifyFailed => write!(f, "register write verify failed"),
            Self::OperationAborted => write!(f, "background operation aborted"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
