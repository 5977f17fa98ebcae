//! Flash device descriptors, protocols and the device table
//!
//! This module provides the per-part configuration the controller is
//! programmed with, the vendor callbacks behind it, and the table the
//! Autodetect policy scans.

pub mod adesto;
mod database;
pub mod macronix;
mod protocol;
mod types;
pub mod winbond;

pub use database::*;
pub use protocol::{DeviceProtocol, GenericSpi};
pub use types::*;
