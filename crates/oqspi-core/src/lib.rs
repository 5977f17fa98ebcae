//! oqspi-core - OQSPI serial NOR flash driver
//!
//! This crate drives a serial NOR flash behind an OQSPI controller that
//! executes code in place from the memory-mapped window. It identifies the
//! attached device, programs the controller for fast reads, and runs erase
//! and program cycles either blocking or in the background, suspending them
//! whenever an interrupt needs the CPU. It is `no_std` compatible.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`) and the
//!   blocking background submission API
//! - `alloc` - Enable the background operation queue
//!
//! # Example
//!
//! ```ignore
//! use oqspi_core::{config::DriverConfig, flash::OqspiFlash};
//!
//! fn dump<B: oqspi_core::bus::OqspiBus>(bus: B) -> oqspi_core::Result<()> {
//!     let mut flash = OqspiFlash::new(bus, DriverConfig::default());
//!     flash.init()?;
//!     let mut buf = [0u8; 256];
//!     flash.read(0, &mut buf)?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[cfg(feature = "alloc")]
pub mod background;
pub mod bus;
pub mod chip;
pub mod config;
pub mod error;
pub mod flash;
pub mod protocol;

pub use error::{Error, Result};
