//! Flash driver
//!
//! [`FlashController`] holds the driver state and implements the access
//! mode switching, device identification and manual primitives.
//! [`OqspiFlash`] wraps it with address validation and the storage traits.

mod controller;
mod device;
mod identify;
mod nor;
mod oqspi_device;
mod operations;
mod power;

pub use controller::{FlashController, InterruptGuard};
pub use device::FlashDevice;
#[cfg(feature = "alloc")]
pub use device::FlashDeviceExt;
pub use oqspi_device::OqspiFlash;
