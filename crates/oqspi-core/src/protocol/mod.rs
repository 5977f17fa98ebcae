//! Protocol implementations
//!
//! This module contains the JEDEC SPI25 register command sequences shared
//! by the device protocols and the controller.

mod spi25;

pub use spi25::*;
