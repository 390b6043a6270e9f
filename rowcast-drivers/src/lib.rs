//! Panel bus implementations
//!
//! Concrete [`rowcast_hal::PanelBus`] implementations built on the HAL's
//! SPI and GPIO traits:
//!
//! - MIPI-DBI style SPI panels (ILI9488 and relatives)

#![no_std]
#![deny(unsafe_code)]

pub mod panel;

pub use panel::{Framing, Ili9488Bus, Ili9488Error};
