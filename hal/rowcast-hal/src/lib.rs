//! rowcast Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the frame engine and
//! panel drivers are written against. Chip-specific code implements them;
//! the engine never touches registers or DMA channels itself.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  rowcast-core (FrameEngine)             │
//! └─────────────────────────────────────────┘
//!                     │ PanelBus
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rowcast-drivers (Ili9488Bus, ...)      │
//! └─────────────────────────────────────────┘
//!                     │ SpiBus + OutputPin
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  chip HAL (SPI + DMA, GPIO)             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output (chip select, data/command)
//! - [`spi::SpiBus`] - Write-only SPI master, usually DMA backed
//! - [`panel::PanelBus`] - Windowed pixel-run transfer to a display panel

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod panel;
pub mod spi;

// Re-export key traits at crate root for convenience
pub use gpio::OutputPin;
pub use panel::PanelBus;
pub use spi::{SpiBus, SpiConfig};
