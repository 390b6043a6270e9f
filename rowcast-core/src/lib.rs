//! Board-agnostic core of the rowcast frame streamer
//!
//! This crate contains everything between "the application drew a frame"
//! and "pixels went out on the bus":
//!
//! - Fixed 4-entry palette and its 16-bit panel encoding
//! - 2-bit palette-indexed bitmap surfaces (drawable via embedded-graphics)
//! - The triple buffer set (two render phases plus the transmitted shadow)
//! - Dirty-run scanning against the shadow
//! - The resumable, non-blocking transfer engine
//! - Frame-rate observation and animation frame pacing
//! - Panel configuration
//!
//! The engine never blocks, never allocates and never reads a clock: the
//! caller passes timestamps in and drives it with short, bounded calls.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod palette;
pub mod surface;
pub mod timing;
pub mod transfer;

pub use config::{ConfigError, PanelConfig};
pub use palette::PaletteColor;
pub use surface::{BufferSet, IndexedBitmap, Phase};
pub use timing::{FramePacer, FrameRateObserver, FrameRateSample};
pub use transfer::{DirtyRun, DirtyRunScanner, FrameEngine, PixelRun, ScanCursor, TransferState};
