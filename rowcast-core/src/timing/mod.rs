//! Frame timing
//!
//! Measures how fast full surface passes reach the panel and paces the
//! caller's animation frames.

pub mod fps;
pub mod pacer;

pub use fps::{FrameRateObserver, FrameRateSample, FPS_WINDOW_MS};
pub use pacer::FramePacer;
