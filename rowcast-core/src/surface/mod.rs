//! Bitmap surfaces and the triple buffer set

pub mod bitmap;
pub mod buffers;

pub use bitmap::IndexedBitmap;
pub use buffers::{BufferSet, Phase};
