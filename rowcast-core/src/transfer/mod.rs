//! Incremental frame transfer
//!
//! The scanner finds what changed on a scanline; the engine decides when to
//! scan, owns the bus transaction and keeps the scan cursor.

pub mod engine;
pub mod scanner;

pub use engine::{FrameEngine, ScanCursor, TransferState};
pub use scanner::{next_run, DirtyRun, DirtyRunScanner, PixelRun};
