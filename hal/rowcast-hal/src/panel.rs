//! Panel transfer abstraction
//!
//! The frame engine hands decoded pixel runs to a [`PanelBus`]. A run is
//! always a horizontal span of one scanline.

/// Pixel transfer primitive for a memory-mapped display panel
///
/// Calls always arrive in the order `open_transaction`, any number of
/// `push_run`, `close_transaction`. Implementations may start a DMA transfer
/// in `push_run` and return immediately; `close_transaction` is where the
/// bus is released, so it must wait for outstanding transfers.
pub trait PanelBus {
    /// Error type for bus operations
    type Error;

    /// Claim the bus for a sequence of pixel pushes
    fn open_transaction(&mut self) -> Result<(), Self::Error>;

    /// Write `count` pixels to scanline `row`, starting at column `start`
    ///
    /// `pixels` holds at least `count` 16-bit values already in panel byte
    /// order. The buffer is only borrowed for the call; implementations that
    /// transfer asynchronously must copy it or finish with it before
    /// returning.
    fn push_run(&mut self, row: u16, start: u16, count: u16, pixels: &[u16])
        -> Result<(), Self::Error>;

    /// Release the bus
    fn close_transaction(&mut self) -> Result<(), Self::Error>;
}
