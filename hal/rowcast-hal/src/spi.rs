//! SPI bus abstractions
//!
//! Display panels are write-only targets, so only the transmit half of an
//! SPI master is modelled here.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// SPI bus master
///
/// `write` may return before the bytes have left the shifter: a DMA backed
/// implementation copies `data` into its own transfer buffer, starts the
/// channel and returns. `flush` blocks until everything queued has been
/// clocked out.
pub trait SpiBus {
    /// Error type for SPI operations
    type Error;

    /// Queue data for transmission
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Wait until all queued data has been transmitted
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiConfig {
    /// Write clock frequency in Hz
    pub frequency: u32,
    /// Clock polarity and phase
    pub mode: Mode,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            frequency: 40_000_000, // 40 MHz
            mode: Mode::Mode0,
        }
    }
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}
