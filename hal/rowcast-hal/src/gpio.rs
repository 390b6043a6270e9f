//! GPIO pin abstractions
//!
//! Panel control lines (chip select, data/command select) are plain
//! digital outputs. Unlike a bare register poke they may fail, e.g. when
//! the line sits behind an I/O expander.

/// Digital output pin
pub trait OutputPin {
    /// Error type for pin operations
    type Error;

    /// Drive the pin high (logic 1)
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the pin low (logic 0)
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Drive the pin to a specific level
    fn set_state(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }

    /// Check if the pin is currently driven high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently driven low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}
