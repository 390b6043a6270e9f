//! ILI9488 panel bus
//!
//! Pushes pixel runs to an ILI9488 (or any MIPI-DBI panel with the same
//! window commands) over SPI with 16-bit pixel transfers. Each run sets a
//! one-row address window and streams the pixels with a memory write.
//!
//! Boards such as the Waveshare 3.5" ResTouch put a shift register between
//! SPI and the controller's 16-bit parallel port. There every command and
//! parameter byte must be sent as a 16-bit word with a zero high byte
//! ([`Framing::Word16`], the default). Plain 8-bit SPI wiring uses
//! [`Framing::Byte`].
//!
//! Panel initialization (reset, power, pixel format, rotation) is left to
//! board code; this type only owns the bus once the panel is up.

use rowcast_hal::{OutputPin, PanelBus, SpiBus};

/// MIPI-DBI commands used for windowed writes
mod cmd {
    pub const COLUMN_ADDRESS_SET: u8 = 0x2A;
    pub const PAGE_ADDRESS_SET: u8 = 0x2B;
    pub const MEMORY_WRITE: u8 = 0x2C;
}

/// Pixels converted per SPI write
const CHUNK_PIXELS: usize = 32;

/// Most parameter bytes any command here takes
const MAX_PARAMS: usize = 4;

/// How command and parameter bytes go out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framing {
    /// One byte per command or parameter
    Byte,
    /// Each command or parameter byte widened to `[0x00, b]`
    #[default]
    Word16,
}

/// Panel bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ili9488Error<S, P> {
    /// SPI transfer failed
    Spi(S),
    /// Chip select or data/command pin failed
    Pin(P),
    /// Run does not fit the panel or the pixel buffer
    OutOfBounds,
    /// Push without an open transaction
    NotOpen,
}

/// ILI9488 pixel-run bus
///
/// `dc` selects command (low) or data (high); `cs` is active low and held
/// for a whole transaction.
pub struct Ili9488Bus<SPI, P> {
    spi: SPI,
    dc: P,
    cs: P,
    width: u16,
    height: u16,
    framing: Framing,
    open: bool,
}

impl<SPI, P> Ili9488Bus<SPI, P>
where
    SPI: SpiBus,
    P: OutputPin,
{
    /// Wrap an initialized panel of `width` x `height` pixels with 16-bit
    /// command framing
    ///
    /// Chip select is released so the bus starts idle.
    pub fn new(
        spi: SPI,
        dc: P,
        cs: P,
        width: u16,
        height: u16,
    ) -> Result<Self, Ili9488Error<SPI::Error, P::Error>> {
        Self::with_framing(spi, dc, cs, width, height, Framing::default())
    }

    /// Same as [`new`](Self::new) with explicit command framing
    pub fn with_framing(
        spi: SPI,
        dc: P,
        mut cs: P,
        width: u16,
        height: u16,
        framing: Framing,
    ) -> Result<Self, Ili9488Error<SPI::Error, P::Error>> {
        cs.set_high().map_err(Ili9488Error::Pin)?;
        Ok(Self {
            spi,
            dc,
            cs,
            width,
            height,
            framing,
            open: false,
        })
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Give back the SPI bus and pins
    pub fn release(self) -> (SPI, P, P) {
        (self.spi, self.dc, self.cs)
    }

    /// Whether a transaction is open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Send a command byte followed by its parameters
    fn command(&mut self, op: u8, params: &[u8]) -> Result<(), Ili9488Error<SPI::Error, P::Error>> {
        self.dc.set_low().map_err(Ili9488Error::Pin)?;
        self.write_framed(&[op])?;
        self.dc.set_high().map_err(Ili9488Error::Pin)?;
        if !params.is_empty() {
            self.write_framed(params)?;
        }
        Ok(())
    }

    // write command or parameter bytes in the configured framing
    fn write_framed(&mut self, bytes: &[u8]) -> Result<(), Ili9488Error<SPI::Error, P::Error>> {
        match self.framing {
            Framing::Byte => self.spi.write(bytes).map_err(Ili9488Error::Spi),
            Framing::Word16 => {
                let mut buf = [0u8; MAX_PARAMS * 2];
                for chunk in bytes.chunks(MAX_PARAMS) {
                    for (word, &b) in buf.chunks_exact_mut(2).zip(chunk) {
                        word[0] = 0x00;
                        word[1] = b;
                    }
                    self.spi
                        .write(&buf[..chunk.len() * 2])
                        .map_err(Ili9488Error::Spi)?;
                }
                Ok(())
            }
        }
    }

    /// Set the address window to columns `x0..=x1`, pages `y0..=y1`
    fn set_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> Result<(), Ili9488Error<SPI::Error, P::Error>> {
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();

        self.command(cmd::COLUMN_ADDRESS_SET, &[x0h, x0l, x1h, x1l])?;
        self.command(cmd::PAGE_ADDRESS_SET, &[y0h, y0l, y1h, y1l])
    }

    /// Stream pixels as data
    ///
    /// Palette values are stored pre-swapped, so little-endian words give
    /// big-endian RGB565 on the wire.
    fn write_pixels(&mut self, pixels: &[u16]) -> Result<(), Ili9488Error<SPI::Error, P::Error>> {
        let mut buf = [0u8; CHUNK_PIXELS * 2];
        for chunk in pixels.chunks(CHUNK_PIXELS) {
            for (dst, px) in buf.chunks_exact_mut(2).zip(chunk) {
                dst.copy_from_slice(&px.to_le_bytes());
            }
            self.spi
                .write(&buf[..chunk.len() * 2])
                .map_err(Ili9488Error::Spi)?;
        }
        Ok(())
    }
}

impl<SPI, P> PanelBus for Ili9488Bus<SPI, P>
where
    SPI: SpiBus,
    P: OutputPin,
{
    type Error = Ili9488Error<SPI::Error, P::Error>;

    fn open_transaction(&mut self) -> Result<(), Self::Error> {
        if self.open {
            return Ok(());
        }
        self.cs.set_low().map_err(Ili9488Error::Pin)?;
        self.open = true;

        #[cfg(feature = "defmt")]
        defmt::trace!("panel transaction open");

        Ok(())
    }

    fn push_run(&mut self, row: u16, start: u16, count: u16, pixels: &[u16]) -> Result<(), Self::Error> {
        if !self.open {
            return Err(Ili9488Error::NotOpen);
        }
        if count == 0 {
            return Ok(());
        }
        let end = start as u32 + count as u32;
        if row >= self.height || end > self.width as u32 || pixels.len() < count as usize {
            return Err(Ili9488Error::OutOfBounds);
        }

        self.set_window(start, row, start + count - 1, row)?;
        self.command(cmd::MEMORY_WRITE, &[])?;
        self.write_pixels(&pixels[..count as usize])
    }

    fn close_transaction(&mut self) -> Result<(), Self::Error> {
        if !self.open {
            return Ok(());
        }
        self.spi.flush().map_err(Ili9488Error::Spi)?;
        self.cs.set_high().map_err(Ili9488Error::Pin)?;
        self.open = false;

        #[cfg(feature = "defmt")]
        defmt::trace!("panel transaction closed");

        Ok(())
    }
}
