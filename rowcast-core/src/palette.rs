//! Fixed display palette
//!
//! Surfaces store 2-bit palette indices; the panel wants 16-bit RGB565.
//! The 16-bit values below are byte-swapped so that writing them out
//! little-endian puts big-endian RGB565 on the wire.

use embedded_graphics_core::pixelcolor::raw::{RawData, RawU2};
use embedded_graphics_core::pixelcolor::PixelColor;

/// Bits per stored pixel
pub const BITS_PER_PIXEL: usize = 2;

/// Pixels packed into one surface byte
pub const PIXELS_PER_BYTE: usize = 8 / BITS_PER_PIXEL;

/// Mask selecting one palette index
pub const INDEX_MASK: u8 = (1 << BITS_PER_PIXEL) - 1;

/// Palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PaletteColor {
    Black = 0,
    Red = 1,
    Blue = 2,
    #[default]
    White = 3,
}

impl PaletteColor {
    /// Look up a palette entry; only the low two bits of `index` are used
    pub const fn from_index(index: u8) -> Self {
        match index & INDEX_MASK {
            0 => PaletteColor::Black,
            1 => PaletteColor::Red,
            2 => PaletteColor::Blue,
            _ => PaletteColor::White,
        }
    }

    /// 2-bit palette index
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Pixel value in panel byte order
    pub const fn pixel(self) -> u16 {
        match self {
            PaletteColor::Black => 0x0000,
            PaletteColor::Red => 0x00F8,
            PaletteColor::Blue => 0x1F00,
            PaletteColor::White => 0xFFFF,
        }
    }

    /// A surface byte with all four pixels set to this color
    pub const fn fill_byte(self) -> u8 {
        let i = self as u8;
        (i << 6) | (i << 4) | (i << 2) | i
    }
}

impl PixelColor for PaletteColor {
    type Raw = RawU2;
}

impl From<RawU2> for PaletteColor {
    fn from(raw: RawU2) -> Self {
        PaletteColor::from_index(raw.into_inner())
    }
}

impl From<PaletteColor> for RawU2 {
    fn from(color: PaletteColor) -> Self {
        RawU2::new(color.index())
    }
}

/// Decode one palette index to its panel pixel value
#[inline]
pub const fn decode_index(index: u8) -> u16 {
    PaletteColor::from_index(index).pixel()
}

/// Unpack one surface byte into [`PIXELS_PER_BYTE`] panel pixels
///
/// The most significant index pair is the leftmost pixel. `out` must hold
/// at least [`PIXELS_PER_BYTE`] values; extra entries are left untouched.
#[inline]
pub fn decode_byte(byte: u8, out: &mut [u16]) {
    let mut sreg = byte;
    for slot in out.iter_mut().take(PIXELS_PER_BYTE) {
        *slot = decode_index(sreg >> (8 - BITS_PER_PIXEL));
        sreg <<= BITS_PER_PIXEL;
    }
}
