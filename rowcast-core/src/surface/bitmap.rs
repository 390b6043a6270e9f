//! Palette-indexed bitmap surface
//!
//! 2 bits per pixel, packed most-significant pair first, rows padded to a
//! whole byte. Storage is a fixed `[u8; CAP]` array; the active region is
//! `stride * height` bytes and is chosen at construction.

use core::convert::Infallible;

use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    primitives::Rectangle,
    Pixel,
};

use crate::config::ConfigError;
use crate::palette::{PaletteColor, BITS_PER_PIXEL, INDEX_MASK, PIXELS_PER_BYTE};

/// Palette-indexed bitmap with static storage for up to `CAP` bytes
#[derive(Clone)]
pub struct IndexedBitmap<const CAP: usize> {
    width: u16,
    height: u16,
    stride: usize,
    data: [u8; CAP],
}

impl<const CAP: usize> IndexedBitmap<CAP> {
    /// Bytes per row for a surface `width` pixels wide
    pub const fn stride_for(width: u16) -> usize {
        (width as usize * BITS_PER_PIXEL + 7) / 8
    }

    /// Zero-sized surface, usable in `const` and `static` contexts
    ///
    /// Call [`reset`](Self::reset) to give it a geometry.
    pub const fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            stride: 0,
            data: [0; CAP],
        }
    }

    /// Create a surface cleared to white
    pub fn new(width: u16, height: u16) -> Result<Self, ConfigError> {
        let mut bitmap = Self::empty();
        bitmap.reset(width, height)?;
        Ok(bitmap)
    }

    /// Set the geometry in place and clear to white
    ///
    /// On error the surface is left untouched.
    pub fn reset(&mut self, width: u16, height: u16) -> Result<(), ConfigError> {
        Self::check(width, height)?;
        self.width = width;
        self.height = height;
        self.stride = Self::stride_for(width);
        self.fill(PaletteColor::White);
        Ok(())
    }

    /// Validate a geometry against the storage capacity
    pub fn check(width: u16, height: u16) -> Result<(), ConfigError> {
        if width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        if Self::stride_for(width) * height as usize > CAP {
            return Err(ConfigError::SurfaceTooLarge);
        }
        Ok(())
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Active pixel data, `stride * height` bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.stride * self.height as usize]
    }

    /// Mutable active pixel data
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.stride * self.height as usize;
        &mut self.data[..len]
    }

    /// Packed bytes of row `y`
    ///
    /// Rows past the bottom edge yield an empty slice.
    pub fn row(&self, y: u16) -> &[u8] {
        if y >= self.height {
            return &[];
        }
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Mutable packed bytes of row `y`
    pub fn row_mut(&mut self, y: u16) -> &mut [u8] {
        if y >= self.height {
            return &mut [];
        }
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.stride]
    }

    /// Read one pixel
    pub fn pixel(&self, x: u16, y: u16) -> Option<PaletteColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let (idx, shift) = self.locate(x, y);
        Some(PaletteColor::from_index(self.data[idx] >> shift))
    }

    /// Write one pixel; out-of-range coordinates are ignored
    pub fn set_pixel(&mut self, x: u16, y: u16, color: PaletteColor) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (idx, shift) = self.locate(x, y);
        let byte = &mut self.data[idx];
        *byte = (*byte & !(INDEX_MASK << shift)) | (color.index() << shift);
    }

    /// Fill the whole surface with one color
    pub fn fill(&mut self, color: PaletteColor) {
        self.as_bytes_mut().fill(color.fill_byte());
    }

    // byte index and bit shift of pixel (x, y)
    #[inline]
    fn locate(&self, x: u16, y: u16) -> (usize, u32) {
        let x = x as usize;
        let idx = y as usize * self.stride + x / PIXELS_PER_BYTE;
        let slot = x % PIXELS_PER_BYTE;
        let shift = (8 - BITS_PER_PIXEL * (slot + 1)) as u32;
        (idx, shift)
    }

    // fill columns [x0, x1) of row y; whole bytes are written directly
    fn fill_span(&mut self, y: u16, x0: u16, x1: u16, color: PaletteColor) {
        let fill = color.fill_byte();
        let ppb = PIXELS_PER_BYTE as u16;
        let mut x = x0;
        while x < x1 {
            if x % ppb == 0 && x + ppb <= x1 {
                let (idx, _) = self.locate(x, y);
                self.data[idx] = fill;
                x += ppb;
            } else {
                self.set_pixel(x, y, color);
                x += 1;
            }
        }
    }
}

impl<const CAP: usize> core::fmt::Debug for IndexedBitmap<CAP> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IndexedBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish()
    }
}

impl<const CAP: usize> PartialEq for IndexedBitmap<CAP> {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.as_bytes() == other.as_bytes()
    }
}

impl<const CAP: usize> OriginDimensions for IndexedBitmap<CAP> {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl<const CAP: usize> DrawTarget for IndexedBitmap<CAP> {
    type Color = PaletteColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let w = self.width as i32;
        let h = self.height as i32;

        for Pixel(coord, color) in pixels {
            if coord.x < 0 || coord.x >= w || coord.y < 0 || coord.y >= h {
                continue;
            }
            self.set_pixel(coord.x as u16, coord.y as u16, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let w = self.width as i32;
        let h = self.height as i32;

        let x0 = area.top_left.x.clamp(0, w);
        let y0 = area.top_left.y.clamp(0, h);
        let x1 = area
            .top_left
            .x
            .saturating_add(area.size.width as i32)
            .clamp(0, w);
        let y1 = area
            .top_left
            .y
            .saturating_add(area.size.height as i32)
            .clamp(0, h);
        if x0 >= x1 || y0 >= y1 {
            return Ok(());
        }

        for y in y0..y1 {
            self.fill_span(y as u16, x0 as u16, x1 as u16, color);
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}
