//! Dirty-run scanner
//!
//! Compares a front surface against the shadow one scanline at a time,
//! coalescing contiguous differing bytes into runs. Each run is decoded
//! into a scratch line of panel pixels and handed to the caller; the
//! shadow bytes are updated right after the run is issued, so a change is
//! never sent twice and never lost if the caller stops between rows.

use core::ops::Range;

use crate::palette::{decode_byte, PIXELS_PER_BYTE};
use crate::surface::IndexedBitmap;

/// Span of changed bytes within one scanline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirtyRun {
    pub row: u16,
    pub start_byte: usize,
    pub byte_count: usize,
}

impl DirtyRun {
    /// Byte range within the row
    pub fn bytes(&self) -> Range<usize> {
        self.start_byte..self.start_byte + self.byte_count
    }

    /// Pixel span for a surface `width` pixels wide
    ///
    /// Padding pixels in the last byte of a row are not part of the span.
    pub fn to_pixels(&self, width: u16) -> PixelRun {
        let start = self.start_byte * PIXELS_PER_BYTE;
        let count = (self.byte_count * PIXELS_PER_BYTE).min((width as usize).saturating_sub(start));
        PixelRun {
            row: self.row,
            start: start as u16,
            count: count as u16,
        }
    }
}

/// Span of panel pixels within one scanline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelRun {
    pub row: u16,
    pub start: u16,
    pub count: u16,
}

/// Find the next run of differing bytes at or after `from`
///
/// With `force` every byte counts as different, so the rest of the row
/// becomes a single run.
pub fn next_run(old: &[u8], new: &[u8], from: usize, force: bool) -> Option<Range<usize>> {
    let len = old.len().min(new.len());
    let differs = |i: usize| force || old[i] != new[i];

    let start = (from..len).find(|&i| differs(i))?;
    let end = (start + 1..len).find(|&i| !differs(i)).unwrap_or(len);
    Some(start..end)
}

/// Row differ with a static scratch line of `LINE` decoded pixels
#[derive(Debug, Clone)]
pub struct DirtyRunScanner<const LINE: usize> {
    line: [u16; LINE],
}

impl<const LINE: usize> Default for DirtyRunScanner<LINE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LINE: usize> DirtyRunScanner<LINE> {
    pub const fn new() -> Self {
        Self { line: [0; LINE] }
    }

    /// Pixels the scratch line can hold
    pub const fn capacity(&self) -> usize {
        LINE
    }

    /// Diff row `row` of `front` against `shadow` and issue every run
    ///
    /// `issue` receives each run with its decoded pixels. If it fails, the
    /// shadow keeps the old bytes for that run and the error is returned;
    /// runs issued before the failure stay committed.
    ///
    /// Returns the number of runs issued.
    pub fn sync_row<const CAP: usize, E, F>(
        &mut self,
        row: u16,
        front: &IndexedBitmap<CAP>,
        shadow: &mut IndexedBitmap<CAP>,
        force: bool,
        mut issue: F,
    ) -> Result<usize, E>
    where
        F: FnMut(PixelRun, &[u16]) -> Result<(), E>,
    {
        let width = front.width();
        let new_row = front.row(row);
        let mut from = 0;
        let mut runs = 0;

        while let Some(range) = next_run(shadow.row(row), new_row, from, force) {
            let run = DirtyRun {
                row,
                start_byte: range.start,
                byte_count: range.len(),
            };
            let pixels = run.to_pixels(width);
            let new_bytes = &new_row[range.clone()];

            self.decode(new_bytes);
            let count = (pixels.count as usize).min(LINE);
            issue(pixels, &self.line[..count])?;

            shadow.row_mut(row)[range.clone()].copy_from_slice(new_bytes);
            from = range.end;
            runs += 1;
        }

        Ok(runs)
    }

    // unpack bytes into the scratch line, 4 pixels per byte
    fn decode(&mut self, bytes: &[u8]) {
        for (chunk, &byte) in self.line.chunks_exact_mut(PIXELS_PER_BYTE).zip(bytes) {
            decode_byte(byte, chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PaletteColor;
    use heapless::Vec;

    type Bmp = IndexedBitmap<64>;

    #[derive(Debug, PartialEq)]
    struct Issued {
        run: PixelRun,
        pixels: Vec<u16, 32>,
    }

    fn collect(
        scanner: &mut DirtyRunScanner<32>,
        row: u16,
        front: &Bmp,
        shadow: &mut Bmp,
        force: bool,
    ) -> Vec<Issued, 8> {
        let mut out = Vec::new();
        scanner
            .sync_row(row, front, shadow, force, |run, px| -> Result<(), ()> {
                let mut pixels = Vec::new();
                pixels.extend_from_slice(px).unwrap();
                out.push(Issued { run, pixels }).unwrap();
                Ok(())
            })
            .unwrap();
        out
    }

    #[test]
    fn test_next_run() {
        let old = [0, 0, 0, 0, 0, 0];
        let new = [0, 1, 1, 0, 0, 1];
        assert_eq!(next_run(&old, &new, 0, false), Some(1..3));
        assert_eq!(next_run(&old, &new, 3, false), Some(5..6));
        assert_eq!(next_run(&old, &new, 6, false), None);
        assert_eq!(next_run(&old, &old, 0, false), None);
        assert_eq!(next_run(&old, &old, 0, true), Some(0..6));
    }

    #[test]
    fn test_pixel_span() {
        let run = DirtyRun {
            row: 3,
            start_byte: 1,
            byte_count: 2,
        };
        assert_eq!(run.bytes(), 1..3);
        assert_eq!(
            run.to_pixels(16),
            PixelRun {
                row: 3,
                start: 4,
                count: 8
            }
        );
        // 10 pixel wide surface: last byte holds 2 real pixels
        assert_eq!(run.to_pixels(10).count, 6);
    }

    #[test]
    fn test_single_byte_change() {
        let mut scanner = DirtyRunScanner::<32>::new();
        let mut front = Bmp::new(8, 4).unwrap();
        let mut shadow = Bmp::new(8, 4).unwrap();
        front.fill(PaletteColor::Black);
        shadow.fill(PaletteColor::Black);
        front.row_mut(2).copy_from_slice(&[0xFF, 0x00]);

        let issued = collect(&mut scanner, 2, &front, &mut shadow, false);
        assert_eq!(issued.len(), 1);
        assert_eq!(
            issued[0].run,
            PixelRun {
                row: 2,
                start: 0,
                count: 4
            }
        );
        assert_eq!(issued[0].pixels.as_slice(), &[0xFFFF; 4]);
        assert_eq!(shadow.row(2), &[0xFF, 0x00]);
    }

    #[test]
    fn test_clean_row_issues_nothing() {
        let mut scanner = DirtyRunScanner::<32>::new();
        let front = Bmp::new(8, 4).unwrap();
        let mut shadow = Bmp::new(8, 4).unwrap();

        let issued = collect(&mut scanner, 0, &front, &mut shadow, false);
        assert!(issued.is_empty());
    }

    #[test]
    fn test_force_issues_whole_row() {
        let mut scanner = DirtyRunScanner::<32>::new();
        let front = Bmp::new(8, 4).unwrap();
        let mut shadow = Bmp::new(8, 4).unwrap();

        let issued = collect(&mut scanner, 1, &front, &mut shadow, true);
        assert_eq!(issued.len(), 1);
        assert_eq!(issued[0].run.start, 0);
        assert_eq!(issued[0].run.count, 8);
    }

    #[test]
    fn test_multiple_runs_decoded_separately() {
        let mut scanner = DirtyRunScanner::<32>::new();
        let mut front = Bmp::new(16, 2).unwrap();
        let mut shadow = Bmp::new(16, 2).unwrap();
        front.row_mut(0)[0] = 0b00_01_10_11;
        front.row_mut(0)[2] = PaletteColor::Red.fill_byte();
        front.row_mut(0)[3] = PaletteColor::Blue.fill_byte();

        let issued = collect(&mut scanner, 0, &front, &mut shadow, false);
        assert_eq!(issued.len(), 2);
        assert_eq!(issued[0].run.start, 0);
        assert_eq!(issued[0].pixels.as_slice(), &[0x0000, 0x00F8, 0x1F00, 0xFFFF]);
        assert_eq!(issued[1].run.start, 8);
        assert_eq!(issued[1].run.count, 8);
        assert_eq!(
            issued[1].pixels.as_slice(),
            &[0x00F8, 0x00F8, 0x00F8, 0x00F8, 0x1F00, 0x1F00, 0x1F00, 0x1F00]
        );
        assert_eq!(shadow.row(0), front.row(0));
    }

    #[test]
    fn test_failed_issue_keeps_shadow() {
        let mut scanner = DirtyRunScanner::<32>::new();
        let mut front = Bmp::new(8, 1).unwrap();
        let mut shadow = Bmp::new(8, 1).unwrap();
        front.fill(PaletteColor::Black);

        let result = scanner.sync_row(0, &front, &mut shadow, false, |_, _| Err("bus"));
        assert_eq!(result, Err("bus"));
        assert_eq!(shadow.row(0), &[0xFF, 0xFF]);
    }

    #[test]
    fn test_second_sync_is_clean() {
        let mut scanner = DirtyRunScanner::<32>::new();
        let mut front = Bmp::new(8, 4).unwrap();
        let mut shadow = Bmp::new(8, 4).unwrap();
        front.set_pixel(6, 3, PaletteColor::Red);

        assert_eq!(collect(&mut scanner, 3, &front, &mut shadow, false).len(), 1);
        assert!(collect(&mut scanner, 3, &front, &mut shadow, false).is_empty());
    }
}
