//! Frame-rate observer
//!
//! Counts completed full-surface passes (scanline wraparounds) and turns
//! them into a rate once per sampling window.

use core::fmt::Write;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::Point,
    mono_font::{ascii::FONT_6X13, MonoTextStyleBuilder},
    text::{Baseline, Text},
    Drawable,
};
use heapless::String;

use crate::palette::PaletteColor;

/// Sampling window length
pub const FPS_WINDOW_MS: u64 = 1000;

/// Capacity of the overlay label ("FPS:" plus digits)
pub const LABEL_LEN: usize = 16;

/// Top-left corner of the overlay text
pub const LABEL_ORIGIN: Point = Point::new(4, 4);

/// Snapshot of the observer state
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameRateSample {
    /// Start of the current window (ms)
    pub window_start_ms: u64,
    /// Passes counted in the current window
    pub frame_count: u32,
    /// Rate computed at the end of the last full window
    pub fps: f32,
}

/// Full-pass rate tracker
#[derive(Debug, Clone)]
pub struct FrameRateObserver {
    window_start_ms: u64,
    frame_count: u32,
    fps: f32,
    /// Same rate in tenths, for integer display
    fps_x10: u32,
}

impl FrameRateObserver {
    /// Start a window at `now_ms` with a rate of zero
    pub const fn new(now_ms: u64) -> Self {
        Self {
            window_start_ms: now_ms,
            frame_count: 0,
            fps: 0.0,
            fps_x10: 0,
        }
    }

    /// Record one completed pass
    ///
    /// Once the window has lasted at least [`FPS_WINDOW_MS`], the rate is
    /// recomputed and a new window starts at `now_ms`.
    pub fn record_pass(&mut self, now_ms: u64) {
        self.frame_count = self.frame_count.saturating_add(1);

        let elapsed_ms = now_ms.saturating_sub(self.window_start_ms);
        if elapsed_ms >= FPS_WINDOW_MS {
            let frames = self.frame_count as u64;
            self.fps = (frames as f32 * 1000.0) / elapsed_ms as f32;
            self.fps_x10 = (frames * 10_000 / elapsed_ms) as u32;

            #[cfg(feature = "defmt")]
            defmt::trace!(
                "fps window: {} passes in {} ms ({}.{} fps)",
                self.frame_count,
                elapsed_ms,
                self.fps_x10 / 10,
                self.fps_x10 % 10
            );

            self.window_start_ms = now_ms;
            self.frame_count = 0;
        }
    }

    /// Passes per second over the last full window
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Passes per second in tenths, truncated
    pub fn fps_x10(&self) -> u32 {
        self.fps_x10
    }

    pub fn sample(&self) -> FrameRateSample {
        FrameRateSample {
            window_start_ms: self.window_start_ms,
            frame_count: self.frame_count,
            fps: self.fps,
        }
    }

    /// Overlay text, e.g. `FPS:59.8`
    pub fn label(&self) -> String<LABEL_LEN> {
        let mut s = String::new();
        // Cannot overflow: u32 tenths fit in the label
        let _ = write!(s, "FPS:{}.{}", self.fps_x10 / 10, self.fps_x10 % 10);
        s
    }

    /// Draw the label black on white at [`LABEL_ORIGIN`]
    pub fn paint_fps<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = PaletteColor>,
    {
        let style = MonoTextStyleBuilder::new()
            .font(&FONT_6X13)
            .text_color(PaletteColor::Black)
            .background_color(PaletteColor::White)
            .build();
        let label = self.label();
        Text::with_baseline(&label, LABEL_ORIGIN, style, Baseline::Top).draw(target)?;
        Ok(())
    }
}
