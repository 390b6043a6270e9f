//! Animation frame pacing
//!
//! Decides when the caller may advance its animation: a frame is due once
//! the deadline has passed and the engine has finished the previous epoch.
//! After a stall the deadline is pulled forward to "now" so frames are not
//! produced in a burst to catch up.

use crate::config::PanelConfig;

/// Fixed-interval frame pacer with microsecond deadlines
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FramePacer {
    interval_us: u64,
    next_update_us: u64,
}

impl FramePacer {
    /// Pacer for `target_fps` frames per second; the first frame is due immediately
    pub fn new(target_fps: u16) -> Self {
        Self {
            interval_us: 1_000_000 / target_fps.max(1) as u64,
            next_update_us: 0,
        }
    }

    pub fn from_config(config: &PanelConfig) -> Self {
        Self::new(config.target_fps)
    }

    pub fn interval_us(&self) -> u64 {
        self.interval_us
    }

    /// Deadline of the next frame
    pub fn next_update_us(&self) -> u64 {
        self.next_update_us
    }

    /// Whether the deadline has passed, regardless of engine state
    pub fn is_due(&self, now_us: u64) -> bool {
        now_us >= self.next_update_us
    }

    /// Claim a frame if one is due and the engine is idle
    ///
    /// Returns true when the caller should draw, `flip()`, and advance its
    /// animation.
    pub fn poll(&mut self, now_us: u64, engine_idle: bool) -> bool {
        if !engine_idle || !self.is_due(now_us) {
            return false;
        }
        self.next_update_us += self.interval_us;
        if now_us > self.next_update_us {
            self.next_update_us = now_us;
        }
        true
    }
}
