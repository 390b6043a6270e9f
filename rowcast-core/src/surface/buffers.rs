//! Triple buffer set
//!
//! Two render surfaces alternate between "back" (being drawn) and "front"
//! (being transmitted). The third surface is the shadow: the content the
//! panel is known to show. Only the dirty-run scanner writes the shadow,
//! which is why it is only reachable mutably through
//! [`BufferSet::front_and_shadow_mut`].

use super::bitmap::IndexedBitmap;
use crate::config::ConfigError;

/// Which render surface is the back buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Render surface A is back, B is front
    #[default]
    A,
    /// Render surface B is back, A is front
    B,
}

impl Phase {
    /// The other phase
    pub fn flipped(self) -> Self {
        match self {
            Phase::A => Phase::B,
            Phase::B => Phase::A,
        }
    }
}

/// The two render surfaces and the shadow
#[derive(Debug, Clone)]
pub struct BufferSet<const CAP: usize> {
    render_a: IndexedBitmap<CAP>,
    render_b: IndexedBitmap<CAP>,
    shadow: IndexedBitmap<CAP>,
}

impl<const CAP: usize> BufferSet<CAP> {
    /// Three zero-sized surfaces, usable in `const` and `static` contexts
    pub const fn empty() -> Self {
        Self {
            render_a: IndexedBitmap::empty(),
            render_b: IndexedBitmap::empty(),
            shadow: IndexedBitmap::empty(),
        }
    }

    /// Create three surfaces of the same geometry, all cleared to white
    pub fn new(width: u16, height: u16) -> Result<Self, ConfigError> {
        let mut set = Self::empty();
        set.reset(width, height)?;
        Ok(set)
    }

    /// Resize all three surfaces in place and clear them to white
    pub fn reset(&mut self, width: u16, height: u16) -> Result<(), ConfigError> {
        IndexedBitmap::<CAP>::check(width, height)?;
        self.render_a.reset(width, height)?;
        self.render_b.reset(width, height)?;
        self.shadow.reset(width, height)
    }

    /// Render target for `phase`
    pub fn back(&self, phase: Phase) -> &IndexedBitmap<CAP> {
        match phase {
            Phase::A => &self.render_a,
            Phase::B => &self.render_b,
        }
    }

    /// Mutable render target for `phase`
    pub fn back_mut(&mut self, phase: Phase) -> &mut IndexedBitmap<CAP> {
        match phase {
            Phase::A => &mut self.render_a,
            Phase::B => &mut self.render_b,
        }
    }

    /// Transmit source for `phase`
    pub fn front(&self, phase: Phase) -> &IndexedBitmap<CAP> {
        self.back(phase.flipped())
    }

    /// Last transmitted content
    pub fn shadow(&self) -> &IndexedBitmap<CAP> {
        &self.shadow
    }

    /// Front surface and mutable shadow, borrowed together for diffing
    pub(crate) fn front_and_shadow_mut(
        &mut self,
        phase: Phase,
    ) -> (&IndexedBitmap<CAP>, &mut IndexedBitmap<CAP>) {
        let front = match phase {
            Phase::A => &self.render_b,
            Phase::B => &self.render_a,
        };
        (front, &mut self.shadow)
    }
}
