//! Panel configuration
//!
//! Describes the logical surface the application draws on and how the
//! panel is driven. Surfaces are sized once from this configuration and
//! never resized.

use rowcast_hal::SpiConfig;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Highest rotation index (quarter turns)
pub const MAX_ROTATION: u8 = 3;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Surface width is zero
    ZeroWidth,
    /// Surface height is zero
    ZeroHeight,
    /// Surface does not fit the static buffer capacity
    SurfaceTooLarge,
    /// Line scratch buffer cannot hold a full decoded row
    LineBufferTooSmall,
    /// Rotation outside 0..=3
    InvalidRotation,
    /// Target frame rate of zero
    InvalidFrameRate,
    /// Serialized config does not fit the output buffer
    Serialize,
    /// Serialized config could not be decoded
    Deserialize,
}

/// Display panel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelConfig {
    /// Logical width in pixels (after rotation)
    pub width: u16,
    /// Logical height in pixels (after rotation)
    pub height: u16,
    /// Panel rotation in quarter turns (0-3)
    pub rotation: u8,
    /// Animation frame rate the caller paces `flip()` at
    pub target_fps: u16,
    /// Panel bus settings
    pub spi: SpiConfig,
}

impl Default for PanelConfig {
    /// 480x320 landscape ILI9488 on a 40 MHz bus
    fn default() -> Self {
        Self {
            width: 480,
            height: 320,
            rotation: 3,
            target_fps: 60,
            spi: SpiConfig::default(),
        }
    }
}

impl PanelConfig {
    /// Create a config with default bus settings and frame rate
    pub fn new(width: u16, height: u16, rotation: u8) -> Self {
        Self {
            width,
            height,
            rotation,
            ..Self::default()
        }
    }

    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.height == 0 {
            return Err(ConfigError::ZeroHeight);
        }
        if self.rotation > MAX_ROTATION {
            return Err(ConfigError::InvalidRotation);
        }
        if self.target_fps == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }

    /// Width in the panel's native memory orientation
    ///
    /// Odd rotations swap the axes.
    pub fn panel_width(&self) -> u16 {
        if self.rotation & 1 == 1 {
            self.height
        } else {
            self.width
        }
    }

    /// Height in the panel's native memory orientation
    pub fn panel_height(&self) -> u16 {
        if self.rotation & 1 == 1 {
            self.width
        } else {
            self.height
        }
    }

    /// Serialize to postcard binary, returning the used part of `buf`
    #[cfg(feature = "serde")]
    pub fn to_postcard<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Serialize)
    }

    /// Deserialize from postcard binary and validate
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }
}
