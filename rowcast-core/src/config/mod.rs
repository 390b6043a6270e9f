//! Configuration types
//!
//! Panel geometry and bus settings. Configuration can be persisted as
//! postcard binary data when the `serde` feature is enabled.

pub mod panel;

pub use panel::{ConfigError, PanelConfig, MAX_ROTATION};
