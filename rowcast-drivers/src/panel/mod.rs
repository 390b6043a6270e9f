//! Display panel buses

pub mod ili9488;

pub use ili9488::{Framing, Ili9488Bus, Ili9488Error};
