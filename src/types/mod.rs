//! Request-side types.

pub mod params;

pub use params::*;
