//! Core types and resampling utilities.

pub mod resample;
pub mod types;

pub use types::*;
