//! Color analysis and conversion module
//!
//! This module handles color space conversions and the two-signal
//! color classifier that assigns price labels to detected items.

pub mod classifier;
pub mod conversion;

pub use classifier::{Classification, ColorClassifier};
