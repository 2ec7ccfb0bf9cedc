//! Photometric calibration applied before color classification
//!
//! Tray photos arrive from phone cameras under uncontrolled lighting, so the
//! classifier first normalizes the crop: gray-world white balance followed by
//! contrast-limited adaptive histogram equalization on the lightness plane.

pub mod clahe;
pub mod white_balance;

pub use clahe::{Clahe, ClaheParams};
pub use white_balance::gray_world;
