//! Region-of-interest search and refinement
//!
//! This module narrows a full tray photo down to the region worth running
//! the detector on: a scored candidate search seeded from the dominant
//! colorful blob, followed by optional tightening passes.

pub mod refine;
pub mod roi;

pub use refine::RoiRefiner;
pub use roi::RoiSearch;
