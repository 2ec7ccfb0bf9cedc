//! # Tray Scan
//!
//! A Rust crate for counting colored food items on a tray photo.
//!
//! Items on a tray are skewered and color-coded by price. This library takes
//! a photo, finds the region the tray occupies, runs an injected object
//! detector over it, double-checks each label against the item's actual
//! color, and returns per-color counts together with an annotated preview:
//! - Locating the tray via a scored region-of-interest search
//! - Tightening the region and re-detecting when it pays off
//! - Classifying item color from two signals (HSV ranges and Lab distance)
//! - Collapsing duplicate detections by center distance
//!
//! ## Example
//!
//! ```rust,no_run
//! use tray_scan::{Detector, TrayAnalyzer};
//!
//! fn count(detector: &dyn Detector, photo: &[u8]) -> Result<(), tray_scan::AnalysisError> {
//!     let analyzer = TrayAnalyzer::new();
//!     let analysis = analyzer.analyze_bytes(detector, photo, None)?;
//!     for (label, count) in &analysis.counts {
//!         println!("{label}: {count}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod annotate;
pub mod calibration;
pub mod color;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod imageio;
pub mod mask;
pub mod pipeline;
pub mod profiles;

pub use config::{
    AssemblerConfig, ClassifierConfig, DetectorParams, PipelineConfig, RefineConfig, RoiConfig,
};
pub use detector::{Detection, Detector, RawDetection};
pub use error::{AnalysisError, Result};
pub use geometry::BoundingBox;
pub use pipeline::{TrayAnalysis, TrayAnalyzer};
