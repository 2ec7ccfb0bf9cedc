//! Configuration structures for the tray_scan analysis pipeline.
//!
//! This module defines all tunable parameters for tray analysis,
//! organized into logical groups for detection, ROI search, refinement,
//! classification, and result assembly.
//!
//! # Configuration Loading
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use tray_scan::PipelineConfig;
//! use std::path::Path;
//!
//! // Load from file
//! let config = PipelineConfig::from_json_file(Path::new("config.json"))?;
//!
//! // Or use defaults
//! let config = PipelineConfig::default();
//! # Ok::<(), tray_scan::AnalysisError>(())
//! ```
//!
//! # Configuration Sections
//!
//! - [`DetectorParams`]: thresholds handed to the object detector
//! - [`RoiConfig`]: candidate generation and scoring
//! - [`RefineConfig`]: ROI tightening passes
//! - [`ClassifierConfig`]: color classification and override policy
//! - [`AssemblerConfig`]: deduplication and user-ROI filtering

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete pipeline configuration for tray analysis.
///
/// Contains all parameters needed to process an image from input to label
/// histogram. Can be serialized to/from JSON for reproducible deployments.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Detector invocation parameters
    pub detector: DetectorParams,

    /// ROI search configuration
    pub roi: RoiConfig,

    /// ROI refinement configuration
    pub refine: RefineConfig,

    /// Color classifier configuration
    pub classifier: ClassifierConfig,

    /// Result assembly configuration
    pub assembler: AssemblerConfig,
}

/// Thresholds handed to the object detector on every invocation.
///
/// The detector itself is an injected capability; these values are passed
/// through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorParams {
    /// Minimum detection confidence
    pub confidence: f32,

    /// Non-max-suppression IoU threshold
    pub iou: f32,

    /// Square inference input size in pixels
    pub input_size: u32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            confidence: 0.35,
            iou: 0.50,
            input_size: 1024,
        }
    }
}

/// ROI candidate generation and scoring parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiConfig {
    /// Scale factors applied to the seed half-extent, in evaluation order
    pub scales: Vec<f32>,

    /// Honor a user-supplied bounding box without searching
    pub respect_user_roi: bool,

    /// Outward padding applied to an honored user box (fraction of its size)
    pub user_pad: f32,

    /// Border margin below which a detection counts as edge-touching
    /// (fraction of candidate width/height)
    pub edge_margin: f32,

    /// Box-area / ROI-area density below which candidates are penalized
    pub density_min: f32,

    /// Density above which candidates are penalized
    pub density_max: f32,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            scales: vec![0.90, 1.00, 1.15, 1.30, 1.45],
            respect_user_roi: true,
            user_pad: 0.10,
            edge_margin: 0.08,
            density_min: 0.06,
            density_max: 0.22,
        }
    }
}

/// ROI tightening parameters for the second pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Minimum detection count before geometry-based tightening applies
    pub min_boxes: usize,

    /// Outward padding after percentile tightening (fraction of width/height)
    pub pad_ratio: f32,

    /// Outward padding around the color-mask contour (fraction of its max
    /// dimension)
    pub mask_pad: f32,

    /// Accept a tightened ROI only when its area shrinks to at most this
    /// fraction of the previous area
    pub shrink_factor: f64,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            min_boxes: 6,
            pad_ratio: 0.12,
            mask_pad: 0.10,
            shrink_factor: 0.90,
        }
    }
}

/// Color classification and label override parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Fraction of the crop's shorter dimension covered by the center disc
    pub center_shrink: f32,

    /// Saturation/value floor for "good" pixels (8-bit scale)
    pub sv_min: u8,

    /// Minimum good-pixel count for a classification attempt
    pub min_pixels: usize,

    /// Minimum classifier score required to override the detector's label
    pub color_override_min: f32,

    /// Detector confidence at or above which its label is always trusted
    pub model_trust: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            center_shrink: 0.60,
            sv_min: 50,
            min_pixels: 60,
            color_override_min: 0.60,
            model_trust: 0.62,
        }
    }
}

/// Deduplication and final filtering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Centroid-distance fraction (of the smaller box size) below which two
    /// detections collapse into one
    pub dedup_threshold: f32,

    /// Inward shrink of an honored user ROI before the inside filter
    /// (fraction of width/height per side)
    pub inside_shrink: f32,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            dedup_threshold: 0.45,
            inside_shrink: 0.03,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::config(format!("failed to read {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AnalysisError::config(format!("failed to parse {}", path.display()), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::config("failed to serialize configuration", e))?;
        std::fs::write(path, json)
            .map_err(|e| AnalysisError::config(format!("failed to write {}", path.display()), e))?;
        Ok(())
    }

    /// Validate parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.roi.scales.is_empty() {
            return Err(AnalysisError::InvalidParameter {
                parameter: "roi.scales".into(),
                value: "[]".into(),
            });
        }
        if self.roi.scales.iter().any(|s| *s <= 0.0) {
            return Err(AnalysisError::InvalidParameter {
                parameter: "roi.scales".into(),
                value: format!("{:?}", self.roi.scales),
            });
        }
        if !(0.0..=1.0).contains(&self.classifier.center_shrink) {
            return Err(AnalysisError::InvalidParameter {
                parameter: "classifier.center_shrink".into(),
                value: self.classifier.center_shrink.to_string(),
            });
        }
        if self.roi.density_min > self.roi.density_max {
            return Err(AnalysisError::InvalidParameter {
                parameter: "roi.density_min".into(),
                value: format!(
                    "{} > density_max {}",
                    self.roi.density_min, self.roi.density_max
                ),
            });
        }
        Ok(())
    }

    /// One-line summary for health/introspection endpoints
    pub fn summary(&self) -> String {
        format!(
            "conf={} iou={} input={} scales={:?} respect_user_roi={}",
            self.detector.confidence,
            self.detector.iou,
            self.detector.input_size,
            self.roi.scales,
            self.roi.respect_user_roi,
        )
    }
}
