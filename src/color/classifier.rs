//! Two-signal color classification of item crops
//!
//! Each detected item is classified by the dominant color of its center
//! region. Two independent signals are fused: the fraction of saturated
//! pixels falling inside a class's HSV ranges, and the perceptual (Lab)
//! distance from the mean crop color to the class reference point. The HSV
//! signal is robust to lighting, the Lab signal disambiguates neighboring
//! hues such as purple and pink.

use crate::calibration::{gray_world, Clahe};
use crate::color::conversion::{delta_e, rgb_to_hsv8, rgb_to_lab};
use crate::config::ClassifierConfig;
use crate::profiles::{standard_profiles, ColorProfile};
use image::RgbImage;
use palette::Lab;

/// Weight of the HSV range signal in the fused score
const HSV_WEIGHT: f32 = 0.6;
/// Weight of the Lab distance signal
const LAB_WEIGHT: f32 = 0.4;
/// Lab distance at which the perceptual signal decays to 1/e
const LAB_FALLOFF: f32 = 30.0;

/// Result of classifying one crop
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Canonical color label
    pub label: String,
    /// Fused confidence in 0..=1
    pub score: f32,
}

/// Color classifier operating on item crops
pub struct ColorClassifier {
    config: ClassifierConfig,
    profiles: Vec<ColorProfile>,
    clahe: Clahe,
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorClassifier {
    /// Create a classifier with default configuration
    pub fn new() -> Self {
        Self::with_config(ClassifierConfig::default())
    }

    /// Create a classifier with custom configuration
    pub fn with_config(config: ClassifierConfig) -> Self {
        let profiles = standard_profiles(config.sv_min);
        Self {
            config,
            profiles,
            clahe: Clahe::new(),
        }
    }

    /// Classify a crop by its dominant center color
    ///
    /// Returns `None` when the crop is too small or too few pixels are
    /// saturated enough to carry a color opinion. The caller falls back to
    /// the detector's label in that case.
    pub fn classify(&self, crop: &RgbImage) -> Option<Classification> {
        let (width, height) = crop.dimensions();
        if width < 2 || height < 2 {
            return None;
        }

        let balanced = gray_world(crop);
        let enhanced = self.clahe.enhance_luminance(&balanced);

        let (samples, labs) = self.center_samples(&enhanced)?;

        let mut best: Option<Classification> = None;
        for profile in &self.profiles {
            let hits = samples
                .iter()
                .filter(|(h, s, v)| profile.ranges.iter().any(|r| r.contains(*h, *s, *v)))
                .count();
            let hsv_frac = hits as f32 / samples.len() as f32;
            let mean_dist = labs
                .iter()
                .map(|lab| delta_e(*lab, profile.lab_center))
                .sum::<f32>()
                / labs.len() as f32;
            let lab_score = (-mean_dist / LAB_FALLOFF).exp();
            let score = HSV_WEIGHT * hsv_frac + LAB_WEIGHT * lab_score;

            let better = best.as_ref().map(|b| score > b.score).unwrap_or(true);
            if better {
                best = Some(Classification {
                    label: profile.label.to_string(),
                    score,
                });
            }
        }
        best
    }

    /// Collect HSV and Lab samples of "good" pixels inside the center disc
    fn center_samples(&self, crop: &RgbImage) -> Option<(Vec<(u8, u8, u8)>, Vec<Lab>)> {
        let (width, height) = crop.dimensions();
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;
        let radius = self.config.center_shrink * width.min(height) as f32 / 2.0;
        let r2 = radius * radius;
        let floor = self.config.sv_min;

        let mut samples = Vec::new();
        let mut labs = Vec::new();
        for (x, y, p) in crop.enumerate_pixels() {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let (h, s, v) = rgb_to_hsv8(*p);
            if s < floor || v < floor {
                continue;
            }
            samples.push((h, s, v));
            labs.push(rgb_to_lab(*p));
        }

        if samples.len() < self.config.min_pixels {
            return None;
        }
        Some((samples, labs))
    }
}
