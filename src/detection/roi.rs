//! Region-of-interest search
//!
//! The tray usually fills only part of the photo. Running the detector on
//! the full frame wastes resolution on background, so the pipeline first
//! finds a colorful seed blob, grows a family of square candidates around
//! it, runs the detector on each, and keeps the candidate whose detections
//! score best.

use crate::config::{DetectorParams, RoiConfig};
use crate::detector::{detect_on_region, Detection, Detector};
use crate::error::Result;
use crate::geometry::{square_from_center, BoundingBox};
use crate::mask;
use image::RgbImage;
use tracing::debug;

/// Saturation/value threshold for the seed blob mask
const SEED_SV_MIN: u8 = 60;
/// Median filter radius applied to the seed mask
const SEED_MEDIAN_RADIUS: u32 = 2;
/// Closing kernel radius and iteration count for the seed mask
const SEED_CLOSE_RADIUS: u8 = 4;
const SEED_CLOSE_ITERATIONS: u32 = 2;
/// Score assigned to a candidate with no detections at all
const EMPTY_SCORE: f32 = -1e9;

/// Per-detection reward and penalty weights in the candidate score
const COUNT_WEIGHT: f32 = 0.35;
const EDGE_PENALTY: f32 = 0.7;
const DENSITY_PENALTY: f32 = 25.0;

/// Searches for the best square region to run detection on
pub struct RoiSearch {
    config: RoiConfig,
}

impl Default for RoiSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl RoiSearch {
    pub fn new() -> Self {
        Self::with_config(RoiConfig::default())
    }

    pub fn with_config(config: RoiConfig) -> Self {
        Self { config }
    }

    /// Bounding box of the largest colorful blob, or the full image when the
    /// photo has no saturated content at all
    pub fn seed_bbox(&self, image: &RgbImage) -> BoundingBox {
        let raw = mask::saturation_value_mask(image, SEED_SV_MIN, SEED_SV_MIN);
        let cleaned = mask::morph_close(
            &mask::denoise(&raw, SEED_MEDIAN_RADIUS),
            SEED_CLOSE_RADIUS,
            SEED_CLOSE_ITERATIONS,
        );
        match mask::largest_external_contour(&cleaned) {
            Some(contour) => {
                let bbox = mask::contour_bbox(&contour);
                debug!(?bbox, "seed blob located");
                bbox
            }
            None => {
                debug!("no colorful blob, seeding from full image");
                BoundingBox::full_image(image.width(), image.height())
            }
        }
    }

    /// Square candidates grown around a seed box, one per configured scale
    pub fn candidates(&self, seed: BoundingBox, width: u32, height: u32) -> Vec<BoundingBox> {
        let (cx, cy) = seed.center();
        let base_half = seed.width().max(seed.height()) as f32 / 2.0;
        self.config
            .scales
            .iter()
            .map(|scale| square_from_center(cx, cy, base_half * scale, width, height))
            .collect()
    }

    /// Score a candidate by its detections
    ///
    /// Rewards confident, numerous detections; penalizes boxes hugging the
    /// candidate border (the region is probably cutting items off) and
    /// detection densities outside the plausible band for a packed tray.
    pub fn score_candidate(&self, detections: &[Detection], roi: BoundingBox) -> f32 {
        if detections.is_empty() {
            return EMPTY_SCORE;
        }
        let w = (roi.width() as f32).max(1.0);
        let h = (roi.height() as f32).max(1.0);
        let roi_area = w * h;

        let mut sum_conf = 0.0f32;
        let mut box_area = 0.0f32;
        let mut edge_touch = 0u32;
        for det in detections {
            sum_conf += det.confidence;
            box_area += det.bbox.area() as f32;
            let b = det.bbox;
            let touches = (b.x1 - roi.x1) as f32 / w < self.config.edge_margin
                || (roi.y2 - b.y2) as f32 / h < self.config.edge_margin
                || (b.y1 - roi.y1) as f32 / h < self.config.edge_margin
                || (roi.x2 - b.x2) as f32 / w < self.config.edge_margin;
            if touches {
                edge_touch += 1;
            }
        }

        let density = box_area / roi_area;
        let density_penalty = if density < self.config.density_min {
            (self.config.density_min - density) * DENSITY_PENALTY
        } else if density > self.config.density_max {
            (density - self.config.density_max) * DENSITY_PENALTY
        } else {
            0.0
        };

        sum_conf + COUNT_WEIGHT * detections.len() as f32
            - (EDGE_PENALTY * edge_touch as f32 + density_penalty)
    }

    /// Run the detector over every candidate and keep the best-scoring one
    ///
    /// `seed` overrides the blob seed when the caller already has a region
    /// hint. Ties go to the earlier (smaller-scale) candidate; if nothing is
    /// detected anywhere, the first candidate is returned with no detections.
    pub fn select(
        &self,
        detector: &dyn Detector,
        image: &RgbImage,
        params: &DetectorParams,
        seed: Option<BoundingBox>,
    ) -> Result<(BoundingBox, Vec<Detection>)> {
        let seed = seed.unwrap_or_else(|| self.seed_bbox(image));
        let candidates = self.candidates(seed, image.width(), image.height());

        let mut best: Option<(f32, BoundingBox, Vec<Detection>)> = None;
        for roi in candidates {
            let detections = detect_on_region(detector, image, roi, params)?;
            let score = self.score_candidate(&detections, roi);
            debug!(?roi, score, count = detections.len(), "candidate scored");
            let better = best.as_ref().map(|(s, _, _)| score > *s).unwrap_or(true);
            if better {
                best = Some((score, roi, detections));
            }
        }

        match best {
            Some((score, roi, detections)) => {
                debug!(?roi, score, "region selected");
                Ok((roi, detections))
            }
            // Unreachable while scales is validated non-empty
            None => Ok((
                BoundingBox::full_image(image.width(), image.height()),
                Vec::new(),
            )),
        }
    }
}
