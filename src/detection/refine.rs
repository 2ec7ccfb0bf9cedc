//! Second-pass ROI tightening
//!
//! After the first detection pass the region can still carry dead margin.
//! Two tightening strategies run in order: percentile-trimming the detected
//! box coordinates (needs enough boxes to be statistically meaningful), and
//! falling back to the dominant color-mask contour when there are too few.
//! A tightened region is only accepted when it actually shrinks the area
//! enough to justify a re-detection pass.

use crate::config::RefineConfig;
use crate::detector::Detection;
use crate::geometry::BoundingBox;
use crate::mask;
use crate::profiles::standard_profiles;
use image::{imageops, RgbImage};
use tracing::debug;

/// Opening kernel radius and iterations for the refinement mask
const MASK_OPEN_RADIUS: u8 = 3;
const MASK_OPEN_ITERATIONS: u32 = 1;
/// Closing kernel radius and iterations for the refinement mask
const MASK_CLOSE_RADIUS: u8 = 4;
const MASK_CLOSE_ITERATIONS: u32 = 2;

/// Tightens a detected region for a second detection pass
pub struct RoiRefiner {
    config: RefineConfig,
}

impl Default for RoiRefiner {
    fn default() -> Self {
        Self::new()
    }
}

impl RoiRefiner {
    pub fn new() -> Self {
        Self::with_config(RefineConfig::default())
    }

    pub fn with_config(config: RefineConfig) -> Self {
        Self { config }
    }

    /// Tighten the region to the 5th..95th percentile envelope of the
    /// detected boxes, padded back out by `pad_ratio`
    ///
    /// Returns the (possibly unchanged) region and whether the shrink was
    /// large enough to accept. With fewer than `min_boxes` detections the
    /// percentiles are dominated by outliers, so the pass declines.
    pub fn tighten_by_detections(
        &self,
        detections: &[Detection],
        roi: BoundingBox,
    ) -> (BoundingBox, bool) {
        if detections.len() < self.config.min_boxes {
            return (roi, false);
        }

        let xs1: Vec<i32> = detections.iter().map(|d| d.bbox.x1).collect();
        let ys1: Vec<i32> = detections.iter().map(|d| d.bbox.y1).collect();
        let xs2: Vec<i32> = detections.iter().map(|d| d.bbox.x2).collect();
        let ys2: Vec<i32> = detections.iter().map(|d| d.bbox.y2).collect();

        let x1 = percentile(&xs1, 5.0);
        let y1 = percentile(&ys1, 5.0);
        let x2 = percentile(&xs2, 95.0);
        let y2 = percentile(&ys2, 95.0);

        let w = (x2 - x1).max(1);
        let h = (y2 - y1).max(1);
        let pad_x = (w as f32 * self.config.pad_ratio) as i32;
        let pad_y = (h as f32 * self.config.pad_ratio) as i32;

        let tightened =
            BoundingBox::new(x1 - pad_x, y1 - pad_y, x2 + pad_x, y2 + pad_y).clip_to(&roi);
        let changed = self.accepts_shrink(roi, tightened);
        debug!(?tightened, changed, "percentile tightening");
        (if changed { tightened } else { roi }, changed)
    }

    /// Tighten the region to the largest blob of known-class color inside it
    pub fn tighten_by_color_mask(
        &self,
        image: &RgbImage,
        roi: BoundingBox,
        sv_min: u8,
    ) -> (BoundingBox, bool) {
        let roi = roi.clamp_to_image(image.width(), image.height());
        if roi.is_empty() {
            return (roi, false);
        }
        let crop = imageops::crop_imm(
            image,
            roi.x1 as u32,
            roi.y1 as u32,
            roi.width() as u32,
            roi.height() as u32,
        )
        .to_image();

        let profiles = standard_profiles(sv_min);
        let raw = mask::color_classes_mask(&crop, &profiles, sv_min);
        let cleaned = mask::morph_close(
            &mask::morph_open(&raw, MASK_OPEN_RADIUS, MASK_OPEN_ITERATIONS),
            MASK_CLOSE_RADIUS,
            MASK_CLOSE_ITERATIONS,
        );

        let Some(contour) = mask::largest_external_contour(&cleaned) else {
            return (roi, false);
        };
        let blob = mask::contour_bbox(&contour);
        let pad = (self.config.mask_pad * blob.width().max(blob.height()) as f32) as i32;

        let tightened = BoundingBox::new(
            roi.x1 + (blob.x1 - pad).max(0),
            roi.y1 + (blob.y1 - pad).max(0),
            roi.x1 + (blob.x2 + pad).min(roi.width()),
            roi.y1 + (blob.y2 + pad).min(roi.height()),
        );
        let changed = self.accepts_shrink(roi, tightened);
        debug!(?tightened, changed, "color-mask tightening");
        (if changed { tightened } else { roi }, changed)
    }

    fn accepts_shrink(&self, old: BoundingBox, new: BoundingBox) -> bool {
        let area_old = old.area();
        let area_new = new.area().max(1);
        (area_new as f64) <= area_old as f64 * self.config.shrink_factor
    }
}

/// Linear-interpolated percentile, truncated to an integer coordinate
fn percentile(values: &[i32], p: f64) -> i32 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let frac = rank - lower as f64;
    (sorted[lower] as f64 + frac * (sorted[upper] - sorted[lower]) as f64) as i32
}
