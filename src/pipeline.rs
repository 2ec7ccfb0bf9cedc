//! End-to-end tray analysis
//!
//! Wires the stages together: decode, region search (or honoring a
//! user-supplied box), refinement with re-detection, color-based label
//! override, center-distance deduplication, and result assembly with an
//! annotated preview.

use crate::annotate::Annotator;
use crate::color::ColorClassifier;
use crate::config::PipelineConfig;
use crate::detection::{RoiRefiner, RoiSearch};
use crate::detector::{detect_on_region, Detection, Detector};
use crate::error::Result;
use crate::geometry::BoundingBox;
use crate::imageio::decode_image;
use ab_glyph::FontVec;
use image::{imageops, RgbImage};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Complete result of analyzing one tray photo
#[derive(Debug, Clone, Serialize)]
pub struct TrayAnalysis {
    /// Item count per canonical label
    pub counts: BTreeMap<String, usize>,
    /// Sum of all counts
    pub total_items: usize,
    /// Final detections after override, filtering, and deduplication
    pub detections: Vec<Detection>,
    /// Region the final detection pass ran on
    pub roi: BoundingBox,
    /// Annotated preview as base64 PNG
    pub annotated_png_base64: String,
}

/// Tray photo analyzer
///
/// Holds the configured pipeline stages; the object detector itself is
/// injected per call so one analyzer can serve models that are swapped at
/// runtime.
pub struct TrayAnalyzer {
    config: PipelineConfig,
    roi_search: RoiSearch,
    refiner: RoiRefiner,
    classifier: ColorClassifier,
    annotator: Annotator,
}

impl Default for TrayAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TrayAnalyzer {
    /// Analyzer with default configuration
    pub fn new() -> Self {
        // Defaults always validate
        Self::assemble(PipelineConfig::default())
    }

    /// Analyzer with custom configuration
    ///
    /// # Errors
    ///
    /// Returns [`crate::AnalysisError::InvalidParameter`] when the
    /// configuration fails validation.
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config))
    }

    /// Supply a font for label text in the annotated preview
    pub fn set_font(&mut self, font: FontVec) {
        self.annotator = Annotator::with_font(font);
    }

    fn assemble(config: PipelineConfig) -> Self {
        let roi_search = RoiSearch::with_config(config.roi.clone());
        let refiner = RoiRefiner::with_config(config.refine.clone());
        let classifier = ColorClassifier::with_config(config.classifier.clone());
        Self {
            config,
            roi_search,
            refiner,
            classifier,
            annotator: Annotator::new(),
        }
    }

    /// Analyze an encoded photo
    ///
    /// `bbox` is an optional user region hint, either a JSON array
    /// (`[x1, y1, x2, y2]`) or comma-separated coordinates. Malformed or
    /// degenerate hints are silently ignored.
    pub fn analyze_bytes(
        &self,
        detector: &dyn Detector,
        bytes: &[u8],
        bbox: Option<&str>,
    ) -> Result<TrayAnalysis> {
        let image = decode_image(bytes)?;
        let user_roi = bbox.and_then(|raw| parse_bbox(raw, image.width(), image.height()));
        self.analyze_image(detector, &image, user_roi)
    }

    /// Analyze a decoded, upright photo
    pub fn analyze_image(
        &self,
        detector: &dyn Detector,
        image: &RgbImage,
        user_roi: Option<BoundingBox>,
    ) -> Result<TrayAnalysis> {
        let (width, height) = image.dimensions();
        info!(width, height, user_roi = ?user_roi, "analyzing tray photo");

        let honored = user_roi.is_some() && self.config.roi.respect_user_roi;
        let params = &self.config.detector;

        let (mut roi, mut detections) = if honored {
            let roi = user_roi
                .unwrap_or_else(|| BoundingBox::full_image(width, height))
                .pad_fraction(self.config.roi.user_pad, width, height);
            let detections = detect_on_region(detector, image, roi, params)?;
            (roi, detections)
        } else {
            self.roi_search.select(detector, image, params, user_roi)?
        };

        if !honored {
            let (tightened, mut changed) = self.refiner.tighten_by_detections(&detections, roi);
            let tightened = if changed {
                tightened
            } else {
                let (by_mask, mask_changed) =
                    self.refiner
                        .tighten_by_color_mask(image, roi, self.config.classifier.sv_min);
                changed = mask_changed;
                by_mask
            };
            if changed {
                roi = tightened;
                detections = detect_on_region(detector, image, roi, params)?;
                debug!(?roi, count = detections.len(), "re-detected on tightened region");
            }
        }

        if honored {
            detections = filter_inside(
                &detections,
                roi,
                self.config.assembler.inside_shrink,
            );
        }

        self.override_labels(image, &mut detections);
        let detections = dedupe_by_center(detections, self.config.assembler.dedup_threshold);

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for det in &detections {
            *counts.entry(det.label.clone()).or_insert(0) += 1;
        }
        let total_items = counts.values().sum();

        let canvas = self.annotator.render(image, &detections, roi, user_roi);
        let annotated_png_base64 = self.annotator.to_png_base64(&canvas)?;

        info!(total_items, ?roi, "analysis complete");
        Ok(TrayAnalysis {
            counts,
            total_items,
            detections,
            roi,
            annotated_png_base64,
        })
    }

    /// Replace weak detector labels when the color classifier is confident
    fn override_labels(&self, image: &RgbImage, detections: &mut [Detection]) {
        let cfg = &self.config.classifier;
        for det in detections.iter_mut() {
            if det.confidence >= cfg.model_trust {
                continue;
            }
            let bbox = det.bbox.clamp_to_image(image.width(), image.height());
            if bbox.is_empty() {
                continue;
            }
            let crop = imageops::crop_imm(
                image,
                bbox.x1 as u32,
                bbox.y1 as u32,
                bbox.width() as u32,
                bbox.height() as u32,
            )
            .to_image();
            if let Some(result) = self.classifier.classify(&crop) {
                if result.score >= cfg.color_override_min && result.label != det.label {
                    debug!(
                        from = %det.label,
                        to = %result.label,
                        score = result.score,
                        confidence = det.confidence,
                        "color override"
                    );
                    det.label = result.label;
                }
            }
        }
    }
}

/// Parse a user bounding-box hint
///
/// Accepts a JSON array or comma-separated `x1,y1,x2,y2`. Coordinates are
/// clamped to the image; hints smaller than five pixels in either dimension
/// (or otherwise malformed) are discarded.
pub fn parse_bbox(raw: &str, width: u32, height: u32) -> Option<BoundingBox> {
    let trimmed = raw.trim();
    let values: Vec<f64> = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<f64>>(trimmed).ok()?
    } else {
        trimmed
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .ok()?
    };
    if values.len() != 4 {
        return None;
    }

    let w = width as i32;
    let h = height as i32;
    let x1 = (values[0] as i32).clamp(0, w - 1);
    let y1 = (values[1] as i32).clamp(0, h - 1);
    let x2 = (values[2] as i32).clamp(0, w);
    let y2 = (values[3] as i32).clamp(0, h);
    if x2 > x1 + 5 && y2 > y1 + 5 {
        Some(BoundingBox::new(x1, y1, x2, y2))
    } else {
        None
    }
}

/// Collapse detections whose centers nearly coincide
///
/// Detections are visited in descending confidence order; a detection is
/// dropped when its center lies within `threshold` times the smaller of the
/// two box sizes from an already-kept detection.
pub fn dedupe_by_center(mut detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let (cx, cy) = det.bbox.center();
        let size = det.bbox.size();
        let duplicate = kept.iter().any(|existing| {
            let (ex, ey) = existing.bbox.center();
            let dist = ((cx - ex).powi(2) + (cy - ey).powi(2)).sqrt();
            dist < threshold * size.min(existing.bbox.size())
        });
        if !duplicate {
            kept.push(det);
        }
    }
    kept
}

/// Keep detections whose centers fall inside the shrunken region
pub fn filter_inside(detections: &[Detection], roi: BoundingBox, shrink: f32) -> Vec<Detection> {
    let inner = roi.shrink_fraction(shrink);
    detections
        .iter()
        .filter(|det| {
            let (cx, cy) = det.bbox.center();
            inner.contains_point(cx, cy)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(bbox: BoundingBox, label: &str, confidence: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox,
            class_index: 0,
        }
    }

    #[test]
    fn test_parse_bbox_json_form() {
        let bbox = parse_bbox("[10, 20, 110, 220]", 640, 480).unwrap();
        assert_eq!(bbox, BoundingBox::new(10, 20, 110, 220));
    }

    #[test]
    fn test_parse_bbox_csv_form() {
        let bbox = parse_bbox(" 10, 20.5 ,110,220 ", 640, 480).unwrap();
        assert_eq!(bbox, BoundingBox::new(10, 20, 110, 220));
    }

    #[test]
    fn test_parse_bbox_clamps_to_image() {
        let bbox = parse_bbox("-50,-50,9999,9999", 640, 480).unwrap();
        assert_eq!(bbox, BoundingBox::new(0, 0, 640, 480));
    }

    #[test]
    fn test_parse_bbox_rejects_garbage() {
        assert!(parse_bbox("not a box", 640, 480).is_none());
        assert!(parse_bbox("[1,2,3]", 640, 480).is_none());
        assert!(parse_bbox("1,2,3,4,5", 640, 480).is_none());
        assert!(parse_bbox("[\"a\",\"b\",\"c\",\"d\"]", 640, 480).is_none());
    }

    #[test]
    fn test_parse_bbox_rejects_tiny_box() {
        // Five pixels or fewer in either dimension is too small to mean much
        assert!(parse_bbox("10,10,15,200", 640, 480).is_none());
        assert!(parse_bbox("10,10,200,15", 640, 480).is_none());
        assert!(parse_bbox("10,10,16,16", 640, 480).is_some());
    }

    #[test]
    fn test_dedupe_keeps_higher_confidence() {
        let dets = vec![
            detection(BoundingBox::new(100, 100, 140, 140), "red", 0.6),
            detection(BoundingBox::new(102, 102, 142, 142), "pink", 0.9),
        ];
        let kept = dedupe_by_center(dets, 0.45);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, "pink");
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_dedupe_keeps_distinct_items() {
        let dets = vec![
            detection(BoundingBox::new(100, 100, 140, 140), "red", 0.8),
            detection(BoundingBox::new(200, 100, 240, 140), "green", 0.7),
        ];
        assert_eq!(dedupe_by_center(dets, 0.45).len(), 2);
    }

    #[test]
    fn test_dedupe_threshold_scales_with_smaller_box() {
        // Small box near a large one: distance compared against the small size
        let dets = vec![
            detection(BoundingBox::new(0, 0, 200, 200), "red", 0.9),
            detection(BoundingBox::new(90, 90, 110, 110), "red", 0.5),
        ];
        // Centers coincide at (100,100); 0 < 0.45 * 20
        assert_eq!(dedupe_by_center(dets, 0.45).len(), 1);
    }

    #[test]
    fn test_dedupe_is_idempotent() {
        let dets = vec![
            detection(BoundingBox::new(100, 100, 140, 140), "red", 0.9),
            detection(BoundingBox::new(103, 101, 143, 141), "red", 0.7),
            detection(BoundingBox::new(105, 104, 145, 144), "pink", 0.6),
            detection(BoundingBox::new(200, 100, 240, 140), "green", 0.8),
        ];
        let once = dedupe_by_center(dets.clone(), 0.45);
        let twice = dedupe_by_center(once.clone(), 0.45);
        assert!(once.len() < dets.len());
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.bbox, b.bbox);
            assert_eq!(a.label, b.label);
        }
    }

    #[test]
    fn test_filter_inside_uses_centers() {
        let roi = BoundingBox::new(0, 0, 100, 100);
        let dets = vec![
            detection(BoundingBox::new(40, 40, 60, 60), "red", 0.8),
            // Center at (1.5, 50): inside roi but outside the shrunken band
            detection(BoundingBox::new(0, 40, 3, 60), "red", 0.8),
        ];
        let kept = filter_inside(&dets, roi, 0.03);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bbox, BoundingBox::new(40, 40, 60, 60));
    }
}
