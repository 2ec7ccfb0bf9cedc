//! Object detector seam and detection types
//!
//! The pipeline does not bundle a model. Callers inject anything that can
//! turn an image crop into boxes (an ONNX session, a remote inference
//! service, a test stub) through the [`Detector`] trait, and the pipeline
//! handles coordinate translation, label normalization, and everything
//! downstream.

use crate::config::DetectorParams;
use crate::error::Result;
use crate::geometry::BoundingBox;
use crate::profiles::normalize_label;
use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};

/// One box straight out of a detector, in crop-local pixel coordinates
#[derive(Debug, Clone, Copy)]
pub struct RawDetection {
    /// `(x1, y1, x2, y2)` within the crop handed to the detector
    pub bbox: [f32; 4],
    /// Index into the detector's class name table
    pub class_index: usize,
    /// Detection confidence in 0..=1
    pub confidence: f32,
}

/// One detected item in full-image coordinates with a normalized label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Canonical color label
    pub label: String,
    /// Detector confidence in 0..=1
    pub confidence: f32,
    /// Box in post-orientation full-image pixel coordinates
    pub bbox: BoundingBox,
    /// Detector class index, kept for diagnostics
    pub class_index: usize,
}

/// An injected object detection capability
///
/// The pipeline only borrows a detector for the duration of one call, so no
/// thread-safety bounds are imposed here; callers that share a detector
/// across threads add their own.
pub trait Detector {
    /// Run detection on a crop
    ///
    /// Returned boxes are in the crop's own coordinate system.
    ///
    /// # Errors
    ///
    /// Implementations should return [`crate::AnalysisError::DetectorUnavailable`]
    /// when the underlying model or service cannot be reached.
    fn detect(&self, crop: &RgbImage, params: &DetectorParams) -> Result<Vec<RawDetection>>;

    /// Class name table the detector's indices refer to
    fn class_names(&self) -> &[String];
}

/// Run the detector on a region and lift results into full-image coordinates
///
/// Crop-local boxes are offset by the region origin, clamped to the image,
/// and degenerate boxes are dropped. Class indices outside the detector's
/// name table are dropped as well.
pub fn detect_on_region(
    detector: &dyn Detector,
    image: &RgbImage,
    region: BoundingBox,
    params: &DetectorParams,
) -> Result<Vec<Detection>> {
    let region = region.clamp_to_image(image.width(), image.height());
    if region.is_empty() {
        return Ok(Vec::new());
    }

    let crop = imageops::crop_imm(
        image,
        region.x1 as u32,
        region.y1 as u32,
        region.width() as u32,
        region.height() as u32,
    )
    .to_image();

    let raw = detector.detect(&crop, params)?;
    let names = detector.class_names();

    let mut detections = Vec::with_capacity(raw.len());
    for r in raw {
        let Some(name) = names.get(r.class_index) else {
            continue;
        };
        let bbox = BoundingBox::new(
            (r.bbox[0] + region.x1 as f32).round() as i32,
            (r.bbox[1] + region.y1 as f32).round() as i32,
            (r.bbox[2] + region.x1 as f32).round() as i32,
            (r.bbox[3] + region.y1 as f32).round() as i32,
        )
        .clamp_to_image(image.width(), image.height());
        if bbox.is_empty() {
            continue;
        }
        detections.push(Detection {
            label: normalize_label(name),
            confidence: r.confidence,
            bbox,
            class_index: r.class_index,
        });
    }
    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Returns fixed crop-local boxes regardless of input
    struct FixedDetector {
        boxes: Vec<RawDetection>,
        names: Vec<String>,
    }

    impl Detector for FixedDetector {
        fn detect(&self, _crop: &RgbImage, _params: &DetectorParams) -> Result<Vec<RawDetection>> {
            Ok(self.boxes.clone())
        }

        fn class_names(&self) -> &[String] {
            &self.names
        }
    }

    #[test]
    fn test_crop_local_boxes_are_lifted() {
        let image = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));
        let detector = FixedDetector {
            boxes: vec![RawDetection {
                bbox: [10.0, 10.0, 30.0, 30.0],
                class_index: 0,
                confidence: 0.9,
            }],
            names: vec!["แดง".to_string()],
        };
        let region = BoundingBox::new(50, 60, 150, 160);
        let out = detect_on_region(&detector, &image, region, &DetectorParams::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bbox, BoundingBox::new(60, 70, 80, 90));
        assert_eq!(out[0].label, "red");
    }

    #[test]
    fn test_unknown_class_index_dropped() {
        let image = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let detector = FixedDetector {
            boxes: vec![RawDetection {
                bbox: [1.0, 1.0, 10.0, 10.0],
                class_index: 7,
                confidence: 0.8,
            }],
            names: vec!["red".to_string()],
        };
        let region = BoundingBox::full_image(100, 100);
        let out = detect_on_region(&detector, &image, region, &DetectorParams::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_region_short_circuits() {
        let image = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let detector = FixedDetector {
            boxes: vec![],
            names: vec![],
        };
        let region = BoundingBox::new(50, 50, 50, 80);
        let out = detect_on_region(&detector, &image, region, &DetectorParams::default()).unwrap();
        assert!(out.is_empty());
    }
}
