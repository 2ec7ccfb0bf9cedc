//! Annotated preview rendering
//!
//! Draws the selected region, the user's box when one was honored, and every
//! final detection onto a copy of the photo, then encodes the result as
//! base64 PNG for transport inside a JSON response.

use crate::detector::Detection;
use crate::error::{AnalysisError, Result};
use crate::geometry::BoundingBox;
use crate::profiles::label_color;
use ab_glyph::{FontVec, PxScale};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::io::Cursor;

/// Selected-region outline color
const ROI_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
/// User-box outline color
const USER_ROI_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
/// Label text size in pixels
const TEXT_SCALE: f32 = 20.0;
/// Vertical gap between a box and its label
const TEXT_OFFSET: i32 = 6;

/// Renders detection results onto the photo
///
/// Label text needs a font; without one only the boxes are drawn, which is
/// enough for debugging deployments that do not ship a font asset.
pub struct Annotator {
    font: Option<FontVec>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator {
    /// Annotator that draws boxes only
    pub fn new() -> Self {
        Self { font: None }
    }

    /// Annotator that also draws label text
    pub fn with_font(font: FontVec) -> Self {
        Self { font: Some(font) }
    }

    /// Draw the region outlines and detections onto a copy of the image
    pub fn render(
        &self,
        image: &RgbImage,
        detections: &[Detection],
        roi: BoundingBox,
        user_roi: Option<BoundingBox>,
    ) -> RgbImage {
        let mut canvas = image.clone();
        draw_box(&mut canvas, roi, ROI_COLOR);
        if let Some(user) = user_roi {
            draw_box(&mut canvas, user, USER_ROI_COLOR);
        }

        for det in detections {
            let color = label_color(&det.label);
            draw_box(&mut canvas, det.bbox, color);
            if let Some(font) = &self.font {
                let text = format!("{} {:.2}", det.label, det.confidence);
                let y = (det.bbox.y1 - TEXT_OFFSET - TEXT_SCALE as i32).max(0);
                draw_text_mut(
                    &mut canvas,
                    color,
                    det.bbox.x1,
                    y,
                    PxScale::from(TEXT_SCALE),
                    font,
                    &text,
                );
            }
        }
        canvas
    }

    /// Encode an annotated image as base64 PNG
    pub fn to_png_base64(&self, image: &RgbImage) -> Result<String> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image.clone())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| {
                AnalysisError::ProcessingError(format!("failed to encode preview: {e}"))
            })?;
        Ok(STANDARD.encode(buf))
    }
}

/// Two-pixel hollow rectangle
fn draw_box(canvas: &mut RgbImage, bbox: BoundingBox, color: Rgb<u8>) {
    let bbox = bbox.clamp_to_image(canvas.width(), canvas.height());
    if bbox.is_empty() {
        return;
    }
    for inset in 0..2 {
        let w = bbox.width() - 2 * inset;
        let h = bbox.height() - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(bbox.x1 + inset, bbox.y1 + inset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(bbox: BoundingBox, label: &str) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: 0.88,
            bbox,
            class_index: 0,
        }
    }

    #[test]
    fn test_render_draws_roi_and_detections() {
        let image = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let annotator = Annotator::new();
        let roi = BoundingBox::new(10, 10, 90, 90);
        let dets = vec![detection(BoundingBox::new(30, 30, 50, 50), "red")];
        let canvas = annotator.render(&image, &dets, roi, None);
        assert_eq!(*canvas.get_pixel(10, 50), ROI_COLOR);
        assert_eq!(*canvas.get_pixel(30, 40), label_color("red"));
        // Interior pixels untouched
        assert_eq!(*canvas.get_pixel(40, 40), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_render_marks_user_box() {
        let image = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let annotator = Annotator::new();
        let roi = BoundingBox::new(0, 0, 100, 100);
        let user = BoundingBox::new(20, 20, 80, 80);
        let canvas = annotator.render(&image, &[], roi, Some(user));
        assert_eq!(*canvas.get_pixel(20, 50), USER_ROI_COLOR);
    }

    #[test]
    fn test_png_base64_round_trip() {
        let image = RgbImage::from_pixel(8, 8, Rgb([5, 6, 7]));
        let encoded = Annotator::new().to_png_base64(&image).unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_degenerate_box_is_skipped() {
        let image = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
        let dets = vec![detection(BoundingBox::new(60, 60, 70, 70), "green")];
        // Fully outside the canvas: clamps to empty and draws nothing
        let canvas = Annotator::new().render(&image, &dets, BoundingBox::new(0, 0, 50, 50), None);
        assert_eq!(*canvas.get_pixel(49, 49), ROI_COLOR);
    }
}
