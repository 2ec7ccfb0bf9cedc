//! Binary mask construction and contour extraction
//!
//! The ROI seed and the mask-based refinement pass both reduce the photo to a
//! binary "colorful stuff" mask, clean it up morphologically, and take the
//! largest external contour as the region of interest.

use crate::color::conversion::rgb_to_hsv8;
use crate::geometry::BoundingBox;
use crate::profiles::ColorProfile;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::filter::median_filter;
use imageproc::morphology::{dilate, erode};

const ON: Luma<u8> = Luma([255]);
const OFF: Luma<u8> = Luma([0]);

/// Mask of pixels whose saturation and value both exceed a threshold
///
/// This captures "colorful" foreground against the dull tray background.
pub fn saturation_value_mask(image: &RgbImage, s_min: u8, v_min: u8) -> GrayImage {
    let mut mask = GrayImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(mask.pixels_mut()) {
        let (_, s, v) = rgb_to_hsv8(*src);
        *dst = if s > s_min && v > v_min { ON } else { OFF };
    }
    mask
}

/// Union mask of pixels matching any known color class
pub fn color_classes_mask(image: &RgbImage, profiles: &[ColorProfile], floor: u8) -> GrayImage {
    let mut mask = GrayImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(mask.pixels_mut()) {
        let (h, s, v) = rgb_to_hsv8(*src);
        let hit = profiles
            .iter()
            .flat_map(|p| p.ranges.iter())
            .any(|r| r.contains_with_floor(h, s, v, floor));
        *dst = if hit { ON } else { OFF };
    }
    mask
}

/// Median-filter a mask to drop speckle noise
pub fn denoise(mask: &GrayImage, radius: u32) -> GrayImage {
    median_filter(mask, radius, radius)
}

/// Morphological opening: `iterations` erosions followed by as many dilations
pub fn morph_open(mask: &GrayImage, radius: u8, iterations: u32) -> GrayImage {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = erode(&out, Norm::LInf, radius);
    }
    for _ in 0..iterations {
        out = dilate(&out, Norm::LInf, radius);
    }
    out
}

/// Morphological closing: `iterations` dilations followed by as many erosions
///
/// All dilations run before the erosions, so two iterations with radius 4
/// bridge gaps of up to 16 pixels. Alternating the pair per iteration would
/// never merge blobs the first dilation cannot already reach.
pub fn morph_close(mask: &GrayImage, radius: u8, iterations: u32) -> GrayImage {
    let mut out = mask.clone();
    for _ in 0..iterations {
        out = dilate(&out, Norm::LInf, radius);
    }
    for _ in 0..iterations {
        out = erode(&out, Norm::LInf, radius);
    }
    out
}

/// Area enclosed by a contour via the shoelace formula
pub fn contour_area(contour: &Contour<u32>) -> f64 {
    let pts = &contour.points;
    if pts.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for i in 0..pts.len() {
        let a = &pts[i];
        let b = &pts[(i + 1) % pts.len()];
        twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    (twice_area.abs() as f64) / 2.0
}

/// Axis-aligned bounding box of a contour
pub fn contour_bbox(contour: &Contour<u32>) -> BoundingBox {
    let mut x1 = u32::MAX;
    let mut y1 = u32::MAX;
    let mut x2 = 0u32;
    let mut y2 = 0u32;
    for p in &contour.points {
        x1 = x1.min(p.x);
        y1 = y1.min(p.y);
        x2 = x2.max(p.x);
        y2 = y2.max(p.y);
    }
    if x1 > x2 || y1 > y2 {
        return BoundingBox::new(0, 0, 0, 0);
    }
    // Bottom-right is exclusive
    BoundingBox::new(x1 as i32, y1 as i32, x2 as i32 + 1, y2 as i32 + 1)
}

/// The largest external contour in a binary mask, by enclosed area
pub fn largest_external_contour(mask: &GrayImage) -> Option<Contour<u32>> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .max_by(|a, b| {
            contour_area(a)
                .partial_cmp(&contour_area(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}
