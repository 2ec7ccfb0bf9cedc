//! Color space conversions between RGB, 8-bit HSV, and CIE Lab
//!
//! HSV uses the 8-bit convention common in vision pipelines: hue is halved
//! into 0..=179 so it fits a byte, saturation and value span 0..=255. Lab
//! conversions go through the `palette` crate and operate in true CIE L*a*b*
//! under D65.

use image::{GrayImage, Rgb, RgbImage};
use palette::{FromColor, IntoColor, Lab, Srgb};

/// Convert an RGB pixel to 8-bit HSV (hue 0..=179)
pub fn rgb_to_hsv8(rgb: Rgb<u8>) -> (u8, u8, u8) {
    let r = rgb[0] as f32 / 255.0;
    let g = rgb[1] as f32 / 255.0;
    let b = rgb[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { delta / max } else { 0.0 };

    let h_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    // Halve hue into a byte; 360 degrees maps onto 0..=179
    let h = ((h_deg / 2.0).round() as u16).min(179) as u8;
    let s = (s * 255.0).round() as u8;
    let v = (v * 255.0).round() as u8;
    (h, s, v)
}

/// Convert an RGB pixel to CIE Lab (D65)
pub fn rgb_to_lab(rgb: Rgb<u8>) -> Lab {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    Lab::from_color(srgb)
}

/// Convert a CIE Lab color back to RGB, clamped to the sRGB gamut
pub fn lab_to_rgb(lab: Lab) -> Rgb<u8> {
    let srgb: Srgb = lab.into_color();
    Rgb([
        (srgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (srgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (srgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    ])
}

/// Euclidean distance between two Lab points (delta E 76)
pub fn delta_e(a: Lab, b: Lab) -> f32 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    (dl * dl + da * da + db * db).sqrt()
}

/// Extract the lightness channel of an image as an 8-bit grayscale plane
///
/// L* (0..=100) is scaled into 0..=255 so histogram equalization can operate
/// on byte data.
pub fn luminance_channel(image: &RgbImage) -> GrayImage {
    let mut gray = GrayImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(gray.pixels_mut()) {
        let lab = rgb_to_lab(*src);
        dst[0] = (lab.l / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    gray
}

/// Rebuild an image from an adjusted lightness plane, keeping original a*/b*
pub fn merge_luminance(image: &RgbImage, luminance: &GrayImage) -> RgbImage {
    let mut out = RgbImage::new(image.width(), image.height());
    for ((src, lum), dst) in image
        .pixels()
        .zip(luminance.pixels())
        .zip(out.pixels_mut())
    {
        let mut lab = rgb_to_lab(*src);
        lab.l = lum[0] as f32 / 255.0 * 100.0;
        *dst = lab_to_rgb(lab);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(rgb_to_hsv8(Rgb([255, 0, 0])), (0, 255, 255));
        assert_eq!(rgb_to_hsv8(Rgb([0, 255, 0])), (60, 255, 255));
        assert_eq!(rgb_to_hsv8(Rgb([0, 0, 255])), (120, 255, 255));
    }

    #[test]
    fn test_hsv_neutrals_have_zero_saturation() {
        let (_, s, v) = rgb_to_hsv8(Rgb([0, 0, 0]));
        assert_eq!((s, v), (0, 0));
        let (_, s, v) = rgb_to_hsv8(Rgb([255, 255, 255]));
        assert_eq!((s, v), (0, 255));
        let (_, s, _) = rgb_to_hsv8(Rgb([128, 128, 128]));
        assert_eq!(s, 0);
    }

    #[test]
    fn test_hsv_red_wraps_near_seam() {
        // Slightly magenta-leaning red lands just below the 180 seam
        let (h, _, _) = rgb_to_hsv8(Rgb([255, 0, 30]));
        assert!(h >= 170, "expected wrapped hue, got {h}");
    }

    #[test]
    fn test_lab_extremes() {
        let black = rgb_to_lab(Rgb([0, 0, 0]));
        assert!(black.l < 1.0);
        let white = rgb_to_lab(Rgb([255, 255, 255]));
        assert!(white.l > 99.0);
        assert!(white.a.abs() < 1.0);
        assert!(white.b.abs() < 1.0);
    }

    #[test]
    fn test_lab_round_trip_is_close() {
        for rgb in [Rgb([200, 40, 40]), Rgb([60, 160, 60]), Rgb([50, 80, 220])] {
            let back = lab_to_rgb(rgb_to_lab(rgb));
            for c in 0..3 {
                assert!(
                    (back[c] as i32 - rgb[c] as i32).abs() <= 2,
                    "channel {c} drifted: {:?} -> {:?}",
                    rgb,
                    back
                );
            }
        }
    }

    #[test]
    fn test_delta_e_zero_for_identical() {
        let lab = rgb_to_lab(Rgb([120, 80, 40]));
        assert!(delta_e(lab, lab) < 0.001);
        let other = rgb_to_lab(Rgb([0, 120, 200]));
        assert!(delta_e(lab, other) > 10.0);
    }

    #[test]
    fn test_merge_luminance_preserves_hue() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([180, 40, 40]));
        image.put_pixel(1, 0, Rgb([40, 160, 40]));
        let mut lum = luminance_channel(&image);
        for p in lum.pixels_mut() {
            p[0] = p[0].saturating_add(30);
        }
        let merged = merge_luminance(&image, &lum);
        let (h0, _, _) = rgb_to_hsv8(*merged.get_pixel(0, 0));
        let (h1, _, _) = rgb_to_hsv8(*merged.get_pixel(1, 0));
        assert!(h0 <= 8 || h0 >= 172, "red hue drifted to {h0}");
        assert!((50..=70).contains(&h1), "green hue drifted to {h1}");
    }
}
