//! Image decoding and EXIF orientation handling
//!
//! Phone cameras store the sensor image unrotated and record the intended
//! orientation in EXIF. All pipeline coordinates are defined on the upright
//! image, so decoding applies the orientation transform before anything else
//! looks at pixels.

use crate::error::{AnalysisError, Result};
use exif::{In, Reader, Tag};
use image::{DynamicImage, RgbImage};
use std::io::Cursor;

/// Decode an image payload into an upright RGB image
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidImage`] when the payload is not a
/// decodable image.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::invalid_image("failed to decode image payload", e))?;
    let orientation = read_orientation(bytes);
    Ok(apply_orientation(decoded, orientation).to_rgb8())
}

/// EXIF orientation value, defaulting to 1 (upright) when absent or unreadable
fn read_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .unwrap_or(1),
        Err(_) => 1,
    }
}

/// Apply an EXIF orientation (1..=8) to a decoded image
fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([10, 20, 30]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_decode_round_trip() {
        let decoded = decode_image(&png_bytes(12, 8)).unwrap();
        assert_eq!(decoded.dimensions(), (12, 8));
        assert_eq!(*decoded.get_pixel(0, 0), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_garbage_payload_is_rejected() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidImage { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let mut image = RgbImage::from_pixel(4, 2, Rgb([0, 0, 0]));
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        let rotated = apply_orientation(DynamicImage::ImageRgb8(image), 6);
        assert_eq!(rotated.to_rgb8().dimensions(), (2, 4));
        // Top-left travels to the top-right corner under a 90 degree turn
        assert_eq!(*rotated.to_rgb8().get_pixel(1, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_unknown_orientation_is_identity() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(5, 3));
        assert_eq!(apply_orientation(image, 42).to_rgb8().dimensions(), (5, 3));
    }
}
