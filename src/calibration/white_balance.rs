//! Gray-world white balance correction
//!
//! Assumes the average color of the scene should be neutral gray and scales
//! each channel toward the global mean. Tray photos are taken under mixed
//! restaurant lighting, so this cheap normalization runs before every
//! classification pass.

use image::RgbImage;

/// Maximum per-channel gain; avoids blowing out a channel when the scene is
/// strongly tinted
const MAX_GAIN: f32 = 4.0;

/// Apply gray-world white balance to an image
///
/// Each channel is scaled so its mean matches the mean of all three channels.
/// A black or single-channel image is returned unchanged.
pub fn gray_world(image: &RgbImage) -> RgbImage {
    let pixel_count = (image.width() as u64 * image.height() as u64).max(1);

    let mut sums = [0u64; 3];
    for p in image.pixels() {
        sums[0] += p[0] as u64;
        sums[1] += p[1] as u64;
        sums[2] += p[2] as u64;
    }

    let means = [
        sums[0] as f32 / pixel_count as f32,
        sums[1] as f32 / pixel_count as f32,
        sums[2] as f32 / pixel_count as f32,
    ];
    let gray = (means[0] + means[1] + means[2]) / 3.0;

    if gray <= 0.0 || means.iter().any(|m| *m <= 0.0) {
        return image.clone();
    }

    let gains = [
        (gray / means[0]).min(MAX_GAIN),
        (gray / means[1]).min(MAX_GAIN),
        (gray / means[2]).min(MAX_GAIN),
    ];

    let mut out = image.clone();
    for p in out.pixels_mut() {
        for c in 0..3 {
            p[c] = (p[c] as f32 * gains[c]).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
