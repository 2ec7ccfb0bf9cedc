//! Contrast-limited adaptive histogram equalization (CLAHE)
//!
//! Works on the lightness plane only. Each tile gets its own clipped
//! equalization LUT and pixels interpolate bilinearly between the four
//! surrounding tile LUTs, which lifts local contrast without amplifying
//! noise the way plain histogram equalization does.

use crate::color::conversion::{luminance_channel, merge_luminance};
use image::{GrayImage, RgbImage};

/// CLAHE parameters
#[derive(Debug, Clone, Copy)]
pub struct ClaheParams {
    /// Clip limit relative to a uniform histogram bin
    pub clip_limit: f32,
    /// Tile grid dimensions (columns, rows)
    pub tile_grid: (u32, u32),
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            clip_limit: 2.0,
            tile_grid: (8, 8),
        }
    }
}

/// Adaptive histogram equalizer
pub struct Clahe {
    params: ClaheParams,
}

impl Default for Clahe {
    fn default() -> Self {
        Self::new()
    }
}

impl Clahe {
    pub fn new() -> Self {
        Self {
            params: ClaheParams::default(),
        }
    }

    pub fn with_params(params: ClaheParams) -> Self {
        Self { params }
    }

    /// Equalize a grayscale plane
    ///
    /// Images smaller than the tile grid are returned unchanged.
    pub fn equalize(&self, gray: &GrayImage) -> GrayImage {
        let (width, height) = gray.dimensions();
        let (cols, rows) = self.params.tile_grid;
        if width < cols || height < rows || width == 0 || height == 0 {
            return gray.clone();
        }

        let tile_w = width.div_ceil(cols);
        let tile_h = height.div_ceil(rows);
        let luts = self.tile_luts(gray, cols, rows, tile_w, tile_h);

        let mut out = GrayImage::new(width, height);
        for (x, y, p) in gray.enumerate_pixels() {
            // Position relative to tile centers, for bilinear blending
            let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;

            let cx0 = fx.floor().max(0.0) as u32;
            let cy0 = fy.floor().max(0.0) as u32;
            let cx0 = cx0.min(cols - 1);
            let cy0 = cy0.min(rows - 1);
            let cx1 = (cx0 + 1).min(cols - 1);
            let cy1 = (cy0 + 1).min(rows - 1);

            let wx = (fx - fx.floor()).clamp(0.0, 1.0);
            let wy = (fy - fy.floor()).clamp(0.0, 1.0);
            let wx = if fx < 0.0 { 0.0 } else { wx };
            let wy = if fy < 0.0 { 0.0 } else { wy };

            let v = p[0] as usize;
            let top = luts[(cy0 * cols + cx0) as usize][v] as f32 * (1.0 - wx)
                + luts[(cy0 * cols + cx1) as usize][v] as f32 * wx;
            let bottom = luts[(cy1 * cols + cx0) as usize][v] as f32 * (1.0 - wx)
                + luts[(cy1 * cols + cx1) as usize][v] as f32 * wx;
            let blended = top * (1.0 - wy) + bottom * wy;
            out.put_pixel(x, y, image::Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
        out
    }

    /// Enhance the lightness channel of a color image, leaving chroma alone
    pub fn enhance_luminance(&self, image: &RgbImage) -> RgbImage {
        let lum = luminance_channel(image);
        let equalized = self.equalize(&lum);
        merge_luminance(image, &equalized)
    }

    fn tile_luts(
        &self,
        gray: &GrayImage,
        cols: u32,
        rows: u32,
        tile_w: u32,
        tile_h: u32,
    ) -> Vec<[u8; 256]> {
        let (width, height) = gray.dimensions();
        let mut luts = Vec::with_capacity((cols * rows) as usize);

        for ty in 0..rows {
            for tx in 0..cols {
                let x0 = tx * tile_w;
                let y0 = ty * tile_h;
                let x1 = (x0 + tile_w).min(width);
                let y1 = (y0 + tile_h).min(height);

                let mut hist = [0u32; 256];
                let mut count = 0u32;
                for y in y0..y1 {
                    for x in x0..x1 {
                        hist[gray.get_pixel(x, y)[0] as usize] += 1;
                        count += 1;
                    }
                }
                luts.push(clipped_lut(&mut hist, count, self.params.clip_limit));
            }
        }
        luts
    }
}

/// Clip a tile histogram and build its equalization LUT
///
/// The clip limit scales with tile size; clipped mass is redistributed
/// uniformly across all bins.
fn clipped_lut(hist: &mut [u32; 256], count: u32, clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    if count == 0 {
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = i as u8;
        }
        return lut;
    }

    let limit = ((clip_limit * count as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let per_bin = excess / 256;
    for bin in hist.iter_mut() {
        *bin += per_bin;
    }
    // Spread the integer remainder evenly with a stride; piling it into the
    // low bins would skew the CDF and wash bright crops out to white
    let residual = (excess % 256) as usize;
    if residual > 0 {
        let step = (256 / residual).max(1);
        let mut placed = 0;
        let mut i = 0;
        while placed < residual && i < 256 {
            hist[i] += 1;
            placed += 1;
            i += step;
        }
    }

    let mut cdf = 0u64;
    for (i, bin) in hist.iter().enumerate() {
        cdf += *bin as u64;
        lut[i] = (cdf * 255 / count as u64).min(255) as u8;
    }
    lut
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_uniform_image_stays_uniform() {
        let gray = GrayImage::from_pixel(64, 64, Luma([100]));
        let out = Clahe::new().equalize(&gray);
        let first = out.get_pixel(0, 0)[0];
        assert!(out.pixels().all(|p| p[0] == first));
    }

    #[test]
    fn test_low_contrast_is_stretched() {
        // Values compressed into a narrow band around mid-gray
        let mut gray = GrayImage::new(64, 64);
        for (x, y, p) in gray.enumerate_pixels_mut() {
            p[0] = 110 + ((x + y) % 20) as u8;
        }
        let out = Clahe::new().equalize(&gray);
        let (min, max) = out
            .pixels()
            .fold((255u8, 0u8), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
        assert!(max - min > 40, "contrast not stretched: {min}..{max}");
    }

    #[test]
    fn test_mid_gray_is_not_blown_out() {
        // Tiny tiles clip almost the whole histogram; the redistributed mass
        // must not pile up below the occupied bin and drag it toward 255
        let gray = GrayImage::from_pixel(64, 64, Luma([100]));
        let out = Clahe::new().equalize(&gray);
        let v = out.get_pixel(32, 32)[0];
        assert!((80..=140).contains(&v), "mid-gray mapped to {v}");
    }

    #[test]
    fn test_enhance_keeps_saturated_colors_saturated() {
        use crate::color::conversion::rgb_to_hsv8;
        let mut image = RgbImage::from_pixel(64, 64, image::Rgb([128, 128, 128]));
        for y in 16..48 {
            for x in 16..48 {
                image.put_pixel(x, y, image::Rgb([50, 80, 220]));
            }
        }
        let out = Clahe::new().enhance_luminance(&image);
        let (h, s, _) = rgb_to_hsv8(*out.get_pixel(32, 32));
        assert!((100..=130).contains(&h), "blue hue drifted to {h}");
        assert!(s >= 50, "saturation collapsed to {s}");
    }

    #[test]
    fn test_tiny_image_passthrough() {
        let gray = GrayImage::from_pixel(4, 4, Luma([42]));
        let out = Clahe::new().equalize(&gray);
        assert_eq!(out, gray);
    }

    #[test]
    fn test_enhance_luminance_keeps_dimensions() {
        let image = RgbImage::from_pixel(32, 48, image::Rgb([90, 60, 60]));
        let out = Clahe::new().enhance_luminance(&image);
        assert_eq!(out.dimensions(), (32, 48));
    }
}
