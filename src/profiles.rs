//! Color class knowledge: HSV ranges, Lab reference centers, label aliases
//!
//! The five price classes are recognized through two independent signals:
//! rule-based HSV range membership and perceptual distance to a Lab reference
//! point. Hue uses the 8-bit OpenCV convention (0..=179) so red needs two
//! ranges wrapping at the 0/180 seam.

use image::Rgb;
use palette::Lab;

/// Canonical color labels, in pricing-table order
pub const CANONICAL_LABELS: [&str; 5] = ["red", "green", "blue", "pink", "purple"];

/// Inclusive HSV range (8-bit scale: hue 0..=179, saturation/value 0..=255)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub h1: u8,
    pub s1: u8,
    pub v1: u8,
    pub h2: u8,
    pub s2: u8,
    pub v2: u8,
}

impl HsvRange {
    pub const fn new(h1: u8, s1: u8, v1: u8, h2: u8, s2: u8, v2: u8) -> Self {
        Self { h1, s1, v1, h2, s2, v2 }
    }

    /// Range membership test
    pub fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        h >= self.h1 && h <= self.h2 && s >= self.s1 && s <= self.s2 && v >= self.v1 && v <= self.v2
    }

    /// Membership test with an additional saturation/value floor applied
    pub fn contains_with_floor(&self, h: u8, s: u8, v: u8, floor: u8) -> bool {
        h >= self.h1 && h <= self.h2
            && s >= self.s1.max(floor) && s <= self.s2
            && v >= self.v1.max(floor) && v <= self.v2
    }
}

/// Static description of one color class
#[derive(Debug, Clone)]
pub struct ColorProfile {
    /// Canonical label
    pub label: &'static str,
    /// HSV membership ranges (red wraps the hue seam, hence two entries)
    pub ranges: Vec<HsvRange>,
    /// Perceptual reference point in CIE Lab
    pub lab_center: Lab,
}

/// Build the standard class table, parameterized on the saturation/value floor
///
/// Purple skewers photograph darker and duller than the others, so its floor
/// is relaxed to `max(30, sv_min - 10)`.
pub fn standard_profiles(sv_min: u8) -> Vec<ColorProfile> {
    let purple_floor = sv_min.saturating_sub(10).max(30);
    vec![
        ColorProfile {
            label: "red",
            ranges: vec![
                HsvRange::new(0, sv_min, sv_min, 10, 255, 255),
                HsvRange::new(170, sv_min, sv_min, 179, 255, 255),
            ],
            lab_center: Lab::new(60.0, 80.0, 40.0),
        },
        ColorProfile {
            label: "green",
            ranges: vec![HsvRange::new(45, sv_min, sv_min, 85, 255, 255)],
            lab_center: Lab::new(70.0, -60.0, 60.0),
        },
        ColorProfile {
            label: "blue",
            ranges: vec![HsvRange::new(100, sv_min, sv_min, 130, 255, 255)],
            lab_center: Lab::new(35.0, 20.0, -60.0),
        },
        ColorProfile {
            label: "purple",
            ranges: vec![HsvRange::new(130, purple_floor, purple_floor, 155, 255, 255)],
            lab_center: Lab::new(45.0, 60.0, -35.0),
        },
        ColorProfile {
            label: "pink",
            ranges: vec![HsvRange::new(140, sv_min, sv_min, 170, 255, 255)],
            lab_center: Lab::new(70.0, 70.0, 10.0),
        },
    ]
}

/// Map a detector class name to its canonical label
///
/// Trims and lowercases, then resolves Thai menu names to canonical English
/// identifiers. Unknown names pass through lowercased so novel detector
/// classes still tally under a stable key.
pub fn normalize_label(raw: &str) -> String {
    let cleaned = raw.trim().to_lowercase();
    match cleaned.as_str() {
        "แดง" => "red".to_string(),
        "เขียว" => "green".to_string(),
        "น้ำเงิน" | "ฟ้า" => "blue".to_string(),
        "ชมพู" => "pink".to_string(),
        "ม่วง" => "purple".to_string(),
        _ => cleaned,
    }
}

/// Annotation color for a label (white for unknown labels)
pub fn label_color(label: &str) -> Rgb<u8> {
    match label {
        "red" => Rgb([255, 36, 36]),
        "green" => Rgb([75, 181, 58]),
        "blue" => Rgb([77, 106, 255]),
        "pink" => Rgb([255, 192, 203]),
        "purple" => Rgb([237, 130, 237]),
        _ => Rgb([255, 255, 255]),
    }
}
