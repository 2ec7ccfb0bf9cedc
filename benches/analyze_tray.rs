use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};
use tray_scan::calibration::Clahe;
use tray_scan::color::ColorClassifier;
use tray_scan::detection::RoiSearch;

fn synthetic_tray(width: u32, height: u32) -> RgbImage {
    let mut image = RgbImage::from_pixel(width, height, Rgb([120, 120, 120]));
    let colors = [
        Rgb([220, 40, 40]),
        Rgb([60, 190, 60]),
        Rgb([50, 80, 220]),
        Rgb([255, 150, 190]),
        Rgb([150, 60, 200]),
    ];
    for (i, color) in colors.iter().enumerate() {
        let x0 = 60 + i as u32 * 70;
        for y in 100..160 {
            for x in x0..x0 + 60 {
                image.put_pixel(x, y, *color);
            }
        }
    }
    image
}

fn benchmark_seed_search(c: &mut Criterion) {
    let image = synthetic_tray(640, 480);
    let search = RoiSearch::new();
    c.bench_function("roi_seed_640x480", |b| {
        b.iter(|| black_box(search.seed_bbox(&image)))
    });
}

fn benchmark_classifier(c: &mut Criterion) {
    let mut crop = RgbImage::from_pixel(96, 96, Rgb([120, 120, 120]));
    for y in 18..78 {
        for x in 18..78 {
            crop.put_pixel(x, y, Rgb([220, 40, 40]));
        }
    }
    let classifier = ColorClassifier::new();
    c.bench_function("classify_crop_96x96", |b| {
        b.iter(|| black_box(classifier.classify(&crop)))
    });
}

fn benchmark_clahe(c: &mut Criterion) {
    let image = synthetic_tray(640, 480);
    let clahe = Clahe::new();
    c.bench_function("clahe_enhance_640x480", |b| {
        b.iter(|| black_box(clahe.enhance_luminance(&image)))
    });
}

criterion_group!(
    benches,
    benchmark_seed_search,
    benchmark_classifier,
    benchmark_clahe
);
criterion_main!(benches);
