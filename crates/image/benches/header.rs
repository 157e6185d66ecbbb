//! Benchmarks for header inspection.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gfr_image::{detect_format, read_dimensions};

fn png_header() -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&1920u32.to_be_bytes());
    data.extend_from_slice(&1080u32.to_be_bytes());
    data
}

fn jpeg_with_exif(exif_len: usize) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE1];
    data.extend_from_slice(&((exif_len + 2) as u16).to_be_bytes());
    data.resize(data.len() + exif_len, 0);
    data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x0B, 0xD0, 0x0F, 0xC0]);
    data
}

fn bench_format_detection(c: &mut Criterion) {
    let jpeg_data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
    let png_data = png_header();

    c.bench_function("detect_jpeg", |b| b.iter(|| detect_format(black_box(&jpeg_data))));
    c.bench_function("detect_png", |b| b.iter(|| detect_format(black_box(&png_data))));
}

fn bench_dimensions(c: &mut Criterion) {
    let png_data = png_header();
    let jpeg_data = jpeg_with_exif(16 * 1024);

    c.bench_function("dimensions_png", |b| b.iter(|| read_dimensions(black_box(&png_data))));
    c.bench_function("dimensions_jpeg_exif", |b| {
        b.iter(|| read_dimensions(black_box(&jpeg_data)))
    });
}

criterion_group!(benches, bench_format_detection, bench_dimensions);
criterion_main!(benches);
