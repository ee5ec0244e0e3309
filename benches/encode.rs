//! Encoding benchmarks using criterion.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use framejpeg::compare::{BlockComparator, Comparator, FramePair, QuadtreeComparator, StripComparator};
use framejpeg::tight::TightJpegEncoder;
use framejpeg::{Compressor, PixelLayout, Subsampling};

/// Create a synthetic 0x00RRGGBB framebuffer with gradient and noise.
fn create_test_frame(width: usize, height: usize) -> Vec<u32> {
    let mut frame = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let noise = ((x * 7 + y * 13) % 50) as u32;
            let r = (x * 255 / width) as u32;
            let g = (y * 255 / height) as u32;
            let b = ((x + y) * 255 / (width + height)) as u32;
            frame.push(((r + noise).min(255) << 16) | ((g + noise).min(255) << 8) | (b + noise).min(255));
        }
    }
    frame
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");

    for &(width, height) in &[(256usize, 256usize), (1280, 720), (1920, 1080)] {
        let frame = create_test_frame(width, height);
        let mut dst = vec![0u8; width * height * 4];
        group.throughput(Throughput::Elements((width * height) as u64));

        for subsampling in [Subsampling::S444, Subsampling::S420] {
            let mut compressor = Compressor::new().unwrap();
            compressor.configure(93, subsampling, PixelLayout::Bgrx);
            let id = BenchmarkId::new(format!("{:?}", subsampling), format!("{}x{}", width, height));
            group.bench_with_input(id, &frame, |b, frame| {
                b.iter(|| {
                    compressor
                        .compress(
                            black_box(&mut dst),
                            black_box(frame),
                            width,
                            width as u32,
                            height as u32,
                        )
                        .unwrap()
                })
            });
        }
    }

    group.finish();
}

fn bench_tight_rects(c: &mut Criterion) {
    // Typical dirty-rectangle sizes in a remote desktop session
    let mut group = c.benchmark_group("tight_rect");
    let screen_width = 1920usize;
    let screen = create_test_frame(screen_width, 1080);

    for &(w, h) in &[(64usize, 64usize), (256, 128), (640, 480)] {
        let mut encoder = TightJpegEncoder::new().unwrap();
        let mut out = Vec::with_capacity(w * h * 4);
        group.throughput(Throughput::Elements((w * h) as u64));
        group.bench_function(BenchmarkId::from_parameter(format!("{}x{}", w, h)), |b| {
            b.iter(|| {
                out.clear();
                encoder
                    .encode_rect(&mut out, black_box(&screen), screen_width, w as u32, h as u32)
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn diff_frames<C: Comparator>(comparator: &C, shown: &mut [u32], next: &[u32], width: usize, height: usize) -> usize {
    let mut frames =
        FramePair::new(shown, next, width, width as u32, height as u32, PixelLayout::Bgrx).unwrap();
    let mut count = 0;
    comparator.compare(&mut frames, |_| count += 1);
    count
}

fn bench_compare(c: &mut Criterion) {
    // A 1080p frame where a 400x300 window changed
    let mut group = c.benchmark_group("compare");
    let (width, height) = (1920usize, 1080usize);
    let prev = create_test_frame(width, height);
    let mut next = prev.clone();
    for y in 200..500 {
        for x in 700..1100 {
            next[y * width + x] ^= 0x0040_4040;
        }
    }
    group.throughput(Throughput::Elements((width * height) as u64));

    let mut shown = prev.clone();
    group.bench_function("block", |b| {
        b.iter(|| {
            shown.copy_from_slice(&prev);
            diff_frames(&BlockComparator, &mut shown, black_box(&next), width, height)
        })
    });
    group.bench_function("strip", |b| {
        b.iter(|| {
            shown.copy_from_slice(&prev);
            diff_frames(&StripComparator, &mut shown, black_box(&next), width, height)
        })
    });
    group.bench_function("quadtree", |b| {
        b.iter(|| {
            shown.copy_from_slice(&prev);
            diff_frames(&QuadtreeComparator, &mut shown, black_box(&next), width, height)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_compress, bench_tight_rects, bench_compare);
criterion_main!(benches);
