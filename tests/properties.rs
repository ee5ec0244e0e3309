//! Property-based tests for the compressor and the Tight length codec.

use std::io::Cursor;

use framejpeg::compare::{
    BlockComparator, Comparator, FramePair, QuadtreeComparator, Rect, StripComparator,
};
use framejpeg::tight::{compact_length_len, read_compact_length, write_compact_length};
use framejpeg::{restore_huffman_tables, Compressor, Error, PixelLayout, Subsampling};
use proptest::prelude::*;

/// Strategy for generating image dimensions (keep small for speed).
fn dimensions_strategy() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=40, 1u32..=40)
}

fn subsampling_strategy() -> impl Strategy<Value = Subsampling> {
    prop_oneof![
        Just(Subsampling::S444),
        Just(Subsampling::S422),
        Just(Subsampling::S420),
        Just(Subsampling::S440),
    ]
}

fn layout_strategy() -> impl Strategy<Value = PixelLayout> {
    prop_oneof![
        Just(PixelLayout::Bgrx),
        Just(PixelLayout::Rgbx),
        Just(PixelLayout::Xrgb),
        Just(PixelLayout::Xbgr),
    ]
}

/// Random image as (width, height, stride, pixels).
fn image_strategy() -> impl Strategy<Value = (u32, u32, usize, Vec<u32>)> {
    (dimensions_strategy(), 0usize..=8).prop_flat_map(|((width, height), pad)| {
        let stride = width as usize + pad;
        let len = stride * (height as usize - 1) + width as usize;
        (
            Just(width),
            Just(height),
            Just(stride),
            prop::collection::vec(any::<u32>(), len..=len),
        )
    })
}

/// Run one comparator over a copy of `prev`, returning the rectangles and
/// the synchronized previous frame.
fn diff_with(
    which: u8,
    prev: &[u32],
    next: &[u32],
    stride: usize,
    width: u32,
    height: u32,
) -> (Vec<Rect>, Vec<u32>) {
    let mut shown = prev.to_vec();
    let mut rects = Vec::new();
    {
        let mut frames =
            FramePair::new(&mut shown, next, stride, width, height, PixelLayout::Bgrx).unwrap();
        let push = |r| rects.push(r);
        match which {
            0 => BlockComparator.compare(&mut frames, push),
            1 => StripComparator.compare(&mut frames, push),
            _ => QuadtreeComparator.compare(&mut frames, push),
        }
    }
    (rects, shown)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: the byte count never exceeds the destination, and a
    /// failure is always reported as a capacity failure.
    #[test]
    fn prop_output_within_capacity(
        (width, height, stride, pixels) in image_strategy(),
        quality in 1u8..=100,
        subsampling in subsampling_strategy(),
        layout in layout_strategy(),
        capacity in 0usize..4096,
    ) {
        let mut compressor = Compressor::new().unwrap();
        compressor.configure(quality, subsampling, layout);
        let mut dst = vec![0u8; capacity];

        match compressor.compress(&mut dst, &pixels, stride, width, height) {
            Ok(n) => {
                prop_assert!(n <= capacity);
                prop_assert_eq!(&dst[..2], &[0xFF, 0xD8]);
                prop_assert_eq!(&dst[n - 2..n], &[0xFF, 0xD9]);
            }
            Err(e) => prop_assert_eq!(e, Error::OutputTooSmall { capacity }),
        }
    }

    /// Property: every stream decodes, after restoring its tables, to an
    /// image of the declared size.
    #[test]
    fn prop_restored_stream_decodes(
        (width, height, stride, pixels) in image_strategy(),
        quality in 1u8..=100,
        subsampling in subsampling_strategy(),
    ) {
        let mut compressor = Compressor::new().unwrap();
        compressor.configure(quality, subsampling, PixelLayout::Bgrx);
        let mut dst = vec![0u8; 64 * 1024];
        let n = compressor.compress(&mut dst, &pixels, stride, width, height).unwrap();

        let restored = restore_huffman_tables(&dst[..n]).unwrap();
        let mut decoder = jpeg_decoder::Decoder::new(Cursor::new(&restored));
        let decoded = decoder.decode();
        prop_assert!(decoded.is_ok(), "decode failed: {:?}", decoded.err());

        let info = decoder.info().unwrap();
        prop_assert_eq!(info.width as u32, width);
        prop_assert_eq!(info.height as u32, height);
    }

    /// Property: same input always produces the same output, on a fresh
    /// session or a reused one.
    #[test]
    fn prop_deterministic_output(
        (width, height, stride, pixels) in image_strategy(),
        subsampling in subsampling_strategy(),
    ) {
        let mut first = Compressor::new().unwrap();
        first.configure(93, subsampling, PixelLayout::Bgrx);
        let mut a = vec![0u8; 64 * 1024];
        let na = first.compress(&mut a, &pixels, stride, width, height).unwrap();
        let mut b = vec![0u8; 64 * 1024];
        let nb = first.compress(&mut b, &pixels, stride, width, height).unwrap();
        prop_assert_eq!(&a[..na], &b[..nb]);

        let mut second = Compressor::new().unwrap();
        second.configure(93, subsampling, PixelLayout::Bgrx);
        let nc = second.compress(&mut b, &pixels, stride, width, height).unwrap();
        prop_assert_eq!(&a[..na], &b[..nc]);
    }

    /// Property: compact lengths read back as written, in the predicted
    /// number of bytes.
    #[test]
    fn prop_compact_length_roundtrip(len in 0usize..(1 << 22), trailing in any::<u8>()) {
        let mut out = Vec::new();
        write_compact_length(&mut out, len).unwrap();
        prop_assert_eq!(out.len(), compact_length_len(len));
        out.push(trailing);
        prop_assert_eq!(read_compact_length(&out), Some((len, out.len() - 1)));
    }

    /// Property: every pixel whose color changed is covered by a reported
    /// rectangle inside the frame, and the previous frame ends up matching.
    #[test]
    fn prop_comparators_cover_changes(
        (width, height, stride, next) in image_strategy(),
        seed in any::<u32>(),
        density in 0u32..8,
        which in 0u8..3,
    ) {
        // Sparse edits of the next frame, so most pixels stay unchanged
        let mut state = seed | 1;
        let prev: Vec<u32> = next
            .iter()
            .map(|&p| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                if state % 8 < density { p ^ (state & 0x00FF_FFFF) } else { p }
            })
            .collect();

        let (rects, shown) = diff_with(which, &prev, &next, stride, width, height);
        let mask = PixelLayout::Bgrx.color_mask();
        for r in &rects {
            prop_assert!(r.area() > 0);
            prop_assert!(r.x1 <= width as usize && r.y1 <= height as usize);
        }
        for y in 0..height as usize {
            for x in 0..width as usize {
                let i = y * stride + x;
                if (prev[i] ^ next[i]) & mask != 0 {
                    prop_assert!(rects.iter().any(|r| r.contains(x, y)));
                }
                prop_assert_eq!(shown[i] & mask, next[i] & mask);
            }
        }
    }
}
