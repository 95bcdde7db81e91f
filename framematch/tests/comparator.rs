//! File-level tests for the image comparator.

mod common;

use common::generators::{
    gen_banded, gen_noise, gen_solid, BLACK, FRAME_HEIGHT, FRAME_WIDTH, SKY, WHITE,
};
use common::{fixture, temp_dir};
use framematch::{CompareError, ExactMatch, ImageComparator, RGBA8};
use std::fs;

/// One step away from `SKY` in the red channel.
const NUDGED_SKY: RGBA8 = RGBA8::new(93, 148, 252, 255);

#[test]
fn test_same_file_is_fully_similar() {
    let dir = temp_dir();
    let frame = fixture(&dir, "frame.png", &gen_noise(FRAME_WIDTH, FRAME_HEIGHT, 7));

    let pct = ImageComparator::new()
        .compare(&frame, &frame)
        .expect("valid input");
    assert_eq!(pct, 100.0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_equal_content_in_two_files() {
    let dir = temp_dir();
    let a = fixture(&dir, "a.png", &gen_solid(FRAME_WIDTH, FRAME_HEIGHT, SKY));
    let b = fixture(&dir, "b.png", &gen_solid(FRAME_WIDTH, FRAME_HEIGHT, SKY));

    let result = ImageComparator::new().compare_files(&a, &b).unwrap();
    assert!(result.is_identical());
    assert_eq!(result.width, FRAME_WIDTH);
    assert_eq!(result.height, FRAME_HEIGHT);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_black_vs_white_is_zero() {
    let dir = temp_dir();
    let a = fixture(&dir, "black.png", &gen_solid(64, 60, BLACK));
    let b = fixture(&dir, "white.png", &gen_solid(64, 60, WHITE));

    let pct = ImageComparator::new().compare(&a, &b).unwrap();
    assert_eq!(pct, 0.0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_comparison_is_symmetric() {
    let dir = temp_dir();
    let a = fixture(&dir, "a.png", &gen_noise(FRAME_WIDTH, FRAME_HEIGHT, 1));
    let b = fixture(&dir, "b.png", &gen_noise(FRAME_WIDTH, FRAME_HEIGHT, 2));

    let comparator = ImageComparator::new();
    let ab = comparator.compare(&a, &b).unwrap();
    let ba = comparator.compare(&b, &a).unwrap();
    assert_eq!(ab, ba);
    assert!((0.0..=100.0).contains(&ab));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_twenty_percent_band_is_eighty_percent_similar() {
    let dir = temp_dir();
    let base = fixture(&dir, "base.png", &gen_solid(FRAME_WIDTH, FRAME_HEIGHT, SKY));
    // 48 of 240 rows is exactly 20% of the frame.
    let banded = gen_banded(FRAME_WIDTH, FRAME_HEIGHT, SKY, BLACK, 48, 0);
    let banded = fixture(&dir, "banded.png", &banded);

    let result = ImageComparator::new().compare_files(&banded, &base).unwrap();
    assert_eq!(result.differing_pixels, 12288);
    assert_eq!(result.similarity_percent, 80.0);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_dimension_mismatch_is_an_error() {
    let dir = temp_dir();
    let big = fixture(&dir, "big.png", &gen_solid(256, 240, BLACK));
    let small = fixture(&dir, "small.png", &gen_solid(128, 120, BLACK));

    let err = ImageComparator::new().compare(&big, &small).unwrap_err();
    assert!(matches!(
        err,
        CompareError::DimensionMismatch {
            w1: 256,
            h1: 240,
            w2: 128,
            h2: 120
        }
    ));
    assert!(err.to_string().contains("cannot compare"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_file_is_a_decode_error() {
    let dir = temp_dir();
    let a = fixture(&dir, "a.png", &gen_solid(8, 8, BLACK));
    let missing = dir.join("missing.png");

    let err = ImageComparator::new().compare(&a, &missing).unwrap_err();
    match err {
        CompareError::Decode { path, .. } => assert_eq!(path, missing),
        other => panic!("expected decode error, got {other:?}"),
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_corrupt_png_is_a_decode_error() {
    let dir = temp_dir();
    let a = fixture(&dir, "a.png", &gen_solid(8, 8, BLACK));
    let corrupt = dir.join("corrupt.png");
    fs::write(&corrupt, b"\x89PNG\r\n\x1a\nnot really").unwrap();

    let result = ImageComparator::new().compare(&a, &corrupt);
    assert!(matches!(result, Err(CompareError::Decode { .. })));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_exact_engine_counts_subtle_changes() {
    let dir = temp_dir();
    let a = fixture(&dir, "a.png", &gen_solid(10, 10, SKY));
    let nudged = gen_banded(10, 10, SKY, NUDGED_SKY, 1, 0);
    let b = fixture(&dir, "b.png", &nudged);

    // A one-step color change is invisible to the perceptual engine.
    assert_eq!(ImageComparator::new().compare(&a, &b).unwrap(), 100.0);
    assert_eq!(
        ImageComparator::with_engine(ExactMatch).compare(&a, &b).unwrap(),
        90.0
    );

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_diff_image_has_frame_size() {
    let a = gen_solid(32, 30, SKY);
    let b = gen_banded(32, 30, SKY, BLACK, 3, 0);

    let (result, diff) = ImageComparator::new().diff_images(&a, &b).unwrap();
    assert_eq!(result.differing_pixels, 96);
    assert!(diff.same_size(&a));
    assert_eq!(diff.get(0, 0), RGBA8::new(255, 0, 0, 255));
    assert_ne!(diff.get(0, 29), RGBA8::new(255, 0, 0, 255));
}
