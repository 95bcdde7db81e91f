//! Common test utilities for framematch tests.
//!
//! Fixtures are generated into per-test temp directories and written as PNG
//! so the full decode path is exercised.

#![allow(dead_code)]

pub mod generators;

use std::fs;
use std::path::{Path, PathBuf};

use framematch::RasterImage;

/// Create temp directory for test files.
pub fn temp_dir() -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("framematch-test-{}-{}", std::process::id(), id));
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

/// Write a frame as PNG, creating parent directories.
#[track_caller]
pub fn write_png(path: &Path, img: &RasterImage) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture dir");
    }
    img.to_rgba_image().save(path).expect("Failed to write PNG");
}

/// Write a frame as PNG into `dir` and return its path.
#[track_caller]
pub fn fixture(dir: &Path, name: &str, img: &RasterImage) -> PathBuf {
    let path = dir.join(name);
    write_png(&path, img);
    path
}
