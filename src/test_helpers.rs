//! Shared test utilities: synthetic image writers and path extractors.
//!
//! Every writer creates missing parent directories, so fixtures can be laid
//! out with nested paths in a single call.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_test_jpeg(&tmp.path().join("input/dawn.jpg"), 300, 120);
//! write_test_png(&tmp.path().join("templates/ui/icon.png"), 32, 32);
//! touch(&tmp.path().join("templates/broken.dds"));
//! ```

use image::{ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
}

fn gradient(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// Write a gradient JPEG of the given size.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

/// Write an opaque gradient PNG of the given size.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Write a half-transparent PNG, for exercising alpha handling.
pub fn write_rgba_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img: RgbaImage = ImageBuffer::from_fn(width, height, |x, _| {
        let alpha = if x < width / 2 { 0 } else { 255 };
        Rgba([200, 40, 40, alpha])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Create an empty file. Its content is not a decodable image.
pub fn touch(path: &Path) {
    ensure_parent(path);
    std::fs::write(path, b"").unwrap();
}

/// File names of `paths`, in the given order.
pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect()
}
