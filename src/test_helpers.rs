//! Shared test utilities.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let root = image_root(&[("a.jpg", 200, 150), ("scans/b.jpg", 64, 64)]);
//! let resolver = FsResolver::new(vec![root.path().to_path_buf()]);
//! ```

use image::ImageEncoder;
use image::RgbImage;
use std::path::Path;
use tempfile::TempDir;

/// Write a gradient JPEG of the given size, creating parent directories.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// A temp directory holding JPEGs at the given relative paths and sizes.
pub fn image_root(images: &[(&str, u32, u32)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, w, h) in images {
        create_test_jpeg(&tmp.path().join(rel), *w, *h);
    }
    tmp
}

#[test]
fn image_root_writes_decodable_files() {
    let root = image_root(&[("nested/dir/a.jpg", 30, 20)]);
    let img = image::open(root.path().join("nested/dir/a.jpg")).unwrap();
    assert_eq!((img.width(), img.height()), (30, 20));
}
