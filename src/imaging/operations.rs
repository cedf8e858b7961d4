//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a resolved request, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{quarter_turns, rotated_dimensions};
use super::params::{JpegQuality, RenderParams};
use crate::geometry::CropPlan;
use crate::request::Rotation;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<Dimensions> {
    backend.identify(path)
}

/// Plan a render without executing it.
pub fn plan_render(
    source: &Path,
    crop: CropPlan,
    rotation: Rotation,
    quality: JpegQuality,
) -> RenderParams {
    RenderParams {
        source: source.to_path_buf(),
        crop,
        rotation,
        quality,
    }
}

/// Final pixel size of a render, or `None` when the rotation is not a
/// multiple of 90°.
pub fn output_dimensions(crop: &CropPlan, rotation: &Rotation) -> Option<(u32, u32)> {
    quarter_turns(rotation.degrees).map(|turns| rotated_dimensions(crop.output_size(), turns))
}

/// Crop, scale, rotate and encode `source` through the backend.
pub fn render_image(
    backend: &impl ImageBackend,
    source: &Path,
    crop: CropPlan,
    rotation: Rotation,
    quality: JpegQuality,
) -> Result<Vec<u8>> {
    let params = plan_render(source, crop, rotation, quality);
    backend.render(&params)
}
