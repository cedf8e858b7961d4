//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which turns a resolved request into backend work) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing request handling.
//!
//! ## Types
//!
//! - [`JpegQuality`]: Lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`RenderParams`]: Everything one render needs, from source path to encoder quality.

use crate::geometry::CropPlan;
use crate::request::Rotation;
use std::path::PathBuf;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegQuality(u8);

impl JpegQuality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for JpegQuality {
    fn default() -> Self {
        Self(95)
    }
}

/// Parameters for a render: crop to `crop`, scale by `crop.scale`, then
/// mirror/rotate and encode.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub source: PathBuf,
    pub crop: CropPlan,
    pub rotation: Rotation,
    pub quality: JpegQuality,
}
