//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Crop + resize** | `crop_imm` + Lanczos3 `resize_exact` |
//! | **Mirror / rotate** | `fliph` + quarter-turn rotations |
//! | **Encode** | `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub(crate) mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::scaled_dimensions;
pub use operations::{get_dimensions, output_dimensions, render_image};
pub use params::{JpegQuality, RenderParams};
pub use rust_backend::{RustBackend, is_supported_image};
