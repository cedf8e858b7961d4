//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and render.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, built on
//! the `image` crate. Everything is statically linked into the binary.

use super::params::RenderParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    /// The request is well-formed but this backend cannot honour it.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result of an identify operation: the source image's natural pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Both operations block on decoding and are called from the worker pool,
/// never from the async request path. `Send + Sync` lets one backend be
/// shared by every worker thread.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without a full decode where the format allows it.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Crop, scale, mirror/rotate and encode. Returns the encoded bytes.
    fn render(&self, params: &RenderParams) -> Result<Vec<u8>, BackendError>;
}
