//! The request pipeline.
//!
//! [`ImageService`] ties the resolver, parser, geometry engine, info builder
//! and backend together. Each call walks the same fixed order:
//!
//! ```text
//! resolve filename        → NotFound, nothing else is touched
//! parse segments          → Parse
//! quality / format check  → Unsupported, before any decode
//! identify                → Backend
//! resolve geometry        → Geometry
//! render                  → Backend (or Unsupported for arbitrary angles)
//! ```
//!
//! All methods block. The HTTP layer calls them through the
//! [`WorkerPool`](crate::pool::WorkerPool).

use crate::config::ServerConfig;
use crate::geometry::{self, GeometryError};
use crate::imaging::{
    BackendError, ImageBackend, JpegQuality, get_dimensions, output_dimensions, render_image,
};
use crate::info::{self, InfoDescriptor, RoutePrefix};
use crate::pool::PoolError;
use crate::request::{self, Format, ParseError, Quality, TransformDescriptor};
use crate::resolver::{ResolveError, Resolver};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    NotFound(#[from] ResolveError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("Unsupported parameter: {0}")]
    Unsupported(String),
    #[error("Backend failure: {0}")]
    Backend(BackendError),
    #[error(transparent)]
    Worker(#[from] PoolError),
}

impl From<BackendError> for ServiceError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unsupported(what) => ServiceError::Unsupported(what),
            other => ServiceError::Backend(other),
        }
    }
}

/// Raw path segments of an image request, exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageRequest {
    pub filename: String,
    pub region: String,
    pub size: String,
    pub rotation: String,
    /// The last segment, e.g. `default.jpg`.
    pub quality_format: String,
}

impl ImageRequest {
    pub fn new(
        filename: impl Into<String>,
        region: impl Into<String>,
        size: impl Into<String>,
        rotation: impl Into<String>,
        quality_format: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            region: region.into(),
            size: size.into(),
            rotation: rotation.into(),
            quality_format: quality_format.into(),
        }
    }

    fn parse(&self) -> Result<TransformDescriptor, ParseError> {
        let (quality, format) = request::split_quality_format(&self.quality_format)?;
        request::parse(&self.region, &self.size, &self.rotation, quality, format)
    }
}

/// An encoded image ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    /// Full canonical URI of the request, for the `Link` header.
    pub canonical_uri: String,
}

pub struct ImageService<R, B> {
    config: ServerConfig,
    resolver: R,
    backend: B,
}

impl<R: Resolver, B: ImageBackend> ImageService<R, B> {
    pub fn new(config: ServerConfig, resolver: R, backend: B) -> Self {
        Self {
            config,
            resolver,
            backend,
        }
    }

    /// Describe an image as `info.json`.
    pub fn info(&self, filename: &str, route: RoutePrefix) -> Result<InfoDescriptor, ServiceError> {
        let source = self.resolver.resolve(filename)?;
        let dims = get_dimensions(&self.backend, source.path())?;
        Ok(info::build_for_route(
            dims,
            &self.config.base_uri,
            route,
            filename,
            self.config.limits.output_limits(),
        ))
    }

    /// Run a full image request through the pipeline.
    pub fn image(
        &self,
        req: &ImageRequest,
        route: RoutePrefix,
    ) -> Result<RenderedImage, ServiceError> {
        let source = self.resolver.resolve(&req.filename)?;
        let desc = req.parse()?;
        check_supported(&desc)?;

        let dims = get_dimensions(&self.backend, source.path())?;
        let plan = geometry::resolve(&desc, dims, self.config.limits.output_limits())?;
        debug!(
            filename = %req.filename,
            crop = ?(plan.x, plan.y, plan.w, plan.h),
            scale = plan.scale,
            output = ?output_dimensions(&plan, &desc.rotation),
            "rendering"
        );

        let bytes = render_image(
            &self.backend,
            source.path(),
            plan,
            desc.rotation,
            JpegQuality::new(self.config.encoding.jpeg_quality),
        )?;

        let canonical_uri = format!(
            "{}/{}",
            route.image_id(&self.config.base_uri, &req.filename),
            geometry::canonical_path(&desc, &plan, dims)
        );
        Ok(RenderedImage {
            bytes,
            content_type: "image/jpeg",
            canonical_uri,
        })
    }
}

/// Only default quality encoded as JPEG is produced.
fn check_supported(desc: &TransformDescriptor) -> Result<(), ServiceError> {
    if desc.quality != Quality::Default {
        return Err(ServiceError::Unsupported(format!(
            "quality '{}'",
            desc.quality.as_str()
        )));
    }
    if desc.format != Format::Jpg {
        return Err(ServiceError::Unsupported(format!(
            "format '{}'",
            desc.format.as_str()
        )));
    }
    Ok(())
}
