//! Resolution of a [`TransformDescriptor`] against real image dimensions.
//!
//! The output is a [`CropPlan`]: a crop rectangle that lies entirely inside
//! the source image plus a positive scale factor. Every plan returned by
//! [`resolve`] satisfies
//!
//! ```text
//! x + w ≤ width    y + h ≤ height    w ≥ 1    h ≥ 1    0 < scale < ∞
//! ```
//!
//! so the backend never sees an empty or out-of-range crop, and the scaled
//! output is at least one pixel in each direction. The scaled output also
//! stays within the configured [`OutputLimits`]: no side above `max_width`
//! and no more than `max_area` pixels.
//!
//! Regions that start inside the image but extend past its edges are clamped
//! to what remains. Regions that start at or past an edge are rejected.
//!
//! Rotation, quality and format do not affect geometry and pass through.

use crate::imaging::Dimensions;
use crate::imaging::calculations::{checked_scaled_dimensions, scaled_dimensions};
use crate::request::{Region, Size, TransformDescriptor};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Region starts outside the image: {x},{y} is not within {width}x{height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("Request resolves to an empty image")]
    DegenerateGeometry,
    #[error("Requested size exceeds the limits: at most {max_width} pixels per side and {max_area} pixels in total")]
    SizeTooLarge { max_width: u32, max_area: u64 },
}

/// Upper bounds on the scaled output. `max_width` bounds both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLimits {
    pub max_width: u32,
    pub max_area: u64,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            max_width: 10_000,
            max_area: 50_000_000,
        }
    }
}

impl OutputLimits {
    fn admits(&self, (w, h): (u32, u32)) -> bool {
        w <= self.max_width && h <= self.max_width && w as u64 * h as u64 <= self.max_area
    }
}

/// A crop rectangle in source pixels plus the scale applied after cropping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPlan {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub scale: f64,
}

impl CropPlan {
    /// Whether the plan covers the whole source image.
    pub fn is_full(&self, dims: Dimensions) -> bool {
        self.x == 0 && self.y == 0 && self.w == dims.width && self.h == dims.height
    }

    /// Pixel size of the image after scaling.
    pub fn output_size(&self) -> (u32, u32) {
        scaled_dimensions((self.w, self.h), self.scale)
    }
}

/// Resolve a request against the source dimensions.
pub fn resolve(
    desc: &TransformDescriptor,
    dims: Dimensions,
    limits: OutputLimits,
) -> Result<CropPlan, GeometryError> {
    let (x, y, w, h) = resolve_region(&desc.region, dims)?;
    let scale = resolve_scale(&desc.size, w, h)?;
    match checked_scaled_dimensions((w, h), scale) {
        Some(out) if limits.admits(out) => Ok(CropPlan { x, y, w, h, scale }),
        _ => Err(GeometryError::SizeTooLarge {
            max_width: limits.max_width,
            max_area: limits.max_area,
        }),
    }
}

fn resolve_region(region: &Region, dims: Dimensions) -> Result<(u32, u32, u32, u32), GeometryError> {
    let Dimensions { width, height } = dims;
    if width == 0 || height == 0 {
        return Err(GeometryError::DegenerateGeometry);
    }

    match *region {
        Region::Full => Ok((0, 0, width, height)),
        Region::Square => {
            let side = width.min(height);
            Ok(((width - side) / 2, (height - side) / 2, side, side))
        }
        Region::Pixel { x, y, w, h } => clamp_rect(x, y, w, h, dims),
        Region::Percent { x, y, w, h } => {
            let px = |pct: f64, total: u32| pct * total as f64 / 100.0;
            // Float-to-int `as` saturates, so huge percentages stay in range of u32.
            let x = px(x, width).floor() as u32;
            let y = px(y, height).floor() as u32;
            let w = px(w, width).round() as u32;
            let h = px(h, height).round() as u32;
            if w == 0 || h == 0 {
                return Err(GeometryError::DegenerateGeometry);
            }
            clamp_rect(x, y, w, h, dims)
        }
    }
}

/// Clamp a rectangle to the image, rejecting origins outside it.
fn clamp_rect(
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    dims: Dimensions,
) -> Result<(u32, u32, u32, u32), GeometryError> {
    if x >= dims.width || y >= dims.height {
        return Err(GeometryError::RegionOutOfBounds {
            x,
            y,
            width: dims.width,
            height: dims.height,
        });
    }
    let w = w.min(dims.width - x);
    let h = h.min(dims.height - y);
    if w == 0 || h == 0 {
        return Err(GeometryError::DegenerateGeometry);
    }
    Ok((x, y, w, h))
}

fn resolve_scale(size: &Size, rw: u32, rh: u32) -> Result<f64, GeometryError> {
    let scale = match *size {
        Size::Full => 1.0,
        Size::ByWidth(w) => w as f64 / rw as f64,
        Size::ByHeight(h) => h as f64 / rh as f64,
        Size::ByPercent(p) => p as f64 / 100.0,
        Size::BestFit { w, h } => (w as f64 / rw as f64).min(h as f64 / rh as f64),
    };
    if !scale.is_finite() || scale <= 0.0 {
        return Err(GeometryError::DegenerateGeometry);
    }
    Ok(scale)
}

/// The canonical URI tail for a resolved request:
/// `{region}/{size}/{rotation}/{quality}.{format}`.
pub fn canonical_path(desc: &TransformDescriptor, plan: &CropPlan, dims: Dimensions) -> String {
    let region = if plan.is_full(dims) {
        "full".to_string()
    } else {
        format!("{},{},{},{}", plan.x, plan.y, plan.w, plan.h)
    };
    let size = if plan.scale == 1.0 {
        "full".to_string()
    } else {
        format!("{},", plan.output_size().0)
    };
    format!(
        "{}/{}/{}/{}.{}",
        region,
        size,
        desc.rotation,
        desc.quality.as_str(),
        desc.format.as_str()
    )
}
