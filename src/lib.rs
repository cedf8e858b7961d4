//! # iiif-serve
//!
//! A small IIIF Image API 2.1 server. Images live in ordinary directory
//! trees and are addressed by bare filename. Each request names a region,
//! a size, a rotation, and a quality/format pair:
//!
//! ```text
//! GET /iiif/2/page-01.jpg/info.json
//! GET /iiif/2/page-01.jpg/100,100,900,700/450,/!90/default.jpg
//! ```
//!
//! # Pipeline
//!
//! ```text
//! resolver   filename  →  source file         (walk search roots, first match wins)
//! request    segments  →  TransformDescriptor (pure syntax)
//! geometry   desc+dims →  CropPlan            (bounds, clamping, scale)
//! imaging    CropPlan  →  JPEG bytes          (crop, resize, mirror, rotate, encode)
//! ```
//!
//! [`service::ImageService`] runs the stages in that order so a missing
//! image is reported before anything else is looked at, and unsupported
//! qualities or formats are refused before any pixel is decoded.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered `iiif.toml` loading, overrides, validation |
//! | [`resolver`] | Filename → source lookup across search roots |
//! | [`request`] | Parsing of region / size / rotation / quality / format |
//! | [`geometry`] | Crop plans and canonical request paths |
//! | [`info`] | `info.json` documents and the capability table |
//! | [`imaging`] | Pure-Rust identify and render backend |
//! | [`service`] | The request pipeline and its error type |
//! | [`pool`] | Bounded worker pool for blocking image work |
//! | [`server`] | axum routes, status mapping, graceful shutdown |
//! | [`output`] | CLI output formatting |
//!
//! # Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decoding, Lanczos3
//! resampling and JPEG encoding. There are no system libraries to install;
//! the binary is self-contained.

pub mod config;
pub mod geometry;
pub mod imaging;
pub mod info;
pub mod output;
pub mod pool;
pub mod request;
pub mod resolver;
pub mod server;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;
