//! `info.json` image information documents.
//!
//! Every source image is described by an [`InfoDescriptor`] serialised as
//! IIIF Image API 2.1 JSON:
//!
//! ```json
//! {
//!   "@context": "http://iiif.io/api/image/2/context.json",
//!   "@id": "http://localhost/iiif/2/a.jpg",
//!   "protocol": "http://iiif.io/api/image",
//!   "width": 1000,
//!   "height": 800,
//!   "sizes": [],
//!   "profile": [
//!     "http://iiif.io/api/image/2/level2.json",
//!     {
//!       "supports": ["canonicalLinkHeader", "..."],
//!       "qualities": ["default"],
//!       "formats": ["jpg"],
//!       "maxWidth": 10000,
//!       "maxArea": 50000000
//!     }
//!   ]
//! }
//! ```
//!
//! The capability table is a fixed constant. `maxWidth` and `maxArea` come
//! from the configured [`OutputLimits`]; no `maxHeight` is given, so clients
//! read it as equal to `maxWidth`. Descriptors are rebuilt for every request
//! and never stored.

use crate::geometry::OutputLimits;
use crate::imaging::Dimensions;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;

pub const CONTEXT: &str = "http://iiif.io/api/image/2/context.json";
pub const PROTOCOL: &str = "http://iiif.io/api/image";
pub const PROFILE_LEVEL2: &str = "http://iiif.io/api/image/2/level2.json";

pub const SUPPORTS: &[&str] = &[
    "canonicalLinkHeader",
    "profileLinkHeader",
    "mirroring",
    "rotationArbitrary",
    "sizeAboveFull",
    "regionSquare",
];
pub const QUALITIES: &[&str] = &["default"];
pub const FORMATS: &[&str] = &["jpg"];

/// Bytes escaped in a URI path segment. Includes `%` so an encoded name
/// never decodes to something else.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Which of the two equivalent URL families a request came in on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutePrefix {
    /// `/iiif/2/{filename}/...`
    #[default]
    Iiif2,
    /// `/{filename}/...`
    Bare,
}

impl RoutePrefix {
    pub fn as_str(self) -> &'static str {
        match self {
            RoutePrefix::Iiif2 => "iiif/2/",
            RoutePrefix::Bare => "",
        }
    }

    /// Base identifier of an image: `{base_uri}{prefix}{filename}`, with the
    /// filename percent-encoded as a path segment.
    pub fn image_id(self, base_uri: &str, filename: &str) -> String {
        format!(
            "{}{}{}",
            base_uri,
            self.as_str(),
            utf8_percent_encode(filename, PATH_SEGMENT)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDescription {
    pub supports: &'static [&'static str],
    pub qualities: &'static [&'static str],
    pub formats: &'static [&'static str],
    #[serde(rename = "maxWidth")]
    pub max_width: u32,
    #[serde(rename = "maxArea")]
    pub max_area: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoDescriptor {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
    pub protocol: &'static str,
    pub width: u32,
    pub height: u32,
    /// Precomputed sizes. None are offered.
    pub sizes: &'static [serde_json::Value],
    /// Serialises as `[level-uri, {supports, qualities, formats, maxWidth, maxArea}]`.
    pub profile: (&'static str, ProfileDescription),
}

/// Build the descriptor for the `/iiif/2/` route family.
pub fn build(
    dims: Dimensions,
    base_uri: &str,
    filename: &str,
    limits: OutputLimits,
) -> InfoDescriptor {
    build_for_route(dims, base_uri, RoutePrefix::Iiif2, filename, limits)
}

pub fn build_for_route(
    dims: Dimensions,
    base_uri: &str,
    route: RoutePrefix,
    filename: &str,
    limits: OutputLimits,
) -> InfoDescriptor {
    InfoDescriptor {
        context: CONTEXT,
        id: route.image_id(base_uri, filename),
        protocol: PROTOCOL,
        width: dims.width,
        height: dims.height,
        sizes: &[],
        profile: (
            PROFILE_LEVEL2,
            ProfileDescription {
                supports: SUPPORTS,
                qualities: QUALITIES,
                formats: FORMATS,
                max_width: limits.max_width,
                max_area: limits.max_area,
            },
        ),
    }
}
