//! IIIF image request parsing.
//!
//! Turns the path segments of an image request into a [`TransformDescriptor`]:
//!
//! ```text
//! /{filename}/{region}/{size}/{rotation}/{quality}.{format}
//!              │        │      │          │         └─ Format
//!              │        │      │          └─ Quality
//!              │        │      └─ Rotation   (`0`, `90`, `!180`, `22.5`)
//!              │        └─ Size              (`full`, `max`, `w,`, `,h`, `pct:n`, `!w,h`)
//!              └─ Region                     (`full`, `square`, `x,y,w,h`, `pct:x,y,w,h`)
//! ```
//!
//! Parsing is purely syntactic. Whether a value can be honoured against a
//! particular image is decided later: bounds by [`geometry`](crate::geometry),
//! quality/format support by the [`service`](crate::service), rotation support
//! by the backend. Unknown quality and format tokens parse into `Other` so the
//! caller can answer them as unsupported rather than malformed.
//!
//! ## Size ambiguity
//!
//! A size of `w,h` with both parts present is not representable as a single
//! scale factor. Width wins. Clients that want aspect-preserving fitting use
//! the `!w,h` form, which resolves to the smaller of the two scales.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid region: '{0}'")]
    InvalidRegion(String),
    #[error("Invalid size: '{0}'")]
    InvalidSize(String),
    #[error("Invalid rotation: '{0}'")]
    InvalidRotation(String),
    #[error("Invalid quality: '{0}'")]
    InvalidQuality(String),
    #[error("Invalid format: '{0}'")]
    InvalidFormat(String),
}

/// The part of the source image to operate on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    Full,
    /// Largest centred square.
    Square,
    Pixel { x: u32, y: u32, w: u32, h: u32 },
    /// Percentages of the source dimensions.
    Percent { x: f64, y: f64, w: f64, h: f64 },
}

/// How the cropped region is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Full,
    ByWidth(u32),
    ByHeight(u32),
    ByPercent(u32),
    /// Scale to fit within `w`×`h`, preserving aspect ratio.
    BestFit { w: u32, h: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    /// Clockwise degrees in `[0, 360)`.
    pub degrees: f64,
    /// Mirror horizontally before rotating.
    pub mirror: bool,
}

impl Rotation {
    pub fn none() -> Self {
        Self {
            degrees: 0.0,
            mirror: false,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mirror {
            write!(f, "!")?;
        }
        write!(f, "{}", self.degrees)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quality {
    Default,
    Color,
    Gray,
    Bitonal,
    Other(String),
}

impl Quality {
    fn from_token(token: &str) -> Self {
        match token {
            "default" => Quality::Default,
            "color" => Quality::Color,
            "gray" => Quality::Gray,
            "bitonal" => Quality::Bitonal,
            other => Quality::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Quality::Default => "default",
            Quality::Color => "color",
            Quality::Gray => "gray",
            Quality::Bitonal => "bitonal",
            Quality::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Format {
    Jpg,
    Tif,
    Png,
    Gif,
    Jp2,
    Pdf,
    Webp,
    Other(String),
}

impl Format {
    fn from_token(token: &str) -> Self {
        match token {
            "jpg" => Format::Jpg,
            "tif" => Format::Tif,
            "png" => Format::Png,
            "gif" => Format::Gif,
            "jp2" => Format::Jp2,
            "pdf" => Format::Pdf,
            "webp" => Format::Webp,
            other => Format::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Format::Jpg => "jpg",
            Format::Tif => "tif",
            Format::Png => "png",
            Format::Gif => "gif",
            Format::Jp2 => "jp2",
            Format::Pdf => "pdf",
            Format::Webp => "webp",
            Format::Other(s) => s,
        }
    }
}

/// Everything a single image request asks for, in structured form.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformDescriptor {
    pub region: Region,
    pub size: Size,
    pub rotation: Rotation,
    pub quality: Quality,
    pub format: Format,
}

/// Parse the five request components into a [`TransformDescriptor`].
pub fn parse(
    region: &str,
    size: &str,
    rotation: &str,
    quality: &str,
    format: &str,
) -> Result<TransformDescriptor, ParseError> {
    Ok(TransformDescriptor {
        region: parse_region(region)?,
        size: parse_size(size)?,
        rotation: parse_rotation(rotation)?,
        quality: parse_quality(quality)?,
        format: parse_format(format)?,
    })
}

/// Split the final path segment (`default.jpg`) at its last dot.
pub fn split_quality_format(segment: &str) -> Result<(&str, &str), ParseError> {
    segment
        .rsplit_once('.')
        .ok_or_else(|| ParseError::InvalidFormat(segment.to_string()))
}

pub fn parse_region(s: &str) -> Result<Region, ParseError> {
    let invalid = || ParseError::InvalidRegion(s.to_string());

    if let Some(rest) = s.strip_prefix("pct:") {
        let values = rest
            .split(',')
            .map(|t| t.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?;
        let &[x, y, w, h] = values.as_slice() else {
            return Err(invalid());
        };
        if w <= 0.0 || h <= 0.0 {
            return Err(invalid());
        }
        return Ok(Region::Percent { x, y, w, h });
    }

    if s == "square" {
        return Ok(Region::Square);
    }

    if !s.contains(',') {
        return Ok(Region::Full);
    }

    // `u32` parsing rejects negatives, blanks and decimals in one go.
    let values = s
        .split(',')
        .map(|t| t.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;
    let &[x, y, w, h] = values.as_slice() else {
        return Err(invalid());
    };
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok(Region::Pixel { x, y, w, h })
}

pub fn parse_size(s: &str) -> Result<Size, ParseError> {
    let invalid = || ParseError::InvalidSize(s.to_string());
    let positive = |t: &str| t.parse::<u32>().ok().filter(|&v| v > 0).ok_or_else(invalid);

    if let Some(pct) = s.strip_prefix("pct:") {
        return positive(pct).map(Size::ByPercent);
    }

    // Without a comma, `!n` is just another comma-less token and means full.
    if let Some((w, h)) = s.strip_prefix('!').and_then(|rest| rest.split_once(',')) {
        return Ok(Size::BestFit {
            w: positive(w)?,
            h: positive(h)?,
        });
    }

    match s.split_once(',') {
        Some((w, _)) if !w.is_empty() => positive(w).map(Size::ByWidth),
        Some((_, h)) if !h.is_empty() => positive(h).map(Size::ByHeight),
        _ => Ok(Size::Full),
    }
}

pub fn parse_rotation(s: &str) -> Result<Rotation, ParseError> {
    let (mirror, digits) = match s.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    // Plain decimal only; `f64::from_str` would also take `inf`, `NaN` and exponents.
    let well_formed = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return Err(ParseError::InvalidRotation(s.to_string()));
    }
    let degrees: f64 = digits
        .parse()
        .map_err(|_| ParseError::InvalidRotation(s.to_string()))?;
    if !(0.0..360.0).contains(&degrees) {
        return Err(ParseError::InvalidRotation(s.to_string()));
    }
    Ok(Rotation { degrees, mirror })
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn parse_quality(s: &str) -> Result<Quality, ParseError> {
    if !is_token(s) {
        return Err(ParseError::InvalidQuality(s.to_string()));
    }
    Ok(Quality::from_token(s))
}

pub fn parse_format(s: &str) -> Result<Format, ParseError> {
    if !is_token(s) {
        return Err(ParseError::InvalidFormat(s.to_string()));
    }
    Ok(Format::from_token(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Region
    // =========================================================================

    #[test]
    fn region_without_comma_is_full() {
        assert_eq!(parse_region("full").unwrap(), Region::Full);
        assert_eq!(parse_region("anything").unwrap(), Region::Full);
    }

    #[test]
    fn region_pixel() {
        assert_eq!(
            parse_region("100,100,2000,2000").unwrap(),
            Region::Pixel {
                x: 100,
                y: 100,
                w: 2000,
                h: 2000
            }
        );
    }

    #[test]
    fn region_square() {
        assert_eq!(parse_region("square").unwrap(), Region::Square);
    }

    #[test]
    fn region_rejects_wrong_token_count() {
        assert!(matches!(
            parse_region("1,2,3"),
            Err(ParseError::InvalidRegion(_))
        ));
        assert!(matches!(
            parse_region("1,2,3,4,5"),
            Err(ParseError::InvalidRegion(_))
        ));
    }

    #[test]
    fn region_rejects_non_integers_and_negatives() {
        for bad in ["a,0,10,10", "0,0,10.5,10", "-1,0,10,10", "0,0,,10", "0, 0,10,10"] {
            assert!(
                matches!(parse_region(bad), Err(ParseError::InvalidRegion(_))),
                "expected InvalidRegion for {bad:?}"
            );
        }
    }

    #[test]
    fn region_rejects_zero_extent() {
        assert!(matches!(
            parse_region("0,0,0,10"),
            Err(ParseError::InvalidRegion(_))
        ));
        assert!(matches!(
            parse_region("0,0,10,0"),
            Err(ParseError::InvalidRegion(_))
        ));
    }

    #[test]
    fn region_percent() {
        assert_eq!(
            parse_region("pct:10,20,50.5,25").unwrap(),
            Region::Percent {
                x: 10.0,
                y: 20.0,
                w: 50.5,
                h: 25.0
            }
        );
    }

    #[test]
    fn region_percent_rejects_bad_values() {
        for bad in ["pct:10,20,0,25", "pct:-1,0,10,10", "pct:1,2,3", "pct:a,b,c,d", "pct:inf,0,1,1"] {
            assert!(
                matches!(parse_region(bad), Err(ParseError::InvalidRegion(_))),
                "expected InvalidRegion for {bad:?}"
            );
        }
    }

    // =========================================================================
    // Size
    // =========================================================================

    #[test]
    fn size_full_forms() {
        assert_eq!(parse_size("full").unwrap(), Size::Full);
        assert_eq!(parse_size("max").unwrap(), Size::Full);
        assert_eq!(parse_size(",").unwrap(), Size::Full);
    }

    #[test]
    fn size_without_comma_is_full() {
        for token in ["bogus", "300", "!300", "!"] {
            assert_eq!(parse_size(token).unwrap(), Size::Full, "{token:?}");
        }
    }

    #[test]
    fn size_by_width_and_height() {
        assert_eq!(parse_size("200,").unwrap(), Size::ByWidth(200));
        assert_eq!(parse_size(",150").unwrap(), Size::ByHeight(150));
    }

    #[test]
    fn size_width_wins_when_both_present() {
        assert_eq!(parse_size("200,100").unwrap(), Size::ByWidth(200));
    }

    #[test]
    fn size_percent() {
        assert_eq!(parse_size("pct:50").unwrap(), Size::ByPercent(50));
    }

    #[test]
    fn size_best_fit() {
        assert_eq!(
            parse_size("!300,200").unwrap(),
            Size::BestFit { w: 300, h: 200 }
        );
    }

    #[test]
    fn size_rejects_malformed_numbers() {
        for bad in ["pct:0", "pct:-5", "pct:abc", "pct:", "0,", ",0", "x,", "!300,", "!,200", "!0,5"] {
            assert!(
                matches!(parse_size(bad), Err(ParseError::InvalidSize(_))),
                "expected InvalidSize for {bad:?}"
            );
        }
    }

    // =========================================================================
    // Rotation
    // =========================================================================

    #[test]
    fn rotation_plain_and_mirrored() {
        assert_eq!(parse_rotation("0").unwrap(), Rotation::none());
        assert_eq!(
            parse_rotation("!90").unwrap(),
            Rotation {
                degrees: 90.0,
                mirror: true
            }
        );
        assert_eq!(parse_rotation("22.5").unwrap().degrees, 22.5);
    }

    #[test]
    fn rotation_rejects_out_of_range_and_garbage() {
        for bad in ["360", "-90", "", "!", "abc", "NaN", "inf", "1e2", "9..0", "."] {
            assert!(
                matches!(parse_rotation(bad), Err(ParseError::InvalidRotation(_))),
                "expected InvalidRotation for {bad:?}"
            );
        }
    }

    #[test]
    fn rotation_display_matches_request_syntax() {
        assert_eq!(parse_rotation("!90").unwrap().to_string(), "!90");
        assert_eq!(parse_rotation("22.5").unwrap().to_string(), "22.5");
        assert_eq!(parse_rotation("0").unwrap().to_string(), "0");
    }

    // =========================================================================
    // Quality and format
    // =========================================================================

    #[test]
    fn unknown_quality_and_format_parse_as_other() {
        assert_eq!(
            parse_quality("sepia").unwrap(),
            Quality::Other("sepia".into())
        );
        assert_eq!(parse_format("bmp").unwrap(), Format::Other("bmp".into()));
    }

    #[test]
    fn quality_and_format_reject_empty_or_odd_tokens() {
        assert!(matches!(
            parse_quality(""),
            Err(ParseError::InvalidQuality(_))
        ));
        assert!(matches!(
            parse_format("jp-g"),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn split_quality_format_uses_last_dot() {
        assert_eq!(split_quality_format("default.jpg").unwrap(), ("default", "jpg"));
        assert_eq!(split_quality_format("a.b.png").unwrap(), ("a.b", "png"));
        assert!(matches!(
            split_quality_format("default"),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    // =========================================================================
    // Whole descriptor
    // =========================================================================

    #[test]
    fn parse_full_request() {
        let desc = parse("0,0,10,10", "pct:50", "!90", "default", "jpg").unwrap();
        assert_eq!(
            desc,
            TransformDescriptor {
                region: Region::Pixel {
                    x: 0,
                    y: 0,
                    w: 10,
                    h: 10
                },
                size: Size::ByPercent(50),
                rotation: Rotation {
                    degrees: 90.0,
                    mirror: true
                },
                quality: Quality::Default,
                format: Format::Jpg,
            }
        );
    }

    #[test]
    fn parse_is_deterministic() {
        let a = parse("10,20,30,40", "200,", "0", "default", "jpg").unwrap();
        let b = parse("10,20,30,40", "200,", "0", "default", "jpg").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_reports_first_bad_component() {
        assert!(matches!(
            parse("x,y,z,w", "bad,", "0", "default", "jpg"),
            Err(ParseError::InvalidRegion(_))
        ));
        assert!(matches!(
            parse("full", "full", "400", "default", "jpg"),
            Err(ParseError::InvalidRotation(_))
        ));
    }
}
