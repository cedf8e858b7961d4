//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ## Check
//!
//! ```text
//! Config
//!     base_uri: http://localhost/
//!     bind: 127.0.0.1:8000
//!     jpeg_quality: 95
//!     workers: 8
//!
//! Search roots
//! 001 /srv/images (120 images)
//! 002 /mnt/missing (not a directory)
//! ```
//!
//! ## Render
//!
//! ```text
//! page-01.jpg → out.jpg (48213 bytes)
//!     Canonical: http://localhost/iiif/2/page-01.jpg/full/500,/0/default.jpg
//! ```

use crate::config::{ServerConfig, effective_threads};
use crate::service::RenderedImage;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Summarise the resolved config and what each search root holds.
pub fn format_check_output(config: &ServerConfig, counts: &[(PathBuf, usize)]) -> Vec<String> {
    let workers = match config.processing.max_processes {
        Some(_) => effective_threads(&config.processing).to_string(),
        None => format!("{} (auto)", effective_threads(&config.processing)),
    };
    let mut lines = vec![
        "Config".to_string(),
        format!("{}base_uri: {}", indent(1), config.base_uri),
        format!("{}bind: {}", indent(1), config.server.bind),
        format!("{}jpeg_quality: {}", indent(1), config.encoding.jpeg_quality),
        format!("{}workers: {}", indent(1), workers),
        format!(
            "{}max output: {} px per side, {} px total",
            indent(1),
            config.limits.max_width,
            config.limits.max_area
        ),
        String::new(),
        "Search roots".to_string(),
    ];

    for (i, (root, count)) in counts.iter().enumerate() {
        let detail = if root.is_dir() {
            plural(*count, "image")
        } else {
            "not a directory".to_string()
        };
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            root.display(),
            detail
        ));
    }
    lines
}

pub fn print_check_output(config: &ServerConfig, counts: &[(PathBuf, usize)]) {
    for line in format_check_output(config, counts) {
        println!("{}", line);
    }
}

/// Describe a render written to disk.
pub fn format_render_output(filename: &str, output: &Path, image: &RenderedImage) -> Vec<String> {
    vec![
        format!(
            "{} → {} ({})",
            filename,
            output.display(),
            plural(image.bytes.len(), "byte")
        ),
        format!("{}Canonical: {}", indent(1), image.canonical_uri),
    ]
}

pub fn print_render_output(filename: &str, output: &Path, image: &RenderedImage) {
    for line in format_render_output(filename, output, image) {
        println!("{}", line);
    }
}
