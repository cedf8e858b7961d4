//! Filename resolution against the configured search roots.
//!
//! Requests name images by bare filename (`a.jpg`), not by path. The
//! [`Resolver`] trait maps that name to a [`SourceHandle`] the backend can
//! open. [`FsResolver`] walks each search root in configuration order and
//! returns the first regular file with a matching name.
//!
//! Traversal order within a root is sorted by file name, so for a fixed
//! on-disk state the same name always resolves to the same file. When two
//! roots (or two directories under one root) hold a file with the same name,
//! the first one discovered wins.
//!
//! Names containing a path separator or `..` never match anything: a request
//! cannot walk out of the search roots.

use crate::config::ServerConfig;
use crate::imaging::is_supported_image;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Image [{0}] not found")]
    NotFound(String),
}

/// Opaque reference to a located source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle(PathBuf);

impl SourceHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Maps a requested filename to a source the backend can open.
///
/// Implementations must be deterministic for a fixed on-disk state.
pub trait Resolver: Send + Sync {
    fn resolve(&self, filename: &str) -> Result<SourceHandle, ResolveError>;
}

/// Resolver that walks directory trees on every call.
#[derive(Debug, Clone)]
pub struct FsResolver {
    roots: Vec<PathBuf>,
}

impl FsResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.search_roots.clone())
    }

    fn walk(root: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    debug!(root = %root.display(), error = %err, "skipping unreadable entry");
                    None
                }
            })
            // Symlinks to files count; symlinked directories are not descended into.
            .filter(|e| e.file_type().is_file() || (e.path_is_symlink() && e.path().is_file()))
    }

    /// Number of decodable images under each root, in root order.
    pub fn count_images(&self) -> Vec<(PathBuf, usize)> {
        self.roots
            .iter()
            .map(|root| {
                let count = Self::walk(root)
                    .filter(|e| is_supported_image(e.path()))
                    .count();
                (root.clone(), count)
            })
            .collect()
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

impl Resolver for FsResolver {
    fn resolve(&self, filename: &str) -> Result<SourceHandle, ResolveError> {
        if !is_plain_filename(filename) {
            return Err(ResolveError::NotFound(filename.to_string()));
        }
        self.roots
            .iter()
            .flat_map(|root| Self::walk(root))
            .find(|e| e.file_name() == filename)
            .map(|e| SourceHandle::new(e.into_path()))
            .ok_or_else(|| ResolveError::NotFound(filename.to_string()))
    }
}
