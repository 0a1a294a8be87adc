//! View file provider seam.

use std::path::PathBuf;
use std::time::SystemTime;

use async_trait::async_trait;
use thiserror::Error;

/// Defines errors that may occur while resolving a virtual path
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Error when no provider claims the path
    #[error("No provider claims '{0}'")]
    NotFound(String),
    /// Error when reading the underlying content fails
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// Virtual path the read was for.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Error when view content to rewrite is not valid UTF-8
    #[error("View content at '{0}' is not valid UTF-8")]
    InvalidText(String),
}

/// Change-detection advice for a served file.
///
/// Hosts watch the listed physical files and evict their cached copy when
/// one changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDependency {
    /// Physical files the cached copy depends on.
    pub files: Vec<PathBuf>,

    /// When the virtual resource was read.
    pub start: SystemTime,
}

/// A file resolved from a virtual path.
///
/// Built lazily on each lookup; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFileRecord {
    /// The path the file was requested under.
    pub virtual_path: String,

    /// Served content.
    pub content: Vec<u8>,

    /// Last modification of the underlying source, when known.
    pub last_modified: SystemTime,

    /// Hex digest of the served content.
    pub content_hash: String,
}

/// A source of virtual file content.
///
/// Providers are registered in priority order on the catalog; the first
/// provider claiming a path serves it.
#[async_trait]
pub trait ViewFileProvider: Send + Sync {
    /// Whether this provider owns `virtual_path`.
    async fn file_exists(&self, virtual_path: &str) -> bool;

    /// The raw file.
    ///
    /// # Errors
    /// [`CatalogError::NotFound`] when the provider does not own the path.
    async fn get_file(&self, virtual_path: &str) -> Result<VirtualFileRecord, CatalogError>;

    /// Cache key for the path, when the provider defines one.
    ///
    /// `None` lets the host fall back to its default key scheme.
    async fn cache_key(&self, virtual_path: &str) -> Option<String>;

    /// Hash over the current content of the path and those of its
    /// dependencies this provider owns.
    ///
    /// `None` when the path is not owned. A new hash appears whenever the
    /// underlying content changes; unchanged content keeps the hash stable.
    async fn file_hash(&self, virtual_path: &str, dependencies: &[String]) -> Option<String>;

    /// Change-detection advice for the path.
    ///
    /// `Ok(None)` disables caching for the file, which is distinct from
    /// [`CatalogError::NotFound`].
    async fn cache_dependency(
        &self,
        virtual_path: &str,
        dependencies: &[String],
    ) -> Result<Option<CacheDependency>, CatalogError>;
}

/// Strip the application-root marker from a virtual path.
///
/// `~/Views/Home/Index.cshtml` and `/Views/Home/Index.cshtml` both yield
/// `Views/Home/Index.cshtml`.
#[must_use]
pub(crate) fn strip_root(virtual_path: &str) -> &str {
    virtual_path
        .strip_prefix("~/")
        .or_else(|| virtual_path.strip_prefix('/'))
        .unwrap_or(virtual_path)
}
