//! On-disk file provider.

use std::path::{
    Component,
    Path,
    PathBuf,
};
use std::time::SystemTime;

use async_trait::async_trait;

use super::hash::content_hash;
use super::provider::{
    CacheDependency,
    CatalogError,
    VirtualFileRecord,
    ViewFileProvider,
    strip_root,
};

/// Serves virtual paths from a physical directory.
///
/// `~/` maps to the configured root. Paths that would escape the root are
/// never owned.
#[derive(Debug)]
pub struct DiskFileProvider {
    /// Physical directory corresponding to `~/`.
    physical_root: PathBuf,
}

impl DiskFileProvider {
    /// Create a provider over a physical root.
    #[must_use]
    pub fn new(physical_root: impl Into<PathBuf>) -> Self {
        Self { physical_root: physical_root.into() }
    }

    /// Physical path for a virtual path, unless it escapes the root.
    fn physical_path(&self, virtual_path: &str) -> Option<PathBuf> {
        let relative = Path::new(strip_root(virtual_path));

        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            tracing::warn!(path = %virtual_path, "Rejected path escaping the physical root");
            return None;
        }

        Some(self.physical_root.join(relative))
    }

    /// Read a file this provider owns.
    async fn read(&self, virtual_path: &str) -> Result<(PathBuf, Vec<u8>), CatalogError> {
        let Some(path) = self.physical_path(virtual_path) else {
            return Err(CatalogError::NotFound(virtual_path.to_string()));
        };

        match tokio::fs::read(&path).await {
            Ok(content) => Ok((path, content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CatalogError::NotFound(virtual_path.to_string()))
            }
            Err(e) => Err(CatalogError::Io { path: virtual_path.to_string(), source: e }),
        }
    }
}

#[async_trait]
impl ViewFileProvider for DiskFileProvider {
    async fn file_exists(&self, virtual_path: &str) -> bool {
        let Some(path) = self.physical_path(virtual_path) else {
            return false;
        };
        tokio::fs::metadata(&path).await.is_ok_and(|metadata| metadata.is_file())
    }

    async fn get_file(&self, virtual_path: &str) -> Result<VirtualFileRecord, CatalogError> {
        let (path, content) = self.read(virtual_path).await?;

        let last_modified = tokio::fs::metadata(&path)
            .await
            .and_then(|metadata| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        Ok(VirtualFileRecord {
            virtual_path: virtual_path.to_string(),
            content_hash: content_hash(&[&content]),
            content,
            last_modified,
        })
    }

    async fn cache_key(&self, _virtual_path: &str) -> Option<String> {
        // The host's default key scheme already works for physical files.
        None
    }

    async fn file_hash(&self, virtual_path: &str, dependencies: &[String]) -> Option<String> {
        let (_, content) = self.read(virtual_path).await.ok()?;

        let mut parts: Vec<Vec<u8>> = vec![content];
        for dependency in dependencies {
            if let Ok((_, dependency_content)) = self.read(dependency).await {
                parts.push(dependency_content);
            }
        }

        let slices: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
        Some(content_hash(&slices))
    }

    async fn cache_dependency(
        &self,
        virtual_path: &str,
        dependencies: &[String],
    ) -> Result<Option<CacheDependency>, CatalogError> {
        if !self.file_exists(virtual_path).await {
            return Err(CatalogError::NotFound(virtual_path.to_string()));
        }

        let mut files = Vec::with_capacity(dependencies.len() + 1);
        if let Some(path) = self.physical_path(virtual_path) {
            files.push(path);
        }
        for dependency in dependencies {
            if let Some(path) = self.physical_path(dependency)
                && tokio::fs::metadata(&path).await.is_ok()
            {
                files.push(path);
            }
        }

        Ok(Some(CacheDependency { files, start: SystemTime::now() }))
    }
}
