//! 仮想パスを解決するカタログ

use std::sync::Arc;

use super::fixer::ViewFixer;
use super::hash::content_hash;
use super::provider::{
    CacheDependency,
    CatalogError,
    VirtualFileRecord,
    ViewFileProvider,
};
use crate::config::{
    ConfigError,
    LocalizationSettings,
    ValidationError,
    ViewSourceOrder,
};

/// Collects providers before the catalog is published.
///
/// Registration happens during single-threaded startup; [`build`](Self::build)
/// freezes the ordered list. Provider order is the resolution priority: the
/// first provider claiming a path serves it.
#[derive(Default)]
pub struct VirtualFileCatalogBuilder {
    /// Providers in resolution priority order.
    providers: Vec<Arc<dyn ViewFileProvider>>,

    /// Rewrite applied to view files before serving.
    fixer: Option<ViewFixer>,

    /// Extensions (with leading dot) treated as view files.
    view_extensions: Vec<String>,
}

impl VirtualFileCatalogBuilder {
    /// Create an empty builder with the default view extension.
    #[must_use]
    pub fn new() -> Self {
        Self { providers: Vec::new(), fixer: None, view_extensions: vec![".cshtml".to_string()] }
    }

    /// Append a provider. Earlier registrations win lookups.
    #[must_use]
    pub fn register(mut self, provider: Arc<dyn ViewFileProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Register a disk and an embedded provider in the configured order.
    ///
    /// Which source wins overlapping paths is a deployment decision, so the
    /// order always arrives as configuration.
    #[must_use]
    pub fn register_sources(
        self,
        order: ViewSourceOrder,
        disk: Arc<dyn ViewFileProvider>,
        embedded: Arc<dyn ViewFileProvider>,
    ) -> Self {
        match order {
            ViewSourceOrder::DiskFirst => self.register(disk).register(embedded),
            ViewSourceOrder::EmbeddedFirst => self.register(embedded).register(disk),
        }
    }

    /// Set the view rewrite.
    #[must_use]
    pub fn with_fixer(mut self, fixer: ViewFixer) -> Self {
        self.fixer = Some(fixer);
        self
    }

    /// Take the view extensions and rewrite directives from loaded settings.
    #[must_use]
    pub fn with_settings(self, settings: &LocalizationSettings) -> Self {
        self.view_extensions(settings.view_extensions.clone())
            .with_fixer(ViewFixer::new(settings.fixer.clone()))
    }

    /// Replace the extensions treated as view files.
    #[must_use]
    pub fn view_extensions(mut self, extensions: Vec<String>) -> Self {
        self.view_extensions = extensions;
        self
    }

    /// Freeze the registration list into a catalog.
    ///
    /// # Errors
    /// [`ConfigError::ValidationErrors`] when no provider was registered.
    pub fn build(self) -> Result<VirtualFileCatalog, ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::ValidationErrors(vec![ValidationError::new(
                "providers",
                "At least one file provider is required",
            )]));
        }

        Ok(VirtualFileCatalog {
            providers: self.providers.into(),
            fixer: self.fixer,
            view_extensions: self.view_extensions,
        })
    }
}

impl std::fmt::Debug for VirtualFileCatalogBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFileCatalogBuilder")
            .field("providers", &self.providers.len())
            .field("fixer", &self.fixer.is_some())
            .field("view_extensions", &self.view_extensions)
            .finish()
    }
}

/// Resolves virtual paths across an ordered list of file providers.
///
/// The provider list is immutable after
/// [`VirtualFileCatalogBuilder::build`], so lookups take no lock. View files
/// are piped through the configured rewrite before they are served; all
/// other content is served verbatim.
#[derive(Clone)]
pub struct VirtualFileCatalog {
    /// Providers in resolution priority order.
    providers: Arc<[Arc<dyn ViewFileProvider>]>,

    /// Rewrite applied to view files before serving.
    fixer: Option<ViewFixer>,

    /// Extensions (with leading dot) treated as view files.
    view_extensions: Vec<String>,
}

impl VirtualFileCatalog {
    /// Start building a catalog.
    #[must_use]
    pub fn builder() -> VirtualFileCatalogBuilder {
        VirtualFileCatalogBuilder::new()
    }

    /// Whether any provider claims the path.
    pub async fn file_exists(&self, virtual_path: &str) -> bool {
        self.owning_provider(virtual_path).await.is_some()
    }

    /// Resolve a path to its content.
    ///
    /// # Errors
    /// [`CatalogError::NotFound`] when no provider claims the path;
    /// [`CatalogError::InvalidText`] when a view file is not valid UTF-8.
    pub async fn get_file(&self, virtual_path: &str) -> Result<VirtualFileRecord, CatalogError> {
        let Some(provider) = self.owning_provider(virtual_path).await else {
            return Err(CatalogError::NotFound(virtual_path.to_string()));
        };

        let mut record = provider.get_file(virtual_path).await?;

        if self.is_view(virtual_path)
            && let Some(fixer) = &self.fixer
        {
            let text = String::from_utf8(record.content)
                .map_err(|_| CatalogError::InvalidText(virtual_path.to_string()))?;
            let fixed = fixer.correct_view(virtual_path, &text);
            record.content = fixed.into_bytes();
            record.content_hash = content_hash(&[&record.content]);
            tracing::debug!(path = %virtual_path, "Served rewritten view");
        }

        Ok(record)
    }

    /// Cache key of the owning provider, when it defines one.
    pub async fn cache_key(&self, virtual_path: &str) -> Option<String> {
        let provider = self.owning_provider(virtual_path).await?;
        provider.cache_key(virtual_path).await
    }

    /// Content hash of the owning provider.
    ///
    /// `None` when no provider claims the path.
    pub async fn content_hash(
        &self,
        virtual_path: &str,
        dependencies: &[String],
    ) -> Option<String> {
        let provider = self.owning_provider(virtual_path).await?;
        provider.file_hash(virtual_path, dependencies).await
    }

    /// Change-detection advice of the owning provider.
    ///
    /// `Ok(None)` disables caching for the file.
    ///
    /// # Errors
    /// [`CatalogError::NotFound`] when no provider claims the path.
    pub async fn cache_dependency(
        &self,
        virtual_path: &str,
        dependencies: &[String],
    ) -> Result<Option<CacheDependency>, CatalogError> {
        let Some(provider) = self.owning_provider(virtual_path).await else {
            return Err(CatalogError::NotFound(virtual_path.to_string()));
        };
        provider.cache_dependency(virtual_path, dependencies).await
    }

    /// First provider claiming the path.
    async fn owning_provider(&self, virtual_path: &str) -> Option<&Arc<dyn ViewFileProvider>> {
        for provider in self.providers.iter() {
            if provider.file_exists(virtual_path).await {
                return Some(provider);
            }
        }
        None
    }

    /// Whether the path is served as a view file.
    fn is_view(&self, virtual_path: &str) -> bool {
        let lowered = virtual_path.to_lowercase();
        self.view_extensions.iter().any(|extension| lowered.ends_with(&extension.to_lowercase()))
    }
}

impl std::fmt::Debug for VirtualFileCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFileCatalog")
            .field("providers", &self.providers.len())
            .field("fixer", &self.fixer.is_some())
            .field("view_extensions", &self.view_extensions)
            .finish()
    }
}
