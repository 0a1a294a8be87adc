//! Embedded-resource file provider.
//!
//! Serves view and content files packaged inside the application binary, so
//! a library can ship its views without installing them on disk. Bundles are
//! typically filled from `include_str!`/`include_bytes!` tables at compile
//! time.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
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

/// A named set of embedded resources.
///
/// The Rust analog of a compiled module carrying resources: an immutable
/// map from resource name to content, addressed by dot-separated names.
#[derive(Debug, Default)]
pub struct ResourceBundle {
    /// Name of the bundle, used in cache keys.
    name: String,

    /// Resource content by dot-separated resource name.
    resources: HashMap<String, Cow<'static, [u8]>>,
}

impl ResourceBundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), resources: HashMap::new() }
    }

    /// Add a resource. Compile-time content arrives borrowed
    /// (`include_bytes!`), generated content owned.
    pub fn insert(
        &mut self,
        resource_name: impl Into<String>,
        content: impl Into<Cow<'static, [u8]>>,
    ) {
        self.resources.insert(resource_name.into(), content.into());
    }

    /// Bundle name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resource content by name.
    #[must_use]
    pub fn get(&self, resource_name: &str) -> Option<&[u8]> {
        self.resources.get(resource_name).map(AsRef::as_ref)
    }
}

/// Maps the application root (`~/`) to a namespace prefix inside a bundle.
#[derive(Debug, Clone)]
pub struct NamespaceMapping {
    /// Bundle the resources live in.
    bundle: Arc<ResourceBundle>,

    /// Namespace corresponding to the application root.
    root_namespace: String,
}

impl NamespaceMapping {
    /// Map `~/` to `root_namespace` inside `bundle`.
    #[must_use]
    pub fn new(bundle: Arc<ResourceBundle>, root_namespace: impl Into<String>) -> Self {
        Self { bundle, root_namespace: root_namespace.into() }
    }

    /// Resource name a virtual path maps to under this mapping.
    ///
    /// `~/Views/Home/Index.cshtml` with root `My.Lib` maps to
    /// `My.Lib.Views.Home.Index.cshtml`.
    fn resource_name(&self, virtual_path: &str) -> String {
        let relative = strip_root(virtual_path).replace('/', ".");
        format!("{}.{relative}", self.root_namespace)
    }

    /// Content of the path under this mapping, when the resource exists.
    fn lookup(&self, virtual_path: &str) -> Option<&[u8]> {
        self.bundle.get(&self.resource_name(virtual_path))
    }
}

/// Serves virtual paths from embedded resource bundles.
///
/// Mappings are consulted in registration order; the first mapping owning a
/// path wins. The mapping set is fixed once the provider is registered on a
/// catalog.
#[derive(Debug, Default)]
pub struct EmbeddedFileProvider {
    /// Mappings in registration order.
    mappings: Vec<NamespaceMapping>,
}

impl EmbeddedFileProvider {
    /// Create a provider without mappings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a namespace mapping. Earlier mappings win overlapping paths.
    pub fn add(&mut self, mapping: NamespaceMapping) {
        self.mappings.push(mapping);
    }

    /// The first mapping owning a path, with the resource content.
    fn owning_mapping(&self, virtual_path: &str) -> Option<(&NamespaceMapping, &[u8])> {
        self.mappings
            .iter()
            .find_map(|mapping| mapping.lookup(virtual_path).map(|content| (mapping, content)))
    }
}

#[async_trait]
impl ViewFileProvider for EmbeddedFileProvider {
    async fn file_exists(&self, virtual_path: &str) -> bool {
        self.owning_mapping(virtual_path).is_some()
    }

    async fn get_file(&self, virtual_path: &str) -> Result<VirtualFileRecord, CatalogError> {
        let Some((_, content)) = self.owning_mapping(virtual_path) else {
            return Err(CatalogError::NotFound(virtual_path.to_string()));
        };

        Ok(VirtualFileRecord {
            virtual_path: virtual_path.to_string(),
            content: content.to_vec(),
            // Embedded content carries no timestamp of its own.
            last_modified: SystemTime::UNIX_EPOCH,
            content_hash: content_hash(&[content]),
        })
    }

    async fn cache_key(&self, virtual_path: &str) -> Option<String> {
        self.owning_mapping(virtual_path).map(|(mapping, _)| {
            format!("{}:{}", mapping.bundle.name(), mapping.resource_name(virtual_path))
        })
    }

    async fn file_hash(&self, virtual_path: &str, dependencies: &[String]) -> Option<String> {
        let (_, content) = self.owning_mapping(virtual_path)?;

        let mut parts: Vec<&[u8]> = vec![content];
        for dependency in dependencies {
            if let Some((_, dependency_content)) = self.owning_mapping(dependency) {
                parts.push(dependency_content);
            }
        }
        Some(content_hash(&parts))
    }

    async fn cache_dependency(
        &self,
        virtual_path: &str,
        _dependencies: &[String],
    ) -> Result<Option<CacheDependency>, CatalogError> {
        if self.owning_mapping(virtual_path).is_none() {
            return Err(CatalogError::NotFound(virtual_path.to_string()));
        }
        // No watchable file backs an embedded resource, so caching is
        // disabled rather than served a dependency that never fires.
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    fn bundle_with(name: &str, resources: &[(&str, &str)]) -> Arc<ResourceBundle> {
        let mut bundle = ResourceBundle::new(name);
        for (resource_name, content) in resources {
            bundle.insert(*resource_name, content.as_bytes().to_vec());
        }
        Arc::new(bundle)
    }

    fn provider_with(mappings: Vec<NamespaceMapping>) -> EmbeddedFileProvider {
        let mut provider = EmbeddedFileProvider::new();
        for mapping in mappings {
            provider.add(mapping);
        }
        provider
    }

    #[tokio::test]
    async fn maps_virtual_path_to_resource_name() {
        let bundle = bundle_with(
            "my-lib",
            &[("My.Lib.Views.Home.Index.cshtml", "<h1>Hi</h1>")],
        );
        let provider = provider_with(vec![NamespaceMapping::new(bundle, "My.Lib")]);

        let exists = provider.file_exists("~/Views/Home/Index.cshtml").await;
        let record = provider.get_file("~/Views/Home/Index.cshtml").await.unwrap();

        assert_that!(exists, eq(true));
        assert_that!(record.content, eq(&b"<h1>Hi</h1>".to_vec()));
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let bundle = bundle_with("my-lib", &[]);
        let provider = provider_with(vec![NamespaceMapping::new(bundle, "My.Lib")]);

        let exists = provider.file_exists("~/Views/Missing.cshtml").await;
        let result = provider.get_file("~/Views/Missing.cshtml").await;

        assert_that!(exists, eq(false));
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn first_registered_mapping_wins() {
        let first = bundle_with("first", &[("A.Views.Index.cshtml", "from first")]);
        let second = bundle_with("second", &[("B.Views.Index.cshtml", "from second")]);
        let provider = provider_with(vec![
            NamespaceMapping::new(first, "A"),
            NamespaceMapping::new(second, "B"),
        ]);

        let record = provider.get_file("~/Views/Index.cshtml").await.unwrap();

        assert_that!(record.content, eq(&b"from first".to_vec()));
    }

    #[tokio::test]
    async fn cache_key_is_the_qualified_resource_name() {
        let bundle = bundle_with("my-lib", &[("My.Lib.Views.Index.cshtml", "x")]);
        let provider = provider_with(vec![NamespaceMapping::new(bundle, "My.Lib")]);

        let cache_key = provider.cache_key("~/Views/Index.cshtml").await;

        assert_that!(cache_key, some(eq("my-lib:My.Lib.Views.Index.cshtml")));
    }

    #[tokio::test]
    async fn cache_dependency_disables_caching_for_owned_paths() {
        let bundle = bundle_with("my-lib", &[("My.Lib.Views.Index.cshtml", "x")]);
        let provider = provider_with(vec![NamespaceMapping::new(bundle, "My.Lib")]);

        let owned = provider.cache_dependency("~/Views/Index.cshtml", &[]).await;
        let missing = provider.cache_dependency("~/Views/Missing.cshtml", &[]).await;

        assert_that!(owned, ok(none()));
        assert!(matches!(missing, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn file_hash_is_stable_and_covers_dependencies() {
        let bundle = bundle_with(
            "my-lib",
            &[
                ("My.Lib.Views.Index.cshtml", "view"),
                ("My.Lib.Views.Shared._Layout.cshtml", "layout"),
            ],
        );
        let provider = provider_with(vec![NamespaceMapping::new(bundle, "My.Lib")]);
        let dependencies = vec!["~/Views/Shared/_Layout.cshtml".to_string()];

        let first = provider.file_hash("~/Views/Index.cshtml", &dependencies).await.unwrap();
        let second = provider.file_hash("~/Views/Index.cshtml", &dependencies).await.unwrap();
        let without_dependencies = provider.file_hash("~/Views/Index.cshtml", &[]).await.unwrap();

        assert_that!(first, eq(second.as_str()));
        assert_that!(first, not(eq(without_dependencies.as_str())));
    }
}
