//! 翻訳文字列の解決を行うストア

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::repository::{
    RepositoryError,
    TranslationRepository,
};
use crate::config::{
    ConfigError,
    ValidationError,
};
use crate::types::{
    Locale,
    TranslationEntry,
    TranslationFilter,
    TranslationKey,
};

/// Collects repositories before the store is published.
///
/// Registration happens during single-threaded startup; [`build`](Self::build)
/// freezes the ordered list. Repository order is the resolution priority.
#[derive(Default)]
pub struct TranslationStoreBuilder {
    /// Repositories in resolution priority order.
    repositories: Vec<Arc<dyn TranslationRepository>>,

    /// The repository designated to receive writes.
    writer: Option<Arc<dyn TranslationRepository>>,

    /// Registration problems reported at build time.
    errors: Vec<ValidationError>,
}

impl TranslationStoreBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a read-only repository. Earlier registrations win lookups.
    #[must_use]
    pub fn register(mut self, repository: Arc<dyn TranslationRepository>) -> Self {
        self.repositories.push(repository);
        self
    }

    /// Append a repository that also receives writes.
    ///
    /// At most one repository may be designated; a second designation is a
    /// configuration error surfaced by [`build`](Self::build).
    #[must_use]
    pub fn register_writable(mut self, repository: Arc<dyn TranslationRepository>) -> Self {
        if self.writer.is_some() {
            self.errors.push(ValidationError::new(
                "repositories",
                "Only one repository may be designated writable",
            ));
        } else {
            self.writer = Some(repository.clone());
        }
        self.repositories.push(repository);
        self
    }

    /// Freeze the registration list into a store.
    ///
    /// # Errors
    /// [`ConfigError::ValidationErrors`] when no repository was registered or
    /// more than one was designated writable.
    pub fn build(mut self) -> Result<TranslationStore, ConfigError> {
        if self.repositories.is_empty() {
            self.errors.push(ValidationError::new(
                "repositories",
                "At least one repository is required",
            ));
        }
        if !self.errors.is_empty() {
            return Err(ConfigError::ValidationErrors(self.errors));
        }

        Ok(TranslationStore { repositories: self.repositories.into(), writer: self.writer })
    }
}

impl std::fmt::Debug for TranslationStoreBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationStoreBuilder")
            .field("repositories", &self.repositories.len())
            .field("writer", &self.writer.is_some())
            .finish()
    }
}

/// Resolves localized strings across an ordered list of repositories.
///
/// Lookups probe each repository for the exact locale and then the neutral
/// locale before moving on; the first non-empty translation wins. A missing
/// translation is never an error: resolution falls back to the caller's
/// default text, or the bare text key.
///
/// The repository list is immutable after [`TranslationStoreBuilder::build`],
/// so lookups take no lock of their own.
#[derive(Clone)]
pub struct TranslationStore {
    /// Repositories in resolution priority order.
    repositories: Arc<[Arc<dyn TranslationRepository>]>,

    /// The repository receiving writes, when one was designated.
    writer: Option<Arc<dyn TranslationRepository>>,
}

impl TranslationStore {
    /// Start building a store.
    #[must_use]
    pub fn builder() -> TranslationStoreBuilder {
        TranslationStoreBuilder::new()
    }

    /// Resolve a localized string, falling back to the bare text key.
    pub async fn resolve(&self, key: &TranslationKey) -> String {
        match self.lookup(key).await {
            Some(text) => text,
            None => key.text_key.clone(),
        }
    }

    /// Resolve a localized string, falling back to `default_text` (or the
    /// bare text key when `default_text` is empty).
    pub async fn resolve_or(&self, key: &TranslationKey, default_text: &str) -> String {
        match self.lookup(key).await {
            Some(text) => text,
            None if default_text.is_empty() => key.text_key.clone(),
            None => default_text.to_string(),
        }
    }

    /// Resolve with a deadline.
    ///
    /// When the repositories cannot answer in time the fallback value is
    /// returned; cancellation never surfaces as a lookup failure.
    pub async fn resolve_within(&self, key: &TranslationKey, deadline: Duration) -> String {
        match tokio::time::timeout(deadline, self.lookup(key)).await {
            Ok(Some(text)) => text,
            Ok(None) => key.text_key.clone(),
            Err(_elapsed) => {
                tracing::warn!(key = %key.text_key, locale = %key.locale, "Lookup deadline expired, using fallback");
                key.text_key.clone()
            }
        }
    }

    /// Probe the repositories in priority order.
    async fn lookup(&self, key: &TranslationKey) -> Option<String> {
        for repository in self.repositories.iter() {
            if let Some(text) = Self::probe(repository.as_ref(), key).await {
                return Some(text);
            }

            if !key.locale.is_neutral() {
                let neutral = key.with_locale(Locale::neutral());
                if let Some(text) = Self::probe(repository.as_ref(), &neutral).await {
                    return Some(text);
                }
            }
        }
        None
    }

    /// One repository probe. Errors count as a miss for that repository.
    async fn probe(repository: &dyn TranslationRepository, key: &TranslationKey) -> Option<String> {
        match repository.get(key).await {
            Ok(Some(entry)) if entry.is_translated() => Some(entry.translated_text),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key = %key.text_key, locale = %key.locale, error = %e, "Repository read failed, treated as miss");
                None
            }
        }
    }

    /// Upsert an entry through the designated writable repository.
    ///
    /// # Errors
    /// [`RepositoryError::ReadOnly`] when no repository was designated
    /// writable; otherwise whatever the writer reports. Failures here are
    /// always surfaced so an administrator knows the edit did not persist.
    pub async fn save(&self, entry: &TranslationEntry) -> Result<(), RepositoryError> {
        let Some(writer) = &self.writer else {
            return Err(RepositoryError::ReadOnly);
        };

        writer.save(entry).await?;
        tracing::debug!(key = %entry.key.text_key, locale = %entry.key.locale, "Translation saved");
        Ok(())
    }

    /// Administrative listing across every repository.
    ///
    /// Repositories are queried concurrently; duplicates keep the entry of
    /// the highest-priority repository; the result is ordered by text key
    /// ascending.
    ///
    /// # Errors
    /// Unlike [`resolve`](Self::resolve), query failures are surfaced.
    pub async fn list_by_filter(
        &self,
        filter: &TranslationFilter,
    ) -> Result<Vec<TranslationEntry>, RepositoryError> {
        let results =
            join_all(self.repositories.iter().map(|repository| repository.query(filter))).await;

        let mut seen = std::collections::HashSet::new();
        let mut merged = Vec::new();
        for result in results {
            for entry in result? {
                if seen.insert(entry.key.clone()) {
                    merged.push(entry);
                }
            }
        }

        merged.sort_by(|a, b| a.key.text_key.cmp(&b.key.text_key));
        Ok(merged)
    }
}

impl std::fmt::Debug for TranslationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationStore")
            .field("repositories", &self.repositories.len())
            .field("writer", &self.writer.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use googletest::prelude::*;

    use super::*;
    use crate::store::MemoryRepository;

    /// Repository whose reads always fail.
    struct UnreachableRepository;

    #[async_trait]
    impl TranslationRepository for UnreachableRepository {
        async fn get(
            &self,
            _key: &TranslationKey,
        ) -> Result<Option<TranslationEntry>, RepositoryError> {
            Err(RepositoryError::Unreachable(std::io::Error::other("connection refused")))
        }

        async fn save(&self, _entry: &TranslationEntry) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unreachable(std::io::Error::other("connection refused")))
        }

        async fn query(
            &self,
            _filter: &TranslationFilter,
        ) -> Result<Vec<TranslationEntry>, RepositoryError> {
            Err(RepositoryError::Unreachable(std::io::Error::other("connection refused")))
        }
    }

    fn key(text_key: &str, tag: &str) -> TranslationKey {
        TranslationKey::new(text_key, Locale::parse(tag).unwrap())
    }

    fn store_with(repositories: Vec<Arc<dyn TranslationRepository>>) -> TranslationStore {
        let mut builder = TranslationStore::builder();
        for repository in repositories {
            builder = builder.register(repository);
        }
        builder.build().unwrap()
    }

    #[tokio::test]
    async fn resolve_prefers_exact_locale() {
        let repository = MemoryRepository::with_entries([
            TranslationEntry::translated(key("greeting", "sv"), "Hej"),
            TranslationEntry::translated(
                TranslationKey::new("greeting", Locale::neutral()),
                "Hello",
            ),
        ]);
        let store = store_with(vec![Arc::new(repository)]);

        let text = store.resolve(&key("greeting", "sv")).await;

        assert_that!(text, eq("Hej"));
    }

    #[tokio::test]
    async fn resolve_falls_back_to_neutral_locale() {
        let repository = MemoryRepository::with_entries([TranslationEntry::translated(
            TranslationKey::new("greeting", Locale::neutral()),
            "Hello",
        )]);
        let store = store_with(vec![Arc::new(repository)]);

        let text = store.resolve(&key("greeting", "sv")).await;

        assert_that!(text, eq("Hello"));
    }

    #[tokio::test]
    async fn resolve_falls_back_to_bare_key() {
        let store = store_with(vec![Arc::new(MemoryRepository::new())]);

        let text = store.resolve(&key("menu.logout", "sv")).await;

        assert_that!(text, eq("menu.logout"));
    }

    #[tokio::test]
    async fn resolve_or_uses_caller_default() {
        let store = store_with(vec![Arc::new(MemoryRepository::new())]);

        let text = store.resolve_or(&key("menu.logout", "sv"), "Log out").await;

        assert_that!(text, eq("Log out"));
    }

    #[tokio::test]
    async fn resolve_or_with_empty_default_uses_bare_key() {
        let store = store_with(vec![Arc::new(MemoryRepository::new())]);

        let text = store.resolve_or(&key("menu.logout", "sv"), "").await;

        assert_that!(text, eq("menu.logout"));
    }

    #[tokio::test]
    async fn empty_translation_falls_through_to_default() {
        let untranslated = TranslationEntry::new(key("menu.logout", "sv"), "Log out");
        let store =
            store_with(vec![Arc::new(MemoryRepository::with_entries([untranslated]))]);

        let text = store.resolve_or(&key("menu.logout", "sv"), "Log out").await;

        assert_that!(text, eq("Log out"));
    }

    #[tokio::test]
    async fn first_repository_wins() {
        let first = MemoryRepository::with_entries([TranslationEntry::translated(
            key("greeting", "sv"),
            "Hej",
        )]);
        let second = MemoryRepository::with_entries([TranslationEntry::translated(
            key("greeting", "sv"),
            "Tjena",
        )]);
        let store = store_with(vec![Arc::new(first), Arc::new(second)]);

        let text = store.resolve(&key("greeting", "sv")).await;

        assert_that!(text, eq("Hej"));
    }

    #[tokio::test]
    async fn read_failures_are_absorbed() {
        let fallback = MemoryRepository::with_entries([TranslationEntry::translated(
            key("greeting", "sv"),
            "Hej",
        )]);
        let store = store_with(vec![Arc::new(UnreachableRepository), Arc::new(fallback)]);

        let text = store.resolve(&key("greeting", "sv")).await;

        assert_that!(text, eq("Hej"));
    }

    #[tokio::test]
    async fn save_round_trips_through_resolve() {
        let store = TranslationStore::builder()
            .register_writable(Arc::new(MemoryRepository::new()))
            .build()
            .unwrap();
        let entry = TranslationEntry::translated(key("greeting", "sv"), "Hej");

        store.save(&entry).await.unwrap();
        let text = store.resolve(&entry.key).await;

        assert_that!(text, eq("Hej"));
    }

    #[tokio::test]
    async fn save_without_writer_is_rejected() {
        let store = store_with(vec![Arc::new(MemoryRepository::new())]);
        let entry = TranslationEntry::translated(key("greeting", "sv"), "Hej");

        let result = store.save(&entry).await;

        assert!(matches!(result, Err(RepositoryError::ReadOnly)));
    }

    #[tokio::test]
    async fn save_failures_are_surfaced() {
        let store = TranslationStore::builder()
            .register_writable(Arc::new(UnreachableRepository))
            .build()
            .unwrap();
        let entry = TranslationEntry::translated(key("greeting", "sv"), "Hej");

        let result = store.save(&entry).await;

        assert!(matches!(result, Err(RepositoryError::Unreachable(_))));
    }

    #[tokio::test]
    async fn list_by_filter_merges_with_priority() {
        let locale = Locale::parse("sv").unwrap();
        let first = MemoryRepository::with_entries([TranslationEntry::translated(
            key("greeting", "sv"),
            "Hej",
        )]);
        let second = MemoryRepository::with_entries([
            TranslationEntry::translated(key("greeting", "sv"), "Tjena"),
            TranslationEntry::translated(key("farewell", "sv"), "Hej då"),
        ]);
        let store = store_with(vec![Arc::new(first), Arc::new(second)]);

        let listed = store.list_by_filter(&TranslationFilter::for_locale(locale)).await.unwrap();

        assert_that!(
            listed,
            elements_are![
                field!(TranslationEntry.translated_text, eq("Hej då")),
                field!(TranslationEntry.translated_text, eq("Hej")),
            ]
        );
    }

    #[tokio::test]
    async fn list_by_filter_surfaces_query_failures() {
        let store = store_with(vec![Arc::new(UnreachableRepository)]);

        let result = store
            .list_by_filter(&TranslationFilter::for_locale(Locale::parse("sv").unwrap()))
            .await;

        assert!(matches!(result, Err(RepositoryError::Unreachable(_))));
    }

    #[googletest::test]
    fn build_without_repositories_is_a_configuration_error() {
        let result = TranslationStore::builder().build();

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))));
    }

    #[googletest::test]
    fn build_with_two_writers_is_a_configuration_error() {
        let result = TranslationStore::builder()
            .register_writable(Arc::new(MemoryRepository::new()))
            .register_writable(Arc::new(MemoryRepository::new()))
            .build();

        assert!(matches!(result, Err(ConfigError::ValidationErrors(_))));
    }

    #[tokio::test]
    async fn resolve_within_returns_fallback_on_timeout() {
        /// Repository that never answers.
        struct StalledRepository;

        #[async_trait]
        impl TranslationRepository for StalledRepository {
            async fn get(
                &self,
                _key: &TranslationKey,
            ) -> Result<Option<TranslationEntry>, RepositoryError> {
                futures::future::pending().await
            }

            async fn save(&self, _entry: &TranslationEntry) -> Result<(), RepositoryError> {
                Err(RepositoryError::ReadOnly)
            }

            async fn query(
                &self,
                _filter: &TranslationFilter,
            ) -> Result<Vec<TranslationEntry>, RepositoryError> {
                Ok(Vec::new())
            }
        }

        let store = store_with(vec![Arc::new(StalledRepository)]);

        let text = store.resolve_within(&key("greeting", "sv"), Duration::from_millis(10)).await;

        assert_that!(text, eq("greeting"));
    }
}
