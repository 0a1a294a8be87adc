//! Document-store backed translation repository.
//!
//! Persists the whole collection as one JSON document file. Each entry is
//! keyed by a composite string id `owner<sep>textKey<sep>locale` with a
//! configurable separator; separator occurrences inside a component (the
//! `-` of a normalized `en-us` tag under the default separator) are
//! backslash-escaped so ids stay unambiguous. Changing the separator
//! without migrating the persisted collection breaks existing ids.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repository::{
    RepositoryError,
    TranslationRepository,
};
use crate::types::{
    TranslationEntry,
    TranslationFilter,
    TranslationKey,
};

/// Repository storing entries as documents in a single JSON collection file.
///
/// The collection is loaded lazily on first access and written back whole on
/// every save (temp file + rename, so readers never observe a partial file).
#[derive(Debug)]
pub struct DocumentRepository {
    /// Collection file on disk.
    path: PathBuf,

    /// Separator used in composite document ids.
    separator: String,

    /// Lazily loaded documents keyed by composite id.
    documents: RwLock<Option<HashMap<String, TranslationEntry>>>,
}

impl DocumentRepository {
    /// Open a collection file. No I/O happens until the first lookup.
    ///
    /// The separator must not contain `\`, the id escape character;
    /// settings validation enforces this.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, separator: impl Into<String>) -> Self {
        Self { path: path.into(), separator: separator.into(), documents: RwLock::new(None) }
    }

    /// Composite document id for a key. Components are escaped, so ids of
    /// distinct keys never collide.
    fn document_id(&self, key: &TranslationKey) -> String {
        let owner = self.escape_component(key.owner_path.as_deref().unwrap_or(""));
        let text_key = self.escape_component(&key.text_key);
        let locale = self.escape_component(key.locale.tag());
        format!("{owner}{sep}{text_key}{sep}{locale}", sep = self.separator)
    }

    /// Escape an id component: `\` doubles, separator occurrences get a `\`
    /// prefix. A separator inside a component can then never realign the
    /// segment boundaries of the joined id.
    fn escape_component(&self, component: &str) -> String {
        component
            .replace('\\', "\\\\")
            .replace(&self.separator, &format!("\\{}", self.separator))
    }

    /// Read the collection file, treating a missing file as an empty
    /// collection.
    async fn load_collection(&self) -> Result<HashMap<String, TranslationEntry>, RepositoryError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Collection file not found, starting empty");
                return Ok(HashMap::new());
            }
            Err(e) => return Err(RepositoryError::Unreachable(e)),
        };

        let documents = serde_json::from_str(&content)?;
        Ok(documents)
    }

    /// Load the collection on first access.
    async fn ensure_loaded(&self) -> Result<(), RepositoryError> {
        {
            let documents = self.documents.read().await;
            if documents.is_some() {
                return Ok(());
            }
        }

        let mut documents = self.documents.write().await;
        if documents.is_none() {
            *documents = Some(self.load_collection().await?);
            tracing::debug!(path = %self.path.display(), "Loaded translation collection");
        }
        Ok(())
    }

    /// Write the collection back, temp file then rename.
    async fn persist(
        &self,
        documents: &HashMap<String, TranslationEntry>,
    ) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(documents)?;
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, content).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TranslationRepository for DocumentRepository {
    async fn get(
        &self,
        key: &TranslationKey,
    ) -> Result<Option<TranslationEntry>, RepositoryError> {
        self.ensure_loaded().await?;
        let documents = self.documents.read().await;
        Ok(documents.as_ref().and_then(|docs| docs.get(&self.document_id(key)).cloned()))
    }

    async fn save(&self, entry: &TranslationEntry) -> Result<(), RepositoryError> {
        self.ensure_loaded().await?;

        let mut documents = self.documents.write().await;
        let Some(docs) = documents.as_mut() else {
            // ensure_loaded succeeded above, and loaded collections are never
            // unset afterwards.
            return Err(RepositoryError::InvalidEntry("collection not loaded".to_string()));
        };
        docs.insert(self.document_id(&entry.key), entry.clone());
        self.persist(docs).await?;

        tracing::debug!(id = %self.document_id(&entry.key), "Saved translation document");
        Ok(())
    }

    async fn query(
        &self,
        filter: &TranslationFilter,
    ) -> Result<Vec<TranslationEntry>, RepositoryError> {
        let compiled = filter.compile()?;
        self.ensure_loaded().await?;

        let documents = self.documents.read().await;
        let mut matched: Vec<_> = documents
            .as_ref()
            .map(|docs| docs.values().filter(|entry| compiled.matches(entry)).cloned().collect())
            .unwrap_or_default();
        matched.sort_by(|a, b| a.key.text_key.cmp(&b.key.text_key));
        Ok(matched)
    }
}
