//! Read-only repository over a tree of per-locale translation files.
//!
//! Serves layouts like `locales/en/common.json` or `messages/sv.json`: the
//! locale is detected from the path, nested JSON is flattened into
//! dot-separated keys, and the file stem becomes a key prefix when it is not
//! the locale itself.

use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};

use async_trait::async_trait;
use globset::Glob;
use ignore::WalkBuilder;
use serde_json::Value;
use tokio::sync::RwLock;

use super::repository::{
    RepositoryError,
    TranslationRepository,
};
use crate::types::{
    Locale,
    TranslationEntry,
    TranslationFilter,
    TranslationKey,
};

/// File stems mapped to the neutral locale.
const NEUTRAL_STEMS: &[&str] = &["default", "neutral"];

/// Read-only repository scanning a directory tree of JSON translation files.
#[derive(Debug)]
pub struct LocaleFileRepository {
    /// Directory the scan starts from.
    root: PathBuf,

    /// Glob selecting translation files, relative to `root`.
    file_pattern: String,

    /// Lazily scanned entries.
    entries: RwLock<Option<HashMap<TranslationKey, TranslationEntry>>>,
}

impl LocaleFileRepository {
    /// Create a repository over `root`. No I/O happens until the first
    /// lookup.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, file_pattern: impl Into<String>) -> Self {
        Self { root: root.into(), file_pattern: file_pattern.into(), entries: RwLock::new(None) }
    }

    /// Drop the scanned entries so the next lookup re-reads the tree.
    pub async fn reload(&self) {
        let mut entries = self.entries.write().await;
        *entries = None;
        tracing::debug!(root = %self.root.display(), "Translation file cache cleared");
    }

    /// Translation files under the root matching the configured pattern.
    fn find_translation_files(&self) -> Result<Vec<PathBuf>, RepositoryError> {
        let matcher = Glob::new(&self.file_pattern)?.compile_matcher();

        let mut found_files = Vec::new();
        for result in WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Ok(relative_path) = path.strip_prefix(&self.root) else {
                continue;
            };
            if !matcher.is_match(relative_path) {
                continue;
            }

            found_files.push(path.to_path_buf());
        }

        Ok(found_files)
    }

    /// Parse one translation file into entries.
    async fn load_file(
        &self,
        path: &Path,
        entries: &mut HashMap<TranslationKey, TranslationEntry>,
    ) {
        // Detection runs on the relative path so that directory names above
        // the root can never be taken for locale tags.
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let Some(locale) = detect_locale_from_path(relative) else {
            tracing::warn!(path = %path.display(), "No locale in path, file skipped");
            return;
        };

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read translation file");
                return;
            }
        };

        let json: Value = match serde_json::from_str(&content) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse translation file");
                return;
            }
        };

        let prefix = namespace_prefix(relative, &locale);
        let mut flat = HashMap::new();
        flatten_value(&json, prefix.as_deref(), &mut flat);

        for (text_key, text) in flat {
            let key = TranslationKey::new(text_key, locale.clone());
            entries.insert(key.clone(), TranslationEntry::translated(key, text));
        }
    }

    /// Scan the tree on first access.
    async fn ensure_loaded(&self) -> Result<(), RepositoryError> {
        {
            let entries = self.entries.read().await;
            if entries.is_some() {
                return Ok(());
            }
        }

        let mut entries = self.entries.write().await;
        if entries.is_none() {
            let files = self.find_translation_files()?;
            tracing::debug!(root = %self.root.display(), count = files.len(), "Scanning translation files");

            let mut loaded = HashMap::new();
            for file in &files {
                self.load_file(file, &mut loaded).await;
            }
            *entries = Some(loaded);
        }
        Ok(())
    }
}

#[async_trait]
impl TranslationRepository for LocaleFileRepository {
    async fn get(
        &self,
        key: &TranslationKey,
    ) -> Result<Option<TranslationEntry>, RepositoryError> {
        self.ensure_loaded().await?;
        let entries = self.entries.read().await;
        Ok(entries.as_ref().and_then(|map| map.get(key).cloned()))
    }

    async fn save(&self, _entry: &TranslationEntry) -> Result<(), RepositoryError> {
        Err(RepositoryError::ReadOnly)
    }

    async fn query(
        &self,
        filter: &TranslationFilter,
    ) -> Result<Vec<TranslationEntry>, RepositoryError> {
        let compiled = filter.compile()?;
        self.ensure_loaded().await?;

        let entries = self.entries.read().await;
        let mut matched: Vec<_> = entries
            .as_ref()
            .map(|map| map.values().filter(|entry| compiled.matches(entry)).cloned().collect())
            .unwrap_or_default();
        matched.sort_by(|a, b| a.key.text_key.cmp(&b.key.text_key));
        Ok(matched)
    }
}

/// Detect the locale of a translation file from its path.
///
/// The file stem is checked first, then directory names walking upwards.
/// Stems named `default` or `neutral` map to the neutral locale.
///
/// # Examples
/// - `locales/en.json` → `en`
/// - `locales/sv/common.json` → `sv`
/// - `messages/en_US/errors.json` → `en-us`
/// - `locales/default.json` → neutral
fn detect_locale_from_path(path: &Path) -> Option<Locale> {
    let mut candidates = Vec::new();
    if let Some(stem) = path.file_stem() {
        candidates.push(stem.to_string_lossy().to_string());
    }
    for ancestor in path.ancestors().skip(1) {
        if let Some(name) = ancestor.file_name() {
            candidates.push(name.to_string_lossy().to_string());
        }
    }

    for candidate in candidates {
        if NEUTRAL_STEMS.contains(&candidate.to_lowercase().as_str()) {
            return Some(Locale::neutral());
        }
        if looks_like_locale_tag(&candidate) {
            return Locale::parse(&candidate).ok();
        }
    }

    None
}

/// Whether a path segment has the shape of a language tag.
///
/// Primary subtag of 2-3 letters, up to two more subtags of 2-8
/// alphanumerics. Keeps directory names like `locales` or `errors` from
/// being taken for languages.
fn looks_like_locale_tag(part: &str) -> bool {
    let mut subtags = part.split(['-', '_']);

    let Some(primary) = subtags.next() else {
        return false;
    };
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return false;
    }

    let mut rest = 0;
    for subtag in subtags {
        rest += 1;
        if rest > 2
            || !(2..=8).contains(&subtag.len())
            || !subtag.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return false;
        }
    }
    true
}

/// Key prefix for a file, when the stem names a group rather than the locale.
///
/// `locales/en/common.json` gets the prefix `common`; `locales/en.json` gets
/// none.
fn namespace_prefix(path: &Path, locale: &Locale) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy().to_string();

    let is_locale_stem = looks_like_locale_tag(&stem)
        && Locale::parse(&stem).is_ok_and(|parsed| parsed == *locale);
    let is_neutral_stem =
        locale.is_neutral() && NEUTRAL_STEMS.contains(&stem.to_lowercase().as_str());

    if is_locale_stem || is_neutral_stem { None } else { Some(stem) }
}

/// Flatten nested JSON into dot-separated string values.
///
/// Arrays contribute their index as a key segment; non-string scalars are
/// rendered with their JSON notation.
fn flatten_value(json: &Value, prefix: Option<&str>, out: &mut HashMap<String, String>) {
    /// Join a prefix and a segment with a dot.
    fn child_key(prefix: Option<&str>, segment: &str) -> String {
        prefix.map_or_else(|| segment.to_string(), |p| format!("{p}.{segment}"))
    }

    match json {
        Value::Object(map) => {
            for (segment, value) in map {
                let key = child_key(prefix, segment);
                flatten_value(value, Some(&key), out);
            }
        }
        Value::Array(items) => {
            for (index, value) in items.iter().enumerate() {
                let key = child_key(prefix, &index.to_string());
                flatten_value(value, Some(&key), out);
            }
        }
        Value::String(text) => {
            if let Some(key) = prefix {
                out.insert(key.to_string(), text.clone());
            }
        }
        _ => {
            if let Some(key) = prefix {
                out.insert(key.to_string(), json.to_string());
            }
        }
    }
}
