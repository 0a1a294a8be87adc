//! Core types used throughout the project.

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// Error returned when a locale tag cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid locale tag '{tag}': {message}")]
pub struct LocaleParseError {
    /// The rejected tag.
    pub tag: String,
    /// Why the tag was rejected.
    pub message: String,
}

/// Identifier for a language/culture.
///
/// Tags are normalized to lowercase with `-` as the subtag separator, so
/// `"en_US"`, `"en-US"` and `"en-us"` all compare equal. The empty tag is the
/// neutral locale, the last fallback tier before the caller-supplied default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale {
    /// Normalized tag. Empty for the neutral locale.
    tag: String,
}

impl Locale {
    /// The neutral (fallback) locale.
    #[must_use]
    pub const fn neutral() -> Self {
        Self { tag: String::new() }
    }

    /// Parse and normalize a locale tag.
    ///
    /// An empty tag parses to the neutral locale. Subtags may be separated by
    /// `-` or `_` and must be non-empty ASCII alphanumerics.
    ///
    /// # Errors
    /// Returns [`LocaleParseError`] when the tag contains other characters or
    /// an empty subtag.
    pub fn parse(tag: &str) -> Result<Self, LocaleParseError> {
        if tag.is_empty() {
            return Ok(Self::neutral());
        }

        for part in tag.split(['-', '_']) {
            if part.is_empty() {
                return Err(LocaleParseError {
                    tag: tag.to_string(),
                    message: "empty subtag".to_string(),
                });
            }
            if !part.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(LocaleParseError {
                    tag: tag.to_string(),
                    message: "subtags must be ASCII alphanumeric".to_string(),
                });
            }
        }

        Ok(Self { tag: normalize_tag(tag) })
    }

    /// Whether this is the neutral locale.
    #[must_use]
    pub const fn is_neutral(&self) -> bool {
        self.tag.is_empty()
    }

    /// The normalized tag. Empty for the neutral locale.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_neutral() { f.write_str("neutral") } else { f.write_str(&self.tag) }
    }
}

/// Normalize a tag (lowercase, `_` replaced with `-`).
fn normalize_tag(tag: &str) -> String {
    tag.to_lowercase().replace('_', "-")
}

/// Composite lookup key for a translated string.
///
/// Uniqueness within a repository is (`text_key`, `locale`, `owner_path`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationKey {
    /// Logical key of the string (e.g. `"common.hello"`).
    pub text_key: String,

    /// Locale the string is requested for.
    pub locale: Locale,

    /// Owning type name or view path, when the string belongs to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_path: Option<String>,
}

impl TranslationKey {
    /// Create a key without an owner.
    #[must_use]
    pub fn new(text_key: impl Into<String>, locale: Locale) -> Self {
        Self { text_key: text_key.into(), locale, owner_path: None }
    }

    /// Attach an owning type name or view path.
    #[must_use]
    pub fn with_owner(mut self, owner_path: impl Into<String>) -> Self {
        self.owner_path = Some(owner_path.into());
        self
    }

    /// The same key under another locale. Used for the neutral fallback probe.
    #[must_use]
    pub fn with_locale(&self, locale: Locale) -> Self {
        Self { text_key: self.text_key.clone(), locale, owner_path: self.owner_path.clone() }
    }
}

/// A stored translation.
///
/// An empty `translated_text` means "not yet translated"; consumers fall back
/// to `default_text`. Entries are created on first write and never implicitly
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationEntry {
    /// Composite key of the entry.
    pub key: TranslationKey,

    /// Administrator-supplied translation. Empty until one is supplied.
    pub translated_text: String,

    /// Text to display while no translation exists.
    pub default_text: String,
}

impl TranslationEntry {
    /// Create an untranslated entry.
    #[must_use]
    pub fn new(key: TranslationKey, default_text: impl Into<String>) -> Self {
        Self { key, translated_text: String::new(), default_text: default_text.into() }
    }

    /// Create an entry with a translation already supplied.
    #[must_use]
    pub fn translated(key: TranslationKey, translated_text: impl Into<String>) -> Self {
        Self { key, translated_text: translated_text.into(), default_text: String::new() }
    }

    /// Whether an administrator has supplied a translation.
    #[must_use]
    pub fn is_translated(&self) -> bool {
        !self.translated_text.is_empty()
    }

    /// The text to display: the translation when present, otherwise the
    /// default text.
    #[must_use]
    pub fn display_text(&self) -> &str {
        if self.is_translated() { &self.translated_text } else { &self.default_text }
    }
}

/// Filter for administrative listing/paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationFilter {
    /// Glob matched against the entry's owner path (or text key for entries
    /// without an owner). `None` matches everything.
    pub path_pattern: Option<String>,

    /// Locale to list entries for.
    pub locale: Locale,

    /// Only list entries still waiting for a translation.
    pub only_untranslated: bool,
}

impl TranslationFilter {
    /// Filter listing every entry of a locale.
    #[must_use]
    pub const fn for_locale(locale: Locale) -> Self {
        Self { path_pattern: None, locale, only_untranslated: false }
    }

    /// Compile the filter for repeated matching.
    ///
    /// # Errors
    /// Returns the glob error when `path_pattern` is not a valid glob.
    pub fn compile(&self) -> Result<CompiledFilter, globset::Error> {
        let matcher = match &self.path_pattern {
            Some(pattern) => Some(globset::Glob::new(pattern)?.compile_matcher()),
            None => None,
        };
        Ok(CompiledFilter {
            matcher,
            locale: self.locale.clone(),
            only_untranslated: self.only_untranslated,
        })
    }
}

/// A [`TranslationFilter`] with its glob compiled.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    /// Compiled owner-path glob, when one was given.
    matcher: Option<globset::GlobMatcher>,

    /// Locale to list entries for.
    locale: Locale,

    /// Only match entries still waiting for a translation.
    only_untranslated: bool,
}

impl CompiledFilter {
    /// Whether an entry passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &TranslationEntry) -> bool {
        if entry.key.locale != self.locale {
            return false;
        }
        if self.only_untranslated && entry.is_translated() {
            return false;
        }
        if let Some(matcher) = &self.matcher {
            let subject = entry.key.owner_path.as_deref().unwrap_or(&entry.key.text_key);
            return matcher.is_match(subject);
        }
        true
    }
}
