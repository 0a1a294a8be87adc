use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "viewExtensions[0]")
    pub field_path: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Which source claims a view path first when both could serve it.
///
/// Deployment-specific; never hardcoded by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ViewSourceOrder {
    /// Files on disk override embedded resources.
    #[default]
    DiskFirst,
    /// Embedded resources override files on disk.
    EmbeddedFirst,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalizationSettings {
    /// Separator used in composite document-store ids
    /// (`owner<sep>textKey<sep>locale`).
    ///
    /// Changing it without migrating persisted documents breaks existing
    /// keys.
    pub document_id_separator: String,

    /// Glob locating per-locale translation files under a repository root.
    pub translation_file_pattern: String,

    pub view_source_order: ViewSourceOrder,

    /// Extensions (with leading dot) of files that go through the view
    /// rewrite before being served.
    pub view_extensions: Vec<String>,

    pub fixer: ViewFixerSettings,
}

/// Settings for the view content rewrite.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewFixerSettings {
    /// Base class emitted in the `@inherits` directive.
    pub base_class: String,

    /// Base class emitted for `_ViewStart` files.
    pub start_page_class: String,

    /// `@using` lines emitted at the top of every rewritten view.
    pub using_lines: Vec<String>,

    /// Layout assigned to non-partial views. `None` keeps whatever the
    /// host's view-start chain decides.
    pub layout_path: Option<String>,
}

impl Default for ViewFixerSettings {
    fn default() -> Self {
        Self {
            base_class: "SunshineAttack.Localization.SunshineAttackWebViewPage".to_string(),
            start_page_class: "System.Web.WebPages.StartPage".to_string(),
            using_lines: vec![
                "@using System.Web.Mvc".to_string(),
                "@using System.Web.Mvc.Ajax".to_string(),
                "@using System.Web.Mvc.Html".to_string(),
                "@using System.Web.Routing".to_string(),
            ],
            layout_path: None,
        }
    }
}

impl Default for LocalizationSettings {
    fn default() -> Self {
        Self {
            document_id_separator: "-".to_string(),
            translation_file_pattern: "**/{locales,messages}/**/*.json".to_string(),
            view_source_order: ViewSourceOrder::default(),
            view_extensions: vec![".cshtml".to_string()],
            fixer: ViewFixerSettings::default(),
        }
    }
}

impl LocalizationSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern
    /// - Malformed extension or layout path
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.document_id_separator.is_empty() {
            errors.push(ValidationError::new(
                "documentIdSeparator",
                "The separator cannot be empty. Please specify a separator, for example: \"-\" (dash)",
            ));
        } else if self.document_id_separator.contains('\\') {
            errors.push(ValidationError::new(
                "documentIdSeparator",
                "The separator cannot contain '\\', the id escape character",
            ));
        }

        if self.translation_file_pattern.is_empty() {
            errors.push(ValidationError::new(
                "translationFilePattern",
                "The pattern cannot be empty. Example: \"**/{locales,messages}/**/*.json\"",
            ));
        } else if let Err(e) = globset::Glob::new(&self.translation_file_pattern) {
            errors.push(ValidationError::new(
                "translationFilePattern",
                format!("Invalid glob pattern '{}': {e}", self.translation_file_pattern),
            ));
        }

        for (index, extension) in self.view_extensions.iter().enumerate() {
            if !extension.starts_with('.') || extension.len() < 2 {
                errors.push(ValidationError::new(
                    format!("viewExtensions[{index}]"),
                    format!("Invalid extension '{extension}': must start with a dot, e.g. \".cshtml\""),
                ));
            }
        }

        if self.fixer.base_class.is_empty() {
            errors.push(ValidationError::new(
                "fixer.baseClass",
                "The base class cannot be empty",
            ));
        }

        if self.fixer.start_page_class.is_empty() {
            errors.push(ValidationError::new(
                "fixer.startPageClass",
                "The start page class cannot be empty",
            ));
        }

        if let Some(layout) = &self.fixer.layout_path
            && !layout.starts_with("~/")
        {
            errors.push(ValidationError::new(
                "fixer.layoutPath",
                format!("Invalid layout path '{layout}': must be rooted, e.g. \"~/Views/Shared/_Layout.cshtml\""),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
