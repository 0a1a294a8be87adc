//! View content rewrite.
//!
//! Lets externally stored views look exactly like regular views: no
//! `@inherits` or import boilerplate is required in the stored file, it is
//! prepended here when the view is served.

use crate::config::ViewFixerSettings;

/// Rewrites raw view text before it is served.
///
/// The transformation is pure: the same (path, content, settings) always
/// produces the same output.
#[derive(Debug, Clone)]
pub struct ViewFixer {
    /// Directive configuration.
    settings: ViewFixerSettings,
}

/// A `@model` directive split out of the view body.
struct ExtractedModel<'a> {
    /// Text before the directive, preserved verbatim.
    prefix: &'a str,

    /// Model type named by the directive, when one was present.
    model: Option<&'a str>,

    /// View body after the directive line.
    body: &'a str,
}

impl ViewFixer {
    /// Create a fixer from settings.
    #[must_use]
    pub const fn new(settings: ViewFixerSettings) -> Self {
        Self { settings }
    }

    /// Rewrite a view.
    ///
    /// 1. Extract a `@model` directive, keeping any text before it.
    /// 2. Emit the configured `@using` lines.
    /// 3. Emit `@inherits`: the start-page class for `_ViewStart` files,
    ///    `<dynamic>` for an `object` model, the generic base for a named
    ///    model, the bare base otherwise.
    /// 4. Emit a layout assignment when one is configured, except for paths
    ///    containing `/_` (partials and view starts).
    /// 5. Append the remaining body unchanged.
    #[must_use]
    pub fn correct_view(&self, virtual_path: &str, content: &str) -> String {
        let extracted = extract_model(content);

        let mut view = String::with_capacity(content.len() + 256);
        view.push_str(extracted.prefix);

        for using in &self.settings.using_lines {
            view.push_str(using);
            view.push('\n');
        }

        self.push_inherits(&mut view, virtual_path, extracted.model);

        if let Some(layout) = &self.settings.layout_path
            && !virtual_path.contains("/_")
        {
            view.push_str(&format!("@{{ Layout = \"{layout}\"; }}\n"));
        }

        view.push_str(extracted.body);
        view
    }

    /// Emit the `@inherits` line.
    fn push_inherits(&self, view: &mut String, virtual_path: &str, model: Option<&str>) {
        if virtual_path.to_lowercase().contains("_viewstart") {
            view.push_str(&format!("@inherits {}\n", self.settings.start_page_class));
            return;
        }

        match model {
            Some("object") => {
                view.push_str(&format!("@inherits {}<dynamic>\n", self.settings.base_class));
            }
            Some(model) => {
                view.push_str(&format!("@inherits {}<{model}>\n", self.settings.base_class));
            }
            None => {
                view.push_str(&format!("@inherits {}\n", self.settings.base_class));
            }
        }
    }
}

/// Split a `@model` directive out of the view text.
fn extract_model(content: &str) -> ExtractedModel<'_> {
    let Some(position) = content.find("@model") else {
        return ExtractedModel { prefix: "", model: None, body: content };
    };

    let (prefix, rest) = content.split_at(position);
    let line_end = rest.find(['\r', '\n']).unwrap_or(rest.len());
    let (directive, body) = rest.split_at(line_end);

    // One line break belongs to the removed directive line.
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .or_else(|| body.strip_prefix('\r'))
        .unwrap_or(body);

    let model = directive.strip_prefix("@model").map(str::trim).filter(|m| !m.is_empty());

    ExtractedModel { prefix, model, body }
}
