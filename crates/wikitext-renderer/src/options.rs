//! Per-document render options and process-wide render settings.

/// Per-document rendering flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderOptions {
    /// Render `== header ==` lines as headings. When off, header lines are echoed escaped.
    pub headers: bool,
    /// Suppress the back-to-top link after headings.
    pub embedded: bool,
    /// Leave `{{VARIABLE}}` references untouched.
    pub ignore_vars: bool,
    /// Leave the `{{TOC}}` placeholder untouched.
    pub ignore_toc: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            headers: true,
            embedded: false,
            ignore_vars: false,
            ignore_toc: false,
        }
    }
}

impl RenderOptions {
    /// Enable or disable the header rule.
    #[must_use]
    pub fn with_headers(mut self, enabled: bool) -> Self {
        self.headers = enabled;
        self
    }

    /// Render as embedded content (no back-to-top links).
    #[must_use]
    pub fn with_embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    /// Skip variable substitution.
    #[must_use]
    pub fn with_ignore_vars(mut self, ignore: bool) -> Self {
        self.ignore_vars = ignore;
        self
    }

    /// Skip TOC placeholder expansion.
    #[must_use]
    pub fn with_ignore_toc(mut self, ignore: bool) -> Self {
        self.ignore_toc = ignore;
        self
    }
}

/// Line numbering mode for highlighted code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NumberingMode {
    /// No line numbers.
    #[default]
    None,
    /// Plain line numbers.
    Normal,
    /// Line numbers with every n-th line emphasized.
    Fancy,
}

impl NumberingMode {
    /// Parse a `line="…"` attribute value.
    ///
    /// Returns `None` for values that are not a numbering mode, which the
    /// code block renderer treats as "no numbering".
    #[must_use]
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "highlighted" | "fancy" | "GESHI_FANCY_LINE_NUMBERS" => Some(Self::Fancy),
            "normal" | "GESHI_NORMAL_LINE_NUMBERS" => Some(Self::Normal),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Process-wide settings consulted during rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    /// Value of `{{SITENAME}}`.
    pub site_name: String,
    /// Value of `{{SITETAGLINE}}`.
    pub site_tagline: String,
    /// Value of `{{PAGENAME}}`.
    pub page_name: String,
    /// Reserved link namespace that resolves to application routes.
    pub internal_namespace: String,
    /// Text of the back-to-top link after headings.
    pub top_label: String,
    /// Highlighting language when `<source>` has no `lang` attribute.
    pub default_language: String,
    /// Numbering mode when `<source>` has no `line` attribute.
    pub default_numbering: NumberingMode,
    /// Fancy numbering interval when `<source>` has no `highlight` attribute.
    pub default_interval: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            site_name: "Wiki".to_owned(),
            site_tagline: String::new(),
            page_name: String::new(),
            internal_namespace: "App".to_owned(),
            top_label: "top".to_owned(),
            default_language: "text".to_owned(),
            default_numbering: NumberingMode::None,
            default_interval: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert!(options.headers);
        assert!(!options.embedded);
        assert!(!options.ignore_vars);
        assert!(!options.ignore_toc);
    }

    #[test]
    fn test_option_builders() {
        let options = RenderOptions::default()
            .with_headers(false)
            .with_embedded(true)
            .with_ignore_vars(true)
            .with_ignore_toc(true);
        assert_eq!(
            options,
            RenderOptions {
                headers: false,
                embedded: true,
                ignore_vars: true,
                ignore_toc: true,
            }
        );
    }

    #[test]
    fn test_numbering_from_attr() {
        assert_eq!(NumberingMode::from_attr("highlighted"), Some(NumberingMode::Fancy));
        assert_eq!(
            NumberingMode::from_attr("GESHI_NORMAL_LINE_NUMBERS"),
            Some(NumberingMode::Normal)
        );
        assert_eq!(NumberingMode::from_attr("none"), Some(NumberingMode::None));
        assert_eq!(NumberingMode::from_attr("3"), None);
    }
}
