//! Table of contents collection and default rendering.

use std::fmt::Write;

use crate::collaborator::TocTemplate;
use crate::error::CollaboratorError;
use crate::util::escape_html;

/// Placeholder expanded into the rendered table of contents.
pub const TOC_PLACEHOLDER: &str = "{{TOC}}";

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text (unescaped).
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// Collects headings while lines are rendered.
///
/// IDs are `{base_id}_toc_{n}` with `n` counting every heading from 1,
/// whatever its level.
#[derive(Debug)]
pub struct TocBuilder {
    base_id: Option<String>,
    entries: Vec<TocEntry>,
}

impl TocBuilder {
    /// Create a builder. `None` disables collection.
    pub fn new(base_id: Option<String>) -> Self {
        Self {
            base_id,
            entries: Vec::new(),
        }
    }

    /// Whether headings are collected for this document.
    pub fn is_enabled(&self) -> bool {
        self.base_id.is_some()
    }

    /// Record a heading and return its anchor ID, or `None` when disabled.
    pub fn push(&mut self, level: u8, title: &str) -> Option<String> {
        let base = self.base_id.as_deref()?;
        let id = format!("{base}_toc_{}", self.entries.len() + 1);
        self.entries.push(TocEntry {
            level,
            title: title.to_owned(),
            id: id.clone(),
        });
        Some(id)
    }

    /// Collected entries in document order.
    pub fn entries(&self) -> &[TocEntry] {
        &self.entries
    }

    /// Take the collected entries.
    pub fn take_entries(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.entries)
    }
}

/// Default TOC template: a flat list with one class per heading level.
#[derive(Clone, Debug)]
pub struct ListTocRenderer {
    heading: String,
}

impl Default for ListTocRenderer {
    fn default() -> Self {
        Self::new("Contents")
    }
}

impl ListTocRenderer {
    /// Create a renderer with the given box heading.
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
        }
    }
}

impl TocTemplate for ListTocRenderer {
    fn render_toc(&self, entries: &[TocEntry]) -> Result<String, CollaboratorError> {
        let mut out = String::from(r#"<div class="toc">"#);
        write!(
            out,
            r#"<div class="toc-header">{}</div><ul>"#,
            escape_html(&self.heading)
        )?;
        for entry in entries {
            write!(
                out,
                r##"<li class="toc-level-{}"><a href="#{}">{}</a></li>"##,
                entry.level,
                escape_html(&entry.id),
                escape_html(&entry.title)
            )?;
        }
        out.push_str("</ul></div>");
        Ok(out)
    }
}
