//! Collaborator traits the renderer calls but does not implement.
//!
//! The renderer stays free of persistence, routing and templating concerns.
//! Hosts plug those in through these traits; the crate ships simple default
//! implementations ([`NoIssues`](crate::NoIssues), [`IssueTable`](crate::IssueTable),
//! [`TemplateRouter`](crate::TemplateRouter), [`ListTocRenderer`](crate::ListTocRenderer),
//! [`PlainHighlighter`](crate::PlainHighlighter)).

use crate::error::CollaboratorError;
use crate::options::NumberingMode;
use crate::toc::TocEntry;

/// Issue record returned by an [`IssueLookup`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    /// Key of the project the issue belongs to.
    pub project_key: String,
    /// Issue number within the project.
    pub number: u64,
    /// Display form of the number (e.g. `CORE-12`).
    pub formatted_number: String,
    /// Issue title.
    pub title: String,
    /// Whether the issue is closed.
    pub closed: bool,
    /// Whether the issue is deleted.
    pub deleted: bool,
}

impl Issue {
    /// Closed and deleted issues are rendered with the `closed` style.
    pub fn is_resolved(&self) -> bool {
        self.closed || self.deleted
    }
}

/// Resolves textual issue references such as `bug #12` or `ticket CORE-7`.
pub trait IssueLookup: Send + Sync {
    /// Look up the issue referenced by `reference` (the full matched text).
    ///
    /// Both `Ok(None)` and `Err(_)` fall back to rendering the reference as
    /// escaped text; lookup errors are logged, never propagated.
    fn find_issue(&self, reference: &str) -> Result<Option<Issue>, CollaboratorError>;
}

/// Builds URLs for links emitted by the renderer.
pub trait Router: Send + Sync {
    /// URL of a wiki article given its canonical name.
    fn article_url(&self, name: &str) -> Result<String, CollaboratorError>;

    /// URL of an issue page.
    fn issue_url(&self, issue: &Issue) -> Result<String, CollaboratorError>;

    /// URL of an application route referenced through the internal namespace.
    fn internal_url(&self, path: &str) -> Result<String, CollaboratorError>;

    /// URL of an image asset (uploaded images and smileys).
    fn image_url(&self, path: &str) -> Result<String, CollaboratorError>;
}

/// Renders the table of contents markup for the `{{TOC}}` placeholder.
pub trait TocTemplate: Send + Sync {
    /// Render `entries` (in document order) to HTML.
    fn render_toc(&self, entries: &[TocEntry]) -> Result<String, CollaboratorError>;
}

/// Line numbering parameters for a highlighted code block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineNumbering {
    /// Numbering mode.
    pub mode: NumberingMode,
    /// Number of the first line.
    pub start: u32,
    /// Every `interval`-th line is emphasized in fancy mode.
    pub interval: u32,
}

impl Default for LineNumbering {
    fn default() -> Self {
        Self {
            mode: NumberingMode::None,
            start: 1,
            interval: 5,
        }
    }
}

/// Input to a [`Highlighter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HighlightRequest<'a> {
    /// Raw code text (not escaped).
    pub code: &'a str,
    /// Language identifier.
    pub language: &'a str,
    /// Line numbering parameters.
    pub numbering: LineNumbering,
}

/// Syntax highlighter for `<source>` blocks.
pub trait Highlighter: Send + Sync {
    /// Return highlighted, HTML-safe markup for the request.
    fn highlight(&self, request: &HighlightRequest<'_>) -> Result<String, CollaboratorError>;
}
