//! Rule-driven wiki markup to HTML renderer.
//!
//! A document is rendered line by line. Protected regions (`<nowiki>` spans
//! and `<source>` code blocks) are stashed first so nothing inside them is
//! interpreted. Each line then goes through an ordered list of block rules
//! (lists, tables, headings, preformatted text, definition lists) and an
//! ordered list of inline rules (links, emphasis, variables, issue
//! references, emoticons, bare URLs, plus any registered custom rules).
//! Finally the `{{TOC}}` placeholder is expanded and stashed regions are
//! restored, code going through a [`Highlighter`].
//!
//! # Architecture
//!
//! Everything outside markup interpretation sits behind collaborator traits:
//! - [`IssueLookup`]: resolves `bug #12`-style references
//! - [`Router`]: builds article, issue, internal and image URLs
//! - [`TocTemplate`]: renders the table of contents
//! - [`Highlighter`]: renders `<source>` blocks
//!
//! Simple implementations ship with the crate and are used by default.
//!
//! # Example
//!
//! ```
//! use wikitext_renderer::{RenderOptions, WikiRenderer};
//!
//! let renderer = WikiRenderer::new();
//! let doc = renderer
//!     .document("== Setup ==\n* install\n* run [[Getting started]]\n[[Category:Guides]]")
//!     .with_toc("guide")
//!     .with_options(RenderOptions::default().with_embedded(true));
//!
//! let result = doc.render().unwrap();
//! assert!(result.html.contains(r#"<h2 id="guide_toc_1">Setup</h2>"#));
//! assert!(result.categories.contains("Guides"));
//! assert_eq!(result.internal_links.get("Getting_started"), Some(&1));
//! ```

mod block;
mod collaborator;
mod context;
mod emphasis;
mod error;
mod highlight;
mod inline;
mod issues;
mod options;
mod registry;
mod renderer;
mod routing;
mod stash;
mod state;
mod toc;
mod util;

pub use collaborator::{
    HighlightRequest, Highlighter, Issue, IssueLookup, LineNumbering, Router, TocTemplate,
};
pub use emphasis::Emphasis;
pub use error::{CollaboratorError, RenderError, StashKind};
pub use highlight::PlainHighlighter;
pub use issues::{IssueTable, NoIssues};
pub use options::{NumberingMode, RenderOptions, RenderSettings};
pub use registry::{CustomRule, RuleHandler, RuleOutput, RuleRegistry};
pub use renderer::{Document, RenderResult, WikiRenderer};
pub use routing::TemplateRouter;
pub use state::{Control, ListKind, ListStack, ParserState, TableState};
pub use toc::{ListTocRenderer, TOC_PLACEHOLDER, TocBuilder, TocEntry};
pub use util::{canonical_article_name, escape_html};
