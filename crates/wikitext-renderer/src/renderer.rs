//! Renderer configuration and the per-document driver.

use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use crate::block::{self, BlockKind};
use crate::collaborator::{Highlighter, IssueLookup, Router, TocTemplate};
use crate::context::RenderEnv;
use crate::error::RenderError;
use crate::highlight::{PlainHighlighter, render_code_block};
use crate::inline;
use crate::issues::NoIssues;
use crate::options::{RenderOptions, RenderSettings};
use crate::registry::RuleRegistry;
use crate::routing::TemplateRouter;
use crate::stash::Stash;
use crate::state::{Control, ParserState};
use crate::toc::{ListTocRenderer, TOC_PLACEHOLDER, TocEntry};

/// Result of rendering one document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderResult {
    /// Rendered HTML fragment.
    pub html: String,
    /// Canonical article names linked from the document, with occurrence counts.
    pub internal_links: BTreeMap<String, usize>,
    /// Categories the document was tagged with.
    pub categories: BTreeSet<String>,
    /// Table of contents entries (empty unless TOC generation was enabled).
    pub toc: Vec<TocEntry>,
}

/// Wiki markup renderer.
///
/// Holds process-wide settings, the collaborators used for links, issues,
/// TOC markup and code highlighting, and the shared custom rule registry.
/// Rendering never mutates the renderer, so one instance can serve many
/// documents, including from several threads.
///
/// # Example
///
/// ```
/// use wikitext_renderer::WikiRenderer;
///
/// let renderer = WikiRenderer::new();
/// let doc = renderer.document("'''Hello''' [[world]]");
/// let result = doc.render().unwrap();
/// assert_eq!(result.html, "<b>Hello</b> <a href=\"/wiki/World\">world</a>\n");
/// assert_eq!(result.internal_links.get("World"), Some(&1));
/// ```
pub struct WikiRenderer {
    settings: RenderSettings,
    issues: Arc<dyn IssueLookup>,
    router: Arc<dyn Router>,
    toc_template: Arc<dyn TocTemplate>,
    highlighter: Arc<dyn Highlighter>,
    registry: RuleRegistry,
    clock: Option<NaiveDateTime>,
}

impl Default for WikiRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WikiRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WikiRenderer")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl WikiRenderer {
    /// Create a renderer with default settings and built-in collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: RenderSettings::default(),
            issues: Arc::new(NoIssues),
            router: Arc::new(TemplateRouter::default()),
            toc_template: Arc::new(ListTocRenderer::default()),
            highlighter: Arc::new(PlainHighlighter),
            registry: RuleRegistry::new(),
            clock: None,
        }
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the issue lookup.
    #[must_use]
    pub fn with_issue_lookup(mut self, issues: impl IssueLookup + 'static) -> Self {
        self.issues = Arc::new(issues);
        self
    }

    /// Set the URL router.
    #[must_use]
    pub fn with_router(mut self, router: impl Router + 'static) -> Self {
        self.router = Arc::new(router);
        self
    }

    /// Set the TOC template.
    #[must_use]
    pub fn with_toc_template(mut self, template: impl TocTemplate + 'static) -> Self {
        self.toc_template = Arc::new(template);
        self
    }

    /// Set the code highlighter.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.highlighter = Arc::new(highlighter);
        self
    }

    /// Share an existing rule registry.
    #[must_use]
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Fix the time used by date variables instead of reading the local clock.
    #[must_use]
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.clock = Some(now);
        self
    }

    /// Process-wide settings.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Registry of custom inline rules applied by this renderer.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Create a document for `text`.
    pub fn document(&self, text: impl Into<String>) -> Document<'_> {
        Document {
            renderer: self,
            text: text.into(),
            options: RenderOptions::default(),
            toc_base_id: None,
            rendered: OnceCell::new(),
        }
    }

    fn render_text(
        &self,
        text: &str,
        options: RenderOptions,
        toc_base_id: Option<&str>,
    ) -> Result<RenderResult, RenderError> {
        let (text, stash) = Stash::extract(text);
        let env = RenderEnv {
            options,
            settings: &self.settings,
            issues: self.issues.as_ref(),
            router: self.router.as_ref(),
            now: self.clock.unwrap_or_else(|| Local::now().naive_local()),
            custom_rules: self.registry.snapshot(),
            stash: &stash,
        };

        tracing::debug!(
            nowikis = stash.nowiki_count(),
            code_blocks = stash.code_count(),
            custom_rules = env.custom_rules.len(),
            "Rendering document"
        );

        let mut state = ParserState::new(toc_base_id.map(str::to_owned));
        let mut html = String::with_capacity(text.len() * 2);
        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            html.push_str(&render_line(line, &mut state, &env)?);
        }
        html.push_str(&state.close_all());

        if !options.ignore_toc && html.contains(TOC_PLACEHOLDER) {
            let toc = if state.toc().is_enabled() && !state.toc().entries().is_empty() {
                self.toc_template
                    .render_toc(state.toc().entries())
                    .map_err(RenderError::Toc)?
            } else {
                String::new()
            };
            html = html.replace(TOC_PLACEHOLDER, &toc);
        }

        let html = stash.restore(&html, state.consumed_placeholders(), |code| {
            render_code_block(code, &self.settings, self.highlighter.as_ref())
        })?;

        let (internal_links, categories, toc) = state.into_outputs();
        tracing::debug!(
            bytes = html.len(),
            links = internal_links.len(),
            categories = categories.len(),
            toc_entries = toc.len(),
            "Rendered document"
        );

        Ok(RenderResult {
            html,
            internal_links,
            categories,
            toc,
        })
    }
}

/// Render one line: block pass, inline pass, then auto-closing.
fn render_line(
    line: &str,
    state: &mut ParserState,
    env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    let pass = block::apply_block_rules(line, state, env);
    let plain = pass.fired.is_empty();
    let skip_inline = pass.control == Control::StopAll;
    let breaks = pass.has_fired(BlockKind::BlankLine) || pass.has_fired(BlockKind::Header);

    let mut out = block::close_unaffirmed(state, &pass);
    let text = if skip_inline {
        pass.line
    } else {
        inline::apply_inline_rules(pass.line, state, env)?
    };

    if !text.trim().is_empty() {
        state.set_suppress_blank_line(breaks);
    }
    out.push_str(&text);
    if plain && !text.trim().is_empty() {
        out.push('\n');
    }
    Ok(out)
}

/// A markup document bound to a renderer.
///
/// The HTML is computed on the first call to [`render`](Self::render) and
/// cached; later calls return the same result.
pub struct Document<'r> {
    renderer: &'r WikiRenderer,
    text: String,
    options: RenderOptions,
    toc_base_id: Option<String>,
    rendered: OnceCell<RenderResult>,
}

impl fmt::Debug for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("options", &self.options)
            .field("toc_base_id", &self.toc_base_id)
            .field("rendered", &self.rendered.get().is_some())
            .finish_non_exhaustive()
    }
}

impl Document<'_> {
    /// Enable TOC generation; heading ids become `{base_id}_toc_{n}`.
    #[must_use]
    pub fn with_toc(mut self, base_id: impl Into<String>) -> Self {
        self.toc_base_id = Some(base_id.into());
        self.rendered = OnceCell::new();
        self
    }

    /// Set the rendering options.
    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self.rendered = OnceCell::new();
        self
    }

    /// Source markup.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Render the document, or return the cached result.
    pub fn render(&self) -> Result<&RenderResult, RenderError> {
        if let Some(result) = self.rendered.get() {
            return Ok(result);
        }
        let result = self.renderer.render_text(
            &self.text,
            self.options,
            self.toc_base_id.as_deref(),
        )?;
        Ok(self.rendered.get_or_init(|| result))
    }

    /// Rendered HTML.
    pub fn html(&self) -> Result<&str, RenderError> {
        Ok(&self.render()?.html)
    }

    /// Internal link occurrence counts.
    pub fn internal_links(&self) -> Result<&BTreeMap<String, usize>, RenderError> {
        Ok(&self.render()?.internal_links)
    }

    /// Collected categories.
    pub fn categories(&self) -> Result<&BTreeSet<String>, RenderError> {
        Ok(&self.render()?.categories)
    }

    /// Table of contents entries.
    pub fn toc(&self) -> Result<&[TocEntry], RenderError> {
        Ok(&self.render()?.toc)
    }
}
