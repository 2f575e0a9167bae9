//! Protected region stash.
//!
//! `<nowiki>` spans and `<source>` blocks are cut out of the markup before any
//! line is parsed and replaced by placeholder tokens. After rendering, the
//! placeholders are swapped back: nowiki content escaped, code content run
//! through the highlighter.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{RenderError, StashKind};
use crate::state::ParserState;
use crate::util::{escape_html, try_replace_all};

/// Marker character framing placeholder tokens. Stripped from input so
/// user text can never forge a token.
const TOKEN_MARK: char = '\u{FFFC}';

const NOWIKI_OPEN: &str = "<nowiki>";
const NOWIKI_CLOSE: &str = "</nowiki>";

static SOURCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<source((?:\s+[^\s]+=".*?")*)>\s*(.*?)\s*</source>"#).unwrap()
});
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{FFFC}(NOWIKI|CODE)([0-9]+)\u{FFFC}").unwrap());

/// Reference to one stashed region, written into the markup as
/// `U+FFFC KIND index U+FFFC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Placeholder {
    /// Which stack the region lives on.
    pub kind: StashKind,
    /// Position on that stack, in extraction order.
    pub index: usize,
}

impl Placeholder {
    fn new(kind: StashKind, index: usize) -> Self {
        Self { kind, index }
    }

    /// Token standing in for the region.
    pub fn token(self) -> String {
        let label = match self.kind {
            StashKind::Nowiki => "NOWIKI",
            StashKind::Code => "CODE",
        };
        format!("{TOKEN_MARK}{label}{}{TOKEN_MARK}", self.index)
    }

    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let kind = match &caps[1] {
            "NOWIKI" => StashKind::Nowiki,
            _ => StashKind::Code,
        };
        Some(Self::new(kind, caps[2].parse().ok()?))
    }
}

/// Placeholders in `text`, in order of appearance.
pub(crate) fn placeholders(text: &str) -> impl Iterator<Item = Placeholder> + '_ {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| Placeholder::from_captures(&caps))
}

/// Code block pulled out of the markup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StashedCode {
    /// Raw attribute text of the `<source>` tag (e.g. ` lang="rust" line="normal"`).
    pub attrs: String,
    /// Code with surrounding whitespace trimmed.
    pub code: String,
}

/// Regions extracted from one document.
#[derive(Debug, Default)]
pub struct Stash {
    nowikis: Vec<String>,
    code: Vec<StashedCode>,
}

impl Stash {
    /// Extract protected regions from `text`, returning the text with placeholders.
    pub fn extract(text: &str) -> (String, Self) {
        let mut stash = Self::default();
        let text: String = text.chars().filter(|&c| c != TOKEN_MARK).collect();
        let text = stash.extract_nowikis(&text);
        let text = SOURCE_PATTERN
            .replace_all(&text, |caps: &Captures<'_>| {
                let token = Placeholder::new(StashKind::Code, stash.code.len()).token();
                stash.code.push(StashedCode {
                    attrs: caps[1].to_owned(),
                    code: caps[2].to_owned(),
                });
                token
            })
            .into_owned();
        (text, stash)
    }

    /// Number of stashed nowiki spans.
    pub fn nowiki_count(&self) -> usize {
        self.nowikis.len()
    }

    /// Number of stashed code blocks.
    pub fn code_count(&self) -> usize {
        self.code.len()
    }

    /// Cut out every `<nowiki>…</nowiki>` span (case-insensitive, non-empty).
    ///
    /// The closing tag is the first one not immediately followed by another
    /// closing tag, so `<nowiki>a</nowiki></nowiki>` protects `a</nowiki>`.
    fn extract_nowikis(&mut self, text: &str) -> String {
        // ASCII lowercasing keeps byte offsets identical to `text`.
        let lower = text.to_ascii_lowercase();
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut pos = 0;

        while let Some(rel) = lower[pos..].find(NOWIKI_OPEN) {
            let open = pos + rel;
            let content_start = open + NOWIKI_OPEN.len();
            match find_nowiki_close(&lower, text, content_start) {
                Some(close) => {
                    out.push_str(&text[last..open]);
                    out.push_str(&Placeholder::new(StashKind::Nowiki, self.nowikis.len()).token());
                    self.nowikis.push(text[content_start..close].to_owned());
                    last = close + NOWIKI_CLOSE.len();
                    pos = last;
                }
                None => pos = open + 1,
            }
        }

        out.push_str(&text[last..]);
        out
    }

    /// Unescaped source text of a stashed region.
    fn raw(&self, placeholder: Placeholder) -> Option<&str> {
        match placeholder.kind {
            StashKind::Nowiki => self.nowikis.get(placeholder.index).map(String::as_str),
            StashKind::Code => self.code.get(placeholder.index).map(|c| c.code.as_str()),
        }
    }

    /// `text` with every placeholder replaced by the raw region it stands for.
    ///
    /// Used wherever a rule derives a second value from text that keeps its
    /// placeholders elsewhere (link targets, alt text, TOC titles).
    pub(crate) fn unstash<'t>(&self, text: &'t str) -> Cow<'t, str> {
        PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
            match Placeholder::from_captures(caps).and_then(|p| self.raw(p)) {
                // Code may itself hold nowiki placeholders.
                Some(raw) => self.unstash(raw).into_owned(),
                None => caps[0].to_owned(),
            }
        })
    }

    /// Mark placeholders present in `matched` but missing from `replacement`
    /// as consumed by the rule that rewrote it, together with any nowiki
    /// placeholders inside dropped code.
    pub(crate) fn consume_dropped(&self, matched: &str, replacement: &str, state: &mut ParserState) {
        if !matched.contains(TOKEN_MARK) {
            return;
        }
        let kept: BTreeSet<Placeholder> = placeholders(replacement).collect();
        for placeholder in placeholders(matched).filter(|p| !kept.contains(p)) {
            state.consume_placeholder(placeholder);
            if let Some(raw) = self.raw(placeholder) {
                for nested in placeholders(raw).filter(|p| !kept.contains(p)) {
                    state.consume_placeholder(nested);
                }
            }
        }
    }

    /// Replace placeholders in `html` with the stashed content.
    ///
    /// Every region not in `consumed` must appear exactly once. Code blocks
    /// are restored first so a nowiki placeholder inside a code block still
    /// finds its content.
    pub fn restore(
        &self,
        html: &str,
        consumed: &BTreeSet<Placeholder>,
        highlight: impl FnMut(&StashedCode) -> Result<String, RenderError>,
    ) -> Result<String, RenderError> {
        let html = drain_into(html, StashKind::Code, &self.code, consumed, highlight)?;
        drain_into(&html, StashKind::Nowiki, &self.nowikis, consumed, |span| {
            Ok(escape_html(span))
        })
    }
}

/// Byte offset of the closing `</nowiki>` for content starting at `content_start`.
fn find_nowiki_close(lower: &str, text: &str, content_start: usize) -> Option<usize> {
    let first_len = text[content_start..].chars().next()?.len_utf8();
    let mut search = content_start + first_len;
    loop {
        let close = search + lower[search..].find(NOWIKI_CLOSE)?;
        let after = close + NOWIKI_CLOSE.len();
        if lower[after..].starts_with(NOWIKI_CLOSE) {
            search = close + 1;
        } else {
            return Some(close);
        }
    }
}

/// Swap every `kind` placeholder in `html` for its rendered item.
///
/// The placeholders found must be exactly the items not consumed, each once.
fn drain_into<T>(
    html: &str,
    kind: StashKind,
    items: &[T],
    consumed: &BTreeSet<Placeholder>,
    mut render: impl FnMut(&T) -> Result<String, RenderError>,
) -> Result<String, RenderError> {
    let mut found: Vec<usize> = placeholders(html)
        .filter(|p| p.kind == kind)
        .map(|p| p.index)
        .collect();
    let expected: Vec<usize> = (0..items.len())
        .filter(|&index| !consumed.contains(&Placeholder::new(kind, index)))
        .collect();
    let placeholders_found = found.len();
    found.sort_unstable();
    if found != expected {
        return Err(RenderError::StashMismatch {
            kind,
            stashed: expected.len(),
            placeholders: placeholders_found,
        });
    }
    if found.is_empty() {
        return Ok(html.to_owned());
    }

    try_replace_all(&PLACEHOLDER, html, |caps| {
        match Placeholder::from_captures(caps)
            .filter(|p| p.kind == kind)
            .and_then(|p| items.get(p.index))
        {
            Some(item) => render(item),
            None => Ok(caps[0].to_owned()),
        }
    })
}
