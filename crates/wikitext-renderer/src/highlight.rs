//! `<source>` block attributes and the default highlighter.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::collaborator::{HighlightRequest, Highlighter, LineNumbering};
use crate::error::{CollaboratorError, RenderError};
use crate::options::{NumberingMode, RenderSettings};
use crate::stash::StashedCode;
use crate::util::escape_html;

/// Interval used by normal numbering.
const NORMAL_INTERVAL: u32 = 10;

static ATTR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)([^\s=]+)="(.*?)""#).unwrap());

/// Parse `key="value"` pairs from a `<source>` tag.
pub(crate) fn parse_source_attrs(attrs: &str) -> HashMap<String, String> {
    ATTR_PATTERN
        .captures_iter(attrs)
        .map(|caps| (caps[1].to_owned(), caps[2].to_owned()))
        .collect()
}

/// Language and numbering for a code block, with settings as fallbacks.
pub(crate) fn resolve_code_options(
    attrs: &HashMap<String, String>,
    settings: &RenderSettings,
) -> (String, LineNumbering) {
    let language = attrs
        .get("lang")
        .filter(|lang| !lang.is_empty())
        .cloned()
        .unwrap_or_else(|| settings.default_language.clone());

    let start = attrs
        .get("start")
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(1);

    let mode = match attrs.get("line") {
        Some(value) => NumberingMode::from_attr(value).unwrap_or(NumberingMode::None),
        None => settings.default_numbering,
    };

    let interval = if mode == NumberingMode::Normal {
        NORMAL_INTERVAL
    } else {
        attrs
            .get("highlight")
            .and_then(|v| v.trim().parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(settings.default_interval)
    };

    (
        language,
        LineNumbering {
            mode,
            start,
            interval,
        },
    )
}

/// Render a stashed code block through `highlighter`, wrapped in `<code>`.
pub(crate) fn render_code_block(
    block: &StashedCode,
    settings: &RenderSettings,
    highlighter: &dyn Highlighter,
) -> Result<String, RenderError> {
    let attrs = parse_source_attrs(&block.attrs);
    let (language, numbering) = resolve_code_options(&attrs, settings);
    tracing::trace!(%language, ?numbering.mode, "Highlighting code block");
    let highlighted = highlighter
        .highlight(&HighlightRequest {
            code: &block.code,
            language: &language,
            numbering,
        })
        .map_err(RenderError::Highlight)?;
    Ok(format!("<code>{highlighted}</code>"))
}

/// Highlighter that only escapes code and adds line numbers.
///
/// Numbered output is an `<ol>`; in fancy mode every `interval`-th line
/// gets the `li2` class instead of `li1`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, request: &HighlightRequest<'_>) -> Result<String, CollaboratorError> {
        let numbering = request.numbering;
        let mut out = format!(r#"<pre class="{}">"#, escape_html(request.language));

        if numbering.mode == NumberingMode::None {
            out.push_str(&escape_html(request.code));
        } else {
            write!(out, r#"<ol start="{}">"#, numbering.start)?;
            let interval = numbering.interval.max(1);
            for (index, line) in (1u32..).zip(request.code.lines()) {
                let class = if numbering.mode == NumberingMode::Fancy && index % interval == 0 {
                    "li2"
                } else {
                    "li1"
                };
                write!(out, r#"<li class="{class}">{}</li>"#, escape_html(line))?;
            }
            out.push_str("</ol>");
        }

        out.push_str("</pre>");
        Ok(out)
    }
}
