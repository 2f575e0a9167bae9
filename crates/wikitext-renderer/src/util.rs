//! Shared helpers for HTML output and regex-driven replacement.

use std::fmt::Write;

use regex::{Captures, Regex};

/// Escape HTML special characters.
///
/// Apostrophes are left untouched: escaped list items and table cells still
/// go through the emphasis rule, which looks for runs of `'`.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Canonical article name for a link target.
///
/// Spaces become underscores and the first character is upper-cased.
///
/// ```
/// use wikitext_renderer::canonical_article_name;
///
/// assert_eq!(canonical_article_name("main page"), "Main_page");
/// assert_eq!(canonical_article_name("Help:getting started"), "Help:getting_started");
/// ```
#[must_use]
pub fn canonical_article_name(target: &str) -> String {
    let underscored = target.replace(' ', "_");
    let mut chars = underscored.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build an anchor tag. `label` must already be escaped.
pub(crate) fn link_tag(href: &str, label: &str, attrs: &[(&str, &str)]) -> String {
    let mut out = format!(r#"<a href="{}""#, escape_html(href));
    for (name, value) in attrs {
        write!(out, r#" {name}="{}""#, escape_html(value)).unwrap();
    }
    write!(out, ">{label}</a>").unwrap();
    out
}

/// Replace every match of `re` in `haystack` with the handler's output.
///
/// Like [`Regex::replace_all`] but lets the handler fail, stopping at the
/// first error.
pub(crate) fn try_replace_all<E>(
    re: &Regex,
    haystack: &str,
    mut replace: impl FnMut(&Captures<'_>) -> Result<String, E>,
) -> Result<String, E> {
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for caps in re.captures_iter(haystack) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&haystack[last..whole.start()]);
        out.push_str(&replace(&caps)?);
        last = whole.end();
    }
    out.push_str(&haystack[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it's");
    }

    #[test]
    fn test_canonical_article_name() {
        assert_eq!(canonical_article_name("foo bar baz"), "Foo_bar_baz");
        assert_eq!(canonical_article_name("Already"), "Already");
        assert_eq!(canonical_article_name("élan vital"), "Élan_vital");
        assert_eq!(canonical_article_name(""), "");
    }

    #[test]
    fn test_link_tag_with_attrs() {
        assert_eq!(
            link_tag("http://a?x=1&y=2", "[1]", &[("target", "_new")]),
            r#"<a href="http://a?x=1&amp;y=2" target="_new">[1]</a>"#
        );
    }

    #[test]
    fn test_try_replace_all() {
        let re = Regex::new(r"\d+").unwrap();
        let out: Result<String, ()> =
            try_replace_all(&re, "a1b22c", |caps| Ok(format!("<{}>", &caps[0])));
        assert_eq!(out.unwrap(), "a<1>b<22>c");
    }

    #[test]
    fn test_try_replace_all_propagates_error() {
        let re = Regex::new(r"\d").unwrap();
        let out = try_replace_all(&re, "a1", |_| Err("boom"));
        assert_eq!(out, Err("boom"));
    }
}
