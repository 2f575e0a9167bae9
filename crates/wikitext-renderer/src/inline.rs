//! Inline rules.
//!
//! Built-in rules run in table order, each replacing every match on the line
//! produced by the previous rule. Registered custom rules follow; the first
//! one to request a stop ends the pass.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::context::RenderEnv;
use crate::error::RenderError;
use crate::state::{Control, ParserState};
use crate::toc::TOC_PLACEHOLDER;
use crate::util::{canonical_article_name, escape_html, link_tag, try_replace_all};

/// Namespaces rendered as `scheme:target` links instead of articles.
const URI_SCHEMES: &[&str] = &[
    "ftp", "http", "https", "gopher", "mailto", "news", "nntp", "telnet", "wais", "file",
    "prospero", "aim", "webcal",
];

const WIKIPEDIA_URL: &str = "https://en.wikipedia.org/wiki/";

/// Identity of a built-in inline rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InlineKind {
    InternalLink,
    ExternalLink,
    Emphasis,
    Eliminate,
    Variable,
    Issue,
    Emoticon,
    Autolink,
}

type InlineHandler =
    fn(&Captures<'_>, &str, &mut ParserState, &RenderEnv<'_>) -> Result<String, RenderError>;

struct InlineRule {
    kind: InlineKind,
    pattern: &'static LazyLock<Regex>,
    handler: InlineHandler,
}

static INTERNAL_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\[(:?([^\]]*?):)?([^\]]*?)(\|([^\]]*?))?\]\]([a-z]+)?").unwrap()
});
static EXTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*?)(\s+[^\]]*?)?\]").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'{2,5}").unwrap());
static ELIMINATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)__NOTOC__|__NOEDITSECTION__").unwrap());
static VARIABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^}]*?)\}\}").unwrap());
static ISSUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(bug|issue|ticket|story)\s#?((?:[A-Z0-9]+-)?\d+)").unwrap()
});
static EMOTICON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i):-?\(|:-?\)|[8B]-?\)|:-/|:-D|:-P|\(!\)|\(\?\)").unwrap()
});
static AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(^|[ \t\r\n])(",
        r"(?:ftp|http|https|gopher|mailto|news|nntp|telnet|wais|file|prospero|aim|webcal):",
        r"(?:[A-Za-z0-9$_.+!*(),;/?:@&~=-]|%[A-Fa-f0-9]{2}){2,}",
        r"(?:#[A-Za-z0-9][A-Za-z0-9$_.+!*(),;/?:@&~=%-]*)?",
        r"[A-Za-z0-9$_+!*();/?:~-])"
    ))
    .unwrap()
});
static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*?\)").unwrap());

static INLINE_RULES: [InlineRule; 8] = [
    InlineRule {
        kind: InlineKind::InternalLink,
        pattern: &INTERNAL_LINK,
        handler: internal_link,
    },
    InlineRule {
        kind: InlineKind::ExternalLink,
        pattern: &EXTERNAL_LINK,
        handler: external_link,
    },
    InlineRule {
        kind: InlineKind::Emphasis,
        pattern: &EMPHASIS,
        handler: emphasis,
    },
    InlineRule {
        kind: InlineKind::Eliminate,
        pattern: &ELIMINATE,
        handler: eliminate,
    },
    InlineRule {
        kind: InlineKind::Variable,
        pattern: &VARIABLE,
        handler: variable,
    },
    InlineRule {
        kind: InlineKind::Issue,
        pattern: &ISSUE,
        handler: issue,
    },
    InlineRule {
        kind: InlineKind::Emoticon,
        pattern: &EMOTICON,
        handler: emoticon,
    },
    InlineRule {
        kind: InlineKind::Autolink,
        pattern: &AUTOLINK,
        handler: autolink,
    },
];

/// Run the built-in and custom inline rules over `line`.
pub(crate) fn apply_inline_rules(
    line: String,
    state: &mut ParserState,
    env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    let mut line = line;
    for rule in &INLINE_RULES {
        if rule.kind == InlineKind::Variable && env.options.ignore_vars {
            continue;
        }
        line = try_replace_all(rule.pattern, &line, |caps| {
            let replacement = (rule.handler)(caps, &line, state, env)?;
            env.stash.consume_dropped(&caps[0], &replacement, state);
            Ok(replacement)
        })?;
    }

    for rule in &env.custom_rules {
        let (replaced, control) = rule.apply(&line, state);
        line = replaced;
        if control != Control::Continue {
            break;
        }
    }
    Ok(line)
}

fn internal_link(
    caps: &Captures<'_>,
    _line: &str,
    state: &mut ParserState,
    env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    let leading_colon = caps.get(1).is_some_and(|m| m.as_str().starts_with(':'));
    let namespace = caps.get(2).map_or("", |m| m.as_str());
    let target = &caps[3];
    // Targets feed hrefs and side outputs; the label keeps any placeholders.
    let resolved = env.stash.unstash(target);
    let resolved = resolved.trim();
    let title = caps.get(5).map(|m| m.as_str()).filter(|t| !t.is_empty());
    let trailing = caps.get(6).map_or("", |m| m.as_str());
    let namespace_lower = namespace.to_lowercase();

    // `[[ns:target|opt|…|label]]`: the last option is the label.
    let last_option = || {
        title
            .and_then(|t| t.rsplit('|').next())
            .unwrap_or(target)
            .trim()
    };

    if namespace_lower == "image" {
        return image(target, title, env);
    }

    if namespace_lower == "category" && !leading_colon {
        state.add_category(resolved);
        return Ok(String::new());
    }

    if namespace_lower == "wikipedia" {
        let href = format!("{WIKIPEDIA_URL}{}", canonical_article_name(resolved));
        let label = format!("{namespace}:{}", escape_html(last_option()));
        return Ok(link_tag(&href, &label, &[]));
    }

    if namespace == env.settings.internal_namespace {
        let href = env
            .router
            .internal_url(resolved)
            .map_err(RenderError::Routing)?;
        return Ok(link_tag(&href, &escape_html(last_option()), &[]));
    }

    if namespace.is_empty() && target.starts_with('/') {
        return Ok(link_tag(resolved, &escape_html(last_option()), &[]));
    }

    let label = match title {
        Some(title) => escape_html(title.trim()),
        None => escape_html(&fallback_label(target, trailing)),
    };

    if URI_SCHEMES.contains(&namespace_lower.as_str()) {
        let href = format!("{namespace}:{}", canonical_article_name(resolved));
        return Ok(link_tag(&href, &label, &[]));
    }

    let full = if namespace.is_empty() {
        resolved.to_owned()
    } else {
        format!("{}:{resolved}", env.stash.unstash(namespace).trim())
    };
    let name = canonical_article_name(&full);
    state.record_internal_link(&name);
    let href = env.router.article_url(&name).map_err(RenderError::Routing)?;
    Ok(link_tag(&href, &label, &[]))
}

/// Label for a link without an explicit title: the target plus trailing
/// letters, minus any parenthetical and any `prefix:`.
fn fallback_label(target: &str, trailing: &str) -> String {
    let text = format!("{target}{trailing}");
    let text = PARENTHETICAL.replace_all(&text, "");
    let text = text.split_once(':').map_or(&*text, |(_, rest)| rest);
    text.trim().to_owned()
}

/// `[[Image:path|option|…|alt]]`. Options `frame` and `right` wrap the image.
fn image(target: &str, title: Option<&str>, env: &RenderEnv<'_>) -> Result<String, RenderError> {
    let mut options: Vec<&str> = title.map_or_else(Vec::new, |t| t.split('|').collect());
    let alt = options.pop().map_or(target, str::trim);
    let src = env
        .router
        .image_url(env.stash.unstash(target).trim())
        .map_err(RenderError::Routing)?;

    // The caption keeps any placeholders; the attribute gets the raw text.
    let caption = escape_html(alt);
    let alt = escape_html(&env.stash.unstash(alt));
    let mut html = format!(r#"<img src="{}" alt="{alt}" />"#, escape_html(&src));
    for option in options {
        match option.trim() {
            "frame" => {
                html = format!(
                    r#"<div class="image-frame">{html}<div class="image-caption">{caption}</div></div>"#
                );
            }
            "right" => html = format!(r#"<div class="image-right">{html}</div>"#),
            _ => {}
        }
    }
    Ok(html)
}

fn external_link(
    caps: &Captures<'_>,
    _line: &str,
    state: &mut ParserState,
    _env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    let href = caps[1].trim();
    if href.is_empty() {
        return Ok(caps[0].to_owned());
    }
    let label = match caps.get(2).map(|m| m.as_str().trim()) {
        Some(label) if !label.is_empty() => escape_html(label),
        _ => format!("[{}]", state.next_link_number()),
    };
    Ok(link_tag(href, &label, &[("target", "_new")]))
}

fn emphasis(
    caps: &Captures<'_>,
    _line: &str,
    state: &mut ParserState,
    _env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    Ok(state.emphasis_mut().toggle(caps[0].len()))
}

fn eliminate(
    _caps: &Captures<'_>,
    _line: &str,
    _state: &mut ParserState,
    _env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    Ok(String::new())
}

fn variable(
    caps: &Captures<'_>,
    _line: &str,
    _state: &mut ParserState,
    env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    let now = env.now;
    let value = match caps[1].trim() {
        "CURRENTMONTH" => now.format("%m").to_string(),
        "CURRENTMONTHNAME" | "CURRENTMONTHNAMEGEN" => now.format("%B").to_string(),
        "CURRENTDAY" => now.format("%d").to_string(),
        "CURRENTDAYNAME" => now.format("%A").to_string(),
        "CURRENTYEAR" => now.format("%Y").to_string(),
        "CURRENTTIME" => now.format("%H:%M").to_string(),
        "NUMBEROFARTICLES" => "0".to_owned(),
        "PAGENAME" => escape_html(&env.settings.page_name),
        "NAMESPACE" => "None".to_owned(),
        "TOC" => TOC_PLACEHOLDER.to_owned(),
        "SITENAME" => escape_html(&env.settings.site_name),
        "SITETAGLINE" => escape_html(&env.settings.site_tagline),
        _ => String::new(),
    };
    Ok(value)
}

fn issue(
    caps: &Captures<'_>,
    line: &str,
    _state: &mut ParserState,
    env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    let Some(whole) = caps.get(0) else {
        return Ok(String::new());
    };
    let reference = whole.as_str();
    if line[..whole.start()].ends_with('!') {
        return Ok(reference.to_owned());
    }

    match env.issues.find_issue(reference) {
        Ok(Some(issue)) => {
            let href = env.router.issue_url(&issue).map_err(RenderError::Routing)?;
            let label = escape_html(&format!("{} - {}", issue.formatted_number, issue.title));
            let attrs: &[(&str, &str)] = if issue.is_resolved() {
                &[("class", "closed")]
            } else {
                &[]
            };
            Ok(link_tag(&href, &label, attrs))
        }
        Ok(None) => Ok(escape_html(reference)),
        Err(err) => {
            tracing::warn!(reference, error = %err, "Issue lookup failed");
            Ok(escape_html(reference))
        }
    }
}

/// Image file for an emoticon, matched case-insensitively.
fn smiley_file(code: &str) -> Option<&'static str> {
    let file = match code.to_ascii_uppercase().as_str() {
        ":(" | ":-(" => "4.png",
        ":)" | ":-)" => "2.png",
        "8)" | "8-)" | "B)" | "B-)" => "3.png",
        ":-/" => "10.png",
        ":-D" => "5.png",
        ":-P" => "6.png",
        "(!)" => "8.png",
        "(?)" => "9.png",
        _ => return None,
    };
    Some(file)
}

fn emoticon(
    caps: &Captures<'_>,
    _line: &str,
    _state: &mut ParserState,
    env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    let code = &caps[0];
    let Some(file) = smiley_file(code) else {
        return Ok(code.to_owned());
    };
    let src = env
        .router
        .image_url(&format!("smileys/{file}"))
        .map_err(RenderError::Routing)?;
    Ok(format!(
        r#"<img src="{}" alt="{}" class="smiley" />"#,
        escape_html(&src),
        escape_html(code)
    ))
}

fn autolink(
    caps: &Captures<'_>,
    _line: &str,
    state: &mut ParserState,
    _env: &RenderEnv<'_>,
) -> Result<String, RenderError> {
    let label = format!("[{}]", state.next_link_number());
    Ok(format!(
        "{}{}",
        &caps[1],
        link_tag(&caps[2], &label, &[("target", "_new")])
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::collaborator::{Issue, IssueLookup};
    use crate::context::test_support::{env, env_with_stash};
    use crate::error::CollaboratorError;
    use crate::issues::IssueTable;
    use crate::options::RenderOptions;
    use crate::registry::{RuleOutput, RuleRegistry};
    use crate::stash::Stash;

    fn render(line: &str) -> String {
        let mut state = ParserState::new(None);
        apply_inline_rules(line.to_owned(), &mut state, &env(RenderOptions::default())).unwrap()
    }

    fn render_with(line: &str, env: &RenderEnv<'_>) -> (String, ParserState) {
        let mut state = ParserState::new(None);
        let html = apply_inline_rules(line.to_owned(), &mut state, env).unwrap();
        (html, state)
    }

    #[test]
    fn test_internal_link_records_canonical_name() {
        let (html, state) = render_with(
            "see [[main page]] and [[Main page|home]]",
            &env(RenderOptions::default()),
        );
        assert_eq!(
            html,
            r#"see <a href="/wiki/Main_page">main page</a> and <a href="/wiki/Main_page">home</a>"#
        );
        assert_eq!(state.internal_links().get("Main_page"), Some(&2));
    }

    #[test]
    fn test_internal_link_trailing_letters_and_parenthetical() {
        assert_eq!(
            render("[[apple]]s"),
            r#"<a href="/wiki/Apple">apples</a>"#
        );
        assert_eq!(
            render("[[Mercury (planet)]]"),
            r#"<a href="/wiki/Mercury_(planet)">Mercury</a>"#
        );
    }

    #[test]
    fn test_internal_link_with_namespace() {
        assert_eq!(
            render("[[Help:editing]]"),
            r#"<a href="/wiki/Help:editing">editing</a>"#
        );
    }

    #[test]
    fn test_category_is_collected() {
        let (html, state) = render_with("[[Category:Tools]]", &env(RenderOptions::default()));
        assert_eq!(html, "");
        assert!(state.categories().contains("Tools"));
    }

    #[test]
    fn test_escaped_category_is_a_link() {
        let (html, state) = render_with("[[:Category:Tools]]", &env(RenderOptions::default()));
        assert_eq!(html, r#"<a href="/wiki/Category:Tools">Tools</a>"#);
        assert!(state.categories().is_empty());
    }

    #[test]
    fn test_nowiki_link_target_resolves_href_and_keeps_label_placeholder() {
        let (text, stash) = Stash::extract("[[<nowiki>x y</nowiki>]]");
        let (html, state) = render_with(&text, &env_with_stash(RenderOptions::default(), &stash));
        assert_eq!(
            html,
            "<a href=\"/wiki/X_y\">\u{FFFC}NOWIKI0\u{FFFC}</a>"
        );
        assert_eq!(state.internal_links().get("X_y"), Some(&1));
        assert!(state.consumed_placeholders().is_empty());
    }

    #[test]
    fn test_nowiki_category_name_is_unstashed_and_consumed() {
        let (text, stash) = Stash::extract("[[Category:<nowiki>x</nowiki>]]");
        let (html, state) = render_with(&text, &env_with_stash(RenderOptions::default(), &stash));
        assert_eq!(html, "");
        assert!(state.categories().contains("x"));
        assert_eq!(state.consumed_placeholders().len(), 1);
    }

    #[test]
    fn test_nowiki_image_caption_keeps_single_placeholder() {
        let (text, stash) = Stash::extract("[[Image:a.png|frame|<nowiki>cap</nowiki>]]");
        let (html, state) = render_with(&text, &env_with_stash(RenderOptions::default(), &stash));
        assert_eq!(
            html,
            concat!(
                r#"<div class="image-frame"><img src="/images/a.png" alt="cap" />"#,
                "<div class=\"image-caption\">\u{FFFC}NOWIKI0\u{FFFC}</div></div>"
            )
        );
        assert!(state.consumed_placeholders().is_empty());
    }

    #[test]
    fn test_nowiki_image_alt_without_caption_is_consumed() {
        let (text, stash) = Stash::extract("[[Image:a.png|<nowiki>x</nowiki>]]");
        let (html, state) = render_with(&text, &env_with_stash(RenderOptions::default(), &stash));
        assert_eq!(html, r#"<img src="/images/a.png" alt="x" />"#);
        assert_eq!(state.consumed_placeholders().len(), 1);
    }

    #[test]
    fn test_image_link() {
        assert_eq!(
            render("[[Image:logo.png|Our logo]]"),
            r#"<img src="/images/logo.png" alt="Our logo" />"#
        );
        assert_eq!(
            render("[[image:logo.png|right|Logo]]"),
            r#"<div class="image-right"><img src="/images/logo.png" alt="Logo" /></div>"#
        );
    }

    #[test]
    fn test_image_frame_has_caption() {
        assert_eq!(
            render("[[Image:a.png|frame|Caption]]"),
            concat!(
                r#"<div class="image-frame"><img src="/images/a.png" alt="Caption" />"#,
                r#"<div class="image-caption">Caption</div></div>"#
            )
        );
    }

    #[test]
    fn test_wikipedia_link() {
        assert_eq!(
            render("[[wikipedia:rust language|Rust]]"),
            r#"<a href="https://en.wikipedia.org/wiki/Rust_language">wikipedia:Rust</a>"#
        );
    }

    #[test]
    fn test_internal_namespace_and_absolute_path() {
        assert_eq!(
            render("[[App:/settings|Settings]]"),
            r#"<a href="/settings">Settings</a>"#
        );
        assert_eq!(render("[[/about|About]]"), r#"<a href="/about">About</a>"#);
    }

    #[test]
    fn test_scheme_namespace_link() {
        let (html, state) = render_with(
            "[[mailto:someone@example.org|mail]]",
            &env(RenderOptions::default()),
        );
        assert_eq!(html, r#"<a href="mailto:Someone@example.org">mail</a>"#);
        assert!(state.internal_links().is_empty());
    }

    #[test]
    fn test_external_links_are_numbered() {
        assert_eq!(
            render("[http://a.example] [http://b.example Bee]  [http://c.example]"),
            concat!(
                r#"<a href="http://a.example" target="_new">[1]</a> "#,
                r#"<a href="http://b.example" target="_new">Bee</a>  "#,
                r#"<a href="http://c.example" target="_new">[2]</a>"#
            )
        );
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(render("'''bold''' and ''it''"), "<b>bold</b> and <i>it</i>");
        assert_eq!(render("'''''both'''''"), "<i><b>both</b></i>");
    }

    #[test]
    fn test_eliminated_markers() {
        assert_eq!(render("a__NOTOC__b__noeditsection__c"), "abc");
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            render("{{CURRENTYEAR}}-{{CURRENTMONTH}}-{{CURRENTDAY}} {{CURRENTTIME}}"),
            "2024-03-09 14:05"
        );
        assert_eq!(render("{{CURRENTMONTHNAME}} {{CURRENTDAYNAME}}"), "March Saturday");
        assert_eq!(render("{{SITENAME}}|{{NAMESPACE}}|{{NUMBEROFARTICLES}}"), "Wiki|None|0");
        assert_eq!(render("<{{UNKNOWN}}>"), "<>");
        assert_eq!(render("{{TOC}}"), TOC_PLACEHOLDER);
    }

    #[test]
    fn test_ignore_vars_keeps_variables() {
        let (html, _) = render_with(
            "{{CURRENTYEAR}}",
            &env(RenderOptions::default().with_ignore_vars(true)),
        );
        assert_eq!(html, "{{CURRENTYEAR}}");
    }

    fn tracker() -> IssueTable {
        IssueTable::new()
            .with_issue(Issue {
                project_key: "CORE".to_owned(),
                number: 12,
                formatted_number: "CORE-12".to_owned(),
                title: "Crash on <save>".to_owned(),
                closed: false,
                deleted: false,
            })
            .with_issue(Issue {
                project_key: "CORE".to_owned(),
                number: 13,
                formatted_number: "CORE-13".to_owned(),
                title: "Old".to_owned(),
                closed: true,
                deleted: false,
            })
    }

    #[test]
    fn test_issue_links() {
        let table = tracker();
        let mut env = env(RenderOptions::default());
        env.issues = &table;
        let (html, _) = render_with("fixes bug #12, see issue CORE-13", &env);
        assert_eq!(
            html,
            concat!(
                r#"fixes <a href="/core/issues/12">CORE-12 - Crash on &lt;save&gt;</a>, "#,
                r#"see <a href="/core/issues/13" class="closed">CORE-13 - Old</a>"#
            )
        );
    }

    #[test]
    fn test_issue_escape_and_unknown() {
        let table = tracker();
        let mut env = env(RenderOptions::default());
        env.issues = &table;
        assert_eq!(render_with("!bug #12", &env).0, "!bug #12");
        assert_eq!(render_with("ticket 99", &env).0, "ticket 99");
        assert_eq!(render_with("debug 12", &env).0, "debug 12");
    }

    #[test]
    fn test_issue_lookup_failure_falls_back_to_text() {
        struct Broken;
        impl IssueLookup for Broken {
            fn find_issue(&self, _: &str) -> Result<Option<Issue>, CollaboratorError> {
                Err("tracker offline".into())
            }
        }
        let mut env = env(RenderOptions::default());
        env.issues = &Broken;
        assert_eq!(render_with("bug 1", &env).0, "bug 1");
    }

    #[test]
    fn test_emoticons() {
        assert_eq!(
            render("hi :-) (?)"),
            concat!(
                r#"hi <img src="/images/smileys/2.png" alt=":-)" class="smiley" /> "#,
                r#"<img src="/images/smileys/9.png" alt="(?)" class="smiley" />"#
            )
        );
        assert_eq!(
            render("b)"),
            r#"<img src="/images/smileys/3.png" alt="b)" class="smiley" />"#
        );
    }

    #[test]
    fn test_autolink() {
        assert_eq!(
            render("go to https://example.org/path."),
            r#"go to <a href="https://example.org/path" target="_new">[1]</a>."#
        );
        assert_eq!(render("x=http://nope"), "x=http://nope");
    }

    #[test]
    fn test_custom_rules_run_after_builtins_and_can_stop() {
        let registry = RuleRegistry::new();
        registry.register(Regex::new("<b>").unwrap(), |_, _| RuleOutput::stop("<strong>"));
        registry.register(Regex::new("</b>").unwrap(), |_, _| RuleOutput::text("</strong>"));
        let mut env = env(RenderOptions::default());
        env.custom_rules = registry.snapshot();
        let (html, _) = render_with("'''x'''", &env);
        assert_eq!(html, "<strong>x</b>");
    }

    #[test]
    fn test_custom_rule_snapshot_is_shared() {
        let registry = RuleRegistry::new();
        registry.register(Regex::new("x").unwrap(), |_, _| RuleOutput::text("y"));
        let rules = registry.snapshot();
        assert!(Arc::ptr_eq(&rules[0], &registry.snapshot()[0]));
    }
}
