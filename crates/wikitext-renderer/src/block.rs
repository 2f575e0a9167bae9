//! Line-level block rules.
//!
//! Each rule pairs a whole-line pattern with a handler. Rules are evaluated in
//! table order against the line as rewritten by earlier rules; a rule fires
//! when its pattern matches, and a handler returning [`Control::Stop`] or
//! [`Control::StopAll`] ends the pass. Which rules fired is reported back so
//! the caller can close structures the line did not continue.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::context::RenderEnv;
use crate::state::{Control, ListKind, ParserState};
use crate::util::escape_html;

/// Identity of a block rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockKind {
    Preformat,
    DefinitionList,
    BlankLine,
    ListItem,
    TableOpen,
    TableClose,
    TableRow,
    TableHeader,
    TableCell,
    Header,
    HorizontalRule,
}

/// Output of one block handler.
struct Step {
    line: String,
    control: Control,
}

impl Step {
    fn new(line: String, control: Control) -> Self {
        Self { line, control }
    }
}

type BlockHandler = fn(&Captures<'_>, &mut ParserState, &RenderEnv<'_>) -> Step;

struct BlockRule {
    kind: BlockKind,
    pattern: &'static LazyLock<Regex>,
    handler: BlockHandler,
}

static PREFORMAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s(.*)$").unwrap());
// `;` or `:` unless the line opens with a smiley: the marker, an optional
// `-`, then `(`, `)`, `/`, or a lone `D` or `P` (end of line or before a space).
static DEFINITION_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^([;:])((?:[^\-()/DPdp].*|[DPdp]\S.*",
        r"|-(?:[^()/DPdp].*|[DPdp]\S.*)?)?)$"
    ))
    .unwrap()
});
static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^$").unwrap());
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([*#]+)(.*)$").unwrap());
static TABLE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\{\|(.*)$").unwrap());
static TABLE_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\|\}$").unwrap());
static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\|-$").unwrap());
static TABLE_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^!\s(.*)$").unwrap());
static TABLE_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\|{1,2}\s(.*)$").unwrap());
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(={1,6})(.*?)(={1,6})$").unwrap());
static HORIZONTAL_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^----$").unwrap());

static BLOCK_RULES: [BlockRule; 11] = [
    BlockRule {
        kind: BlockKind::Preformat,
        pattern: &PREFORMAT,
        handler: preformat,
    },
    BlockRule {
        kind: BlockKind::DefinitionList,
        pattern: &DEFINITION_LIST,
        handler: definition_list,
    },
    BlockRule {
        kind: BlockKind::BlankLine,
        pattern: &BLANK_LINE,
        handler: blank_line,
    },
    BlockRule {
        kind: BlockKind::ListItem,
        pattern: &LIST_ITEM,
        handler: list_item,
    },
    BlockRule {
        kind: BlockKind::TableOpen,
        pattern: &TABLE_OPEN,
        handler: table_open,
    },
    BlockRule {
        kind: BlockKind::TableClose,
        pattern: &TABLE_CLOSE,
        handler: table_close,
    },
    BlockRule {
        kind: BlockKind::TableRow,
        pattern: &TABLE_ROW,
        handler: table_row,
    },
    BlockRule {
        kind: BlockKind::TableHeader,
        pattern: &TABLE_HEADER,
        handler: table_header,
    },
    BlockRule {
        kind: BlockKind::TableCell,
        pattern: &TABLE_CELL,
        handler: table_cell,
    },
    BlockRule {
        kind: BlockKind::Header,
        pattern: &HEADER,
        handler: header,
    },
    BlockRule {
        kind: BlockKind::HorizontalRule,
        pattern: &HORIZONTAL_RULE,
        handler: horizontal_rule,
    },
];

/// Result of the block pass over one line.
#[derive(Debug)]
pub(crate) struct BlockPass {
    /// Line after every fired rule rewrote it.
    pub line: String,
    /// Rules that fired, in order.
    pub fired: Vec<BlockKind>,
    /// Control returned by the rule that ended the pass, if any.
    pub control: Control,
}

impl BlockPass {
    pub(crate) fn has_fired(&self, kind: BlockKind) -> bool {
        self.fired.contains(&kind)
    }
}

/// Run the block rules over `line`.
pub(crate) fn apply_block_rules(
    line: &str,
    state: &mut ParserState,
    env: &RenderEnv<'_>,
) -> BlockPass {
    let mut pass = BlockPass {
        line: line.to_owned(),
        fired: Vec::new(),
        control: Control::Continue,
    };

    for rule in &BLOCK_RULES {
        let step = {
            let Some(caps) = rule.pattern.captures(&pass.line) else {
                continue;
            };
            let step = (rule.handler)(&caps, state, env);
            env.stash.consume_dropped(&caps[0], &step.line, state);
            step
        };
        tracing::trace!(rule = ?rule.kind, control = ?step.control, "Block rule fired");
        pass.fired.push(rule.kind);
        pass.line = step.line;
        if step.control != Control::Continue {
            pass.control = step.control;
            break;
        }
    }

    pass
}

/// Close preformatted text, definition lists and lists that `pass` did not continue.
///
/// Returns the closing tags, which belong before the line's own output.
pub(crate) fn close_unaffirmed(state: &mut ParserState, pass: &BlockPass) -> String {
    let mut out = String::new();
    if state.in_preformat() && !pass.has_fired(BlockKind::Preformat) {
        state.set_preformat(false);
        out.push_str("</pre>\n");
    }
    if state.in_definition_list() && !pass.has_fired(BlockKind::DefinitionList) {
        state.set_definition_list(false);
        out.push_str("</dl>\n");
    }
    if state.lists().depth() > 0 && !pass.has_fired(BlockKind::ListItem) {
        out.push_str(&state.lists_mut().close_all());
    }
    out
}

fn preformat(caps: &Captures<'_>, state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    let mut out = String::new();
    if !state.in_preformat() {
        state.set_preformat(true);
        out.push_str("<pre>");
    }
    out.push_str(&escape_html(&caps[1]));
    out.push('\n');
    Step::new(out, Control::StopAll)
}

fn definition_list(caps: &Captures<'_>, state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    let mut out = String::new();
    if !state.in_definition_list() {
        state.set_definition_list(true);
        out.push_str("<dl>\n");
    }

    let content = caps[2].trim_start();
    if &caps[1] == ";" {
        match content.split_once(" :") {
            Some((term, definition)) => out.push_str(&format!(
                "<dt>{}</dt>\n<dd>{}</dd>\n",
                escape_html(term.trim()),
                escape_html(definition.trim())
            )),
            None => out.push_str(&format!("<dt>{}</dt>\n", escape_html(content))),
        }
    } else {
        out.push_str(&format!("<dd>{}</dd>\n", escape_html(content)));
    }
    Step::new(out, Control::Continue)
}

fn blank_line(_caps: &Captures<'_>, state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    let mut out = state.emphasis_mut().flush();
    if state.suppress_blank_line() {
        return Step::new(out, Control::Continue);
    }
    out.push_str("<br><br>");
    Step::new(out, Control::Stop)
}

fn list_item(caps: &Captures<'_>, state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    let markers = &caps[1];
    let kind = markers
        .chars()
        .last()
        .map_or(ListKind::Unordered, ListKind::from_marker);
    let mut out = state.lists_mut().adjust(markers.len(), kind);
    out.push_str(&format!("<li>{}</li>\n", escape_html(caps[2].trim())));
    Step::new(out, Control::Continue)
}

fn table_open(caps: &Captures<'_>, state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    let attrs: String = caps[1].chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let table = state.table_mut();
    table.open = true;
    table.row_open = false;
    table.cell_open = false;

    let mut out = format!("<table{attrs}");
    if !attrs.contains("cellspacing") {
        out.push_str(" cellspacing=0");
    }
    out.push('>');
    Step::new(out, Control::StopAll)
}

fn table_close(_caps: &Captures<'_>, state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    let table = state.table_mut();
    let mut out = table.close_row().to_owned();
    table.open = false;
    out.push_str("</table>");
    Step::new(out, Control::StopAll)
}

fn table_row(_caps: &Captures<'_>, state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    let table = state.table_mut();
    let mut out = table.close_row().to_owned();
    table.row_open = true;
    out.push_str("<tr>");
    Step::new(out, Control::StopAll)
}

fn table_header(caps: &Captures<'_>, state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    let mut out = state.table_mut().close_row().to_owned();
    out.push_str("<thead><tr>");
    for cell in caps[1].split("!!") {
        out.push_str(&format!("<th>{}</th>", escape_html(cell.trim())));
    }
    out.push_str("</tr></thead>");
    Step::new(out, Control::Continue)
}

fn table_cell(caps: &Captures<'_>, state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    let table = state.table_mut();
    let mut out = String::new();
    if !table.row_open {
        table.row_open = true;
        out.push_str("<tr>");
    }
    if table.cell_open {
        out.push_str("</td>");
    }
    for (index, cell) in caps[1].split("||").enumerate() {
        if index > 0 {
            out.push_str("</td>");
        }
        out.push_str(&format!("<td>{}<br>", escape_html(cell.trim())));
    }
    table.cell_open = true;
    Step::new(out, Control::Continue)
}

fn header(caps: &Captures<'_>, state: &mut ParserState, env: &RenderEnv<'_>) -> Step {
    if !env.options.headers {
        return Step::new(format!("{}\n", escape_html(&caps[0])), Control::Continue);
    }

    // At most six markers, so the level always fits.
    let level = u8::try_from(caps[1].len()).unwrap_or(6);
    let title = caps[2].trim();

    let mut out = state.emphasis_mut().flush();
    out.push_str(&format!("\n<h{level}"));
    if let Some(id) = state.toc_mut().push(level, &env.stash.unstash(title)) {
        out.push_str(&format!(r#" id="{}""#, escape_html(&id)));
    }
    out.push('>');
    out.push_str(&escape_html(title));
    if !env.options.embedded {
        out.push_str(&format!(
            r##"&nbsp;<a href="#top">&uArr;&nbsp;{}</a>"##,
            escape_html(&env.settings.top_label)
        ));
    }
    out.push_str(&format!("</h{level}>\n"));
    Step::new(out, Control::Stop)
}

fn horizontal_rule(_caps: &Captures<'_>, _state: &mut ParserState, _env: &RenderEnv<'_>) -> Step {
    Step::new("<hr />".to_owned(), Control::Continue)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::test_support::env;
    use crate::options::RenderOptions;

    fn run(lines: &[&str], state: &mut ParserState, options: RenderOptions) -> Vec<BlockPass> {
        let env = env(options);
        lines
            .iter()
            .map(|line| apply_block_rules(line, state, &env))
            .collect()
    }

    fn run_one(line: &str) -> BlockPass {
        let mut state = ParserState::new(None);
        run(&[line], &mut state, RenderOptions::default()).remove(0)
    }

    #[test]
    fn test_plain_line_fires_nothing() {
        let pass = run_one("just text");
        assert_eq!(pass.line, "just text");
        assert!(pass.fired.is_empty());
        assert_eq!(pass.control, Control::Continue);
    }

    #[test]
    fn test_preformat_opens_once_and_stops_all() {
        let mut state = ParserState::new(None);
        let passes = run(&[" a < b", " c"], &mut state, RenderOptions::default());
        assert_eq!(passes[0].line, "<pre>a &lt; b\n");
        assert_eq!(passes[0].control, Control::StopAll);
        assert_eq!(passes[1].line, "c\n");
        assert!(state.in_preformat());
    }

    #[test]
    fn test_definition_list_term_and_definition() {
        let mut state = ParserState::new(None);
        let passes = run(
            &["; term : meaning", ": more"],
            &mut state,
            RenderOptions::default(),
        );
        assert_eq!(passes[0].line, "<dl>\n<dt>term</dt>\n<dd>meaning</dd>\n");
        assert_eq!(passes[1].line, "<dd>more</dd>\n");
        assert!(state.in_definition_list());
    }

    #[test]
    fn test_definition_list_ignores_smileys() {
        for line in [":) hi", ":-) hi", ":-D", ":P", ":/ path", ":( sad"] {
            let pass = run_one(line);
            assert!(
                !pass.has_fired(BlockKind::DefinitionList),
                "{line} opened a definition list"
            );
        }
        assert!(run_one(":-").has_fired(BlockKind::DefinitionList));
        assert!(run_one(":").has_fired(BlockKind::DefinitionList));
    }

    #[test]
    fn test_definition_list_words_starting_with_d_or_p() {
        let mut state = ParserState::new(None);
        let passes = run(
            &[";Definition : text", ":Done", ":played", ":-Dash"],
            &mut state,
            RenderOptions::default(),
        );
        assert_eq!(passes[0].line, "<dl>\n<dt>Definition</dt>\n<dd>text</dd>\n");
        assert_eq!(passes[1].line, "<dd>Done</dd>\n");
        assert_eq!(passes[2].line, "<dd>played</dd>\n");
        assert_eq!(passes[3].line, "<dd>-Dash</dd>\n");

        for line in [":D hi", ":p", ";P", ":-d"] {
            assert!(
                !run_one(line).has_fired(BlockKind::DefinitionList),
                "{line} opened a definition list"
            );
        }
    }

    #[test]
    fn test_blank_line_breaks_unless_suppressed() {
        let pass = run_one("");
        assert_eq!(pass.line, "<br><br>");
        assert_eq!(pass.control, Control::Stop);

        let mut state = ParserState::new(None);
        state.set_suppress_blank_line(true);
        let pass = run(&[""], &mut state, RenderOptions::default()).remove(0);
        assert_eq!(pass.line, "");
        assert_eq!(pass.control, Control::Continue);
    }

    #[test]
    fn test_blank_line_flushes_emphasis() {
        let mut state = ParserState::new(None);
        state.emphasis_mut().toggle(3);
        let pass = run(&[""], &mut state, RenderOptions::default()).remove(0);
        assert_eq!(pass.line, "</b><br><br>");
    }

    #[test]
    fn test_nested_lists() {
        let mut state = ParserState::new(None);
        let passes = run(
            &["* a", "** b", "*# c", "* d"],
            &mut state,
            RenderOptions::default(),
        );
        assert_eq!(passes[0].line, "\n<ul>\n<li>a</li>\n");
        assert_eq!(passes[1].line, "\n<ul>\n<li>b</li>\n");
        assert_eq!(passes[2].line, "<li>c</li>\n");
        assert_eq!(passes[3].line, "\n</ul>\n<li>d</li>\n");
        assert_eq!(state.lists().depth(), 1);
    }

    #[test]
    fn test_table() {
        let mut state = ParserState::new(None);
        let passes = run(
            &["{| border=1", "! H1 !! H2", "|-", "| c1 || c2", "|}"],
            &mut state,
            RenderOptions::default(),
        );
        let html: String = passes.iter().map(|p| p.line.as_str()).collect();
        assert_eq!(
            html,
            concat!(
                "<table border=1 cellspacing=0>",
                "<thead><tr><th>H1</th><th>H2</th></tr></thead>",
                "<tr><td>c1<br></td><td>c2<br></td></tr></table>"
            )
        );
        assert!(!state.table().open);
    }

    #[test]
    fn test_table_keeps_explicit_cellspacing() {
        assert_eq!(run_one("{| cellspacing=4").line, "<table cellspacing=4>");
    }

    #[test]
    fn test_table_cell_opens_missing_row() {
        let mut state = ParserState::new(None);
        let passes = run(&["{|", "| a", "| b"], &mut state, RenderOptions::default());
        assert_eq!(passes[1].line, "<tr><td>a<br>");
        assert_eq!(passes[2].line, "</td><td>b<br>");
    }

    #[test]
    fn test_header_with_toc_and_back_link() {
        let mut state = ParserState::new(Some("doc".to_owned()));
        let pass = run(&["== Intro =="], &mut state, RenderOptions::default()).remove(0);
        assert_eq!(
            pass.line,
            "\n<h2 id=\"doc_toc_1\">Intro&nbsp;<a href=\"#top\">&uArr;&nbsp;top</a></h2>\n"
        );
        assert_eq!(pass.control, Control::Stop);
        assert_eq!(state.toc().entries().len(), 1);
    }

    #[test]
    fn test_header_embedded_has_no_back_link() {
        let mut state = ParserState::new(None);
        let options = RenderOptions::default().with_embedded(true);
        let pass = run(&["=== Part ==="], &mut state, options).remove(0);
        assert_eq!(pass.line, "\n<h3>Part</h3>\n");
    }

    #[test]
    fn test_header_disabled_renders_text() {
        let mut state = ParserState::new(None);
        let options = RenderOptions::default().with_headers(false);
        let pass = run(&["== Intro =="], &mut state, options).remove(0);
        assert_eq!(pass.line, "== Intro ==\n");
        assert_eq!(pass.control, Control::Continue);
        assert!(pass.has_fired(BlockKind::Header));
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(run_one("----").line, "<hr />");
        assert!(run_one("-----").fired.is_empty());
    }

    #[test]
    fn test_close_unaffirmed() {
        let mut state = ParserState::new(None);
        let env = env(RenderOptions::default());
        apply_block_rules(" code", &mut state, &env);
        let pass = apply_block_rules("* item", &mut state, &env);
        assert_eq!(close_unaffirmed(&mut state, &pass), "</pre>\n");

        let pass = apply_block_rules("; term", &mut state, &env);
        assert_eq!(close_unaffirmed(&mut state, &pass), "\n</ul>\n");

        let pass = apply_block_rules("text", &mut state, &env);
        assert_eq!(close_unaffirmed(&mut state, &pass), "</dl>\n");
        assert_eq!(close_unaffirmed(&mut state, &pass), "");
    }
}
