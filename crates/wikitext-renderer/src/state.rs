//! Mutable parser state scoped to one document render.
//!
//! Tracks block structures that span lines (lists, definition lists,
//! preformatted text, tables), open emphasis levels, and the side outputs
//! collected while rendering (link occurrences, categories, TOC entries).

use std::collections::{BTreeMap, BTreeSet};

use crate::emphasis::Emphasis;
use crate::stash::Placeholder;
use crate::toc::{TocBuilder, TocEntry};

/// Flow control requested by a rule after it fired.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Control {
    /// Keep evaluating the remaining rules.
    #[default]
    Continue,
    /// Skip the remaining rules of the current pass.
    Stop,
    /// Skip the remaining block rules and the whole inline pass.
    StopAll,
}

/// List flavour selected by a marker character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// `*` marker, `<ul>`.
    Unordered,
    /// `#` marker, `<ol>`.
    Ordered,
}

impl ListKind {
    /// List kind for a marker character; anything but `#` is unordered.
    pub fn from_marker(marker: char) -> Self {
        if marker == '#' {
            Self::Ordered
        } else {
            Self::Unordered
        }
    }

    /// HTML tag name.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// Stack of open list levels, outermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListStack {
    levels: Vec<ListKind>,
}

impl ListStack {
    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Kinds of the open levels, outermost first.
    pub fn levels(&self) -> &[ListKind] {
        &self.levels
    }

    /// Move to `target` depth, opening new levels as `kind`, and return the tags.
    pub fn adjust(&mut self, target: usize, kind: ListKind) -> String {
        let mut out = String::new();
        while self.levels.len() != target {
            if self.levels.len() > target {
                if let Some(closed) = self.levels.pop() {
                    out.push_str(&format!("\n</{}>\n", closed.tag()));
                }
            } else {
                self.levels.push(kind);
                out.push_str(&format!("\n<{}>\n", kind.tag()));
            }
        }
        out
    }

    /// Close every open level, innermost first.
    pub fn close_all(&mut self) -> String {
        self.adjust(0, ListKind::Unordered)
    }
}

/// Open table structure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct TableState {
    /// Inside `{| … |}`.
    pub open: bool,
    /// A `<tr>` is open.
    pub row_open: bool,
    /// A `<td>` is open.
    pub cell_open: bool,
}

impl TableState {
    /// Close a pending cell and its row.
    pub fn close_row(&mut self) -> &'static str {
        let out = match (self.cell_open, self.row_open) {
            (true, _) => "</td></tr>",
            (false, true) => "</tr>",
            (false, false) => "",
        };
        self.cell_open = false;
        self.row_open = false;
        out
    }
}

/// State shared by all rules while one document renders.
#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct ParserState {
    emphasis: Emphasis,
    lists: ListStack,
    definition_list: bool,
    preformat: bool,
    table: TableState,
    suppress_blank_line: bool,
    link_number: usize,
    internal_links: BTreeMap<String, usize>,
    categories: BTreeSet<String>,
    toc: TocBuilder,
    consumed: BTreeSet<Placeholder>,
}

impl ParserState {
    /// Fresh state. `toc_base_id` enables heading collection.
    pub fn new(toc_base_id: Option<String>) -> Self {
        Self {
            emphasis: Emphasis::default(),
            lists: ListStack::default(),
            definition_list: false,
            preformat: false,
            table: TableState::default(),
            suppress_blank_line: false,
            link_number: 0,
            internal_links: BTreeMap::new(),
            categories: BTreeSet::new(),
            toc: TocBuilder::new(toc_base_id),
            consumed: BTreeSet::new(),
        }
    }

    /// Emphasis levels.
    pub fn emphasis(&self) -> &Emphasis {
        &self.emphasis
    }

    /// Mutable emphasis levels.
    pub fn emphasis_mut(&mut self) -> &mut Emphasis {
        &mut self.emphasis
    }

    /// Open list levels.
    pub fn lists(&self) -> &ListStack {
        &self.lists
    }

    /// Mutable list levels.
    pub fn lists_mut(&mut self) -> &mut ListStack {
        &mut self.lists
    }

    /// Whether a `<dl>` is open.
    pub fn in_definition_list(&self) -> bool {
        self.definition_list
    }

    /// Mark the definition list open or closed.
    pub fn set_definition_list(&mut self, open: bool) {
        self.definition_list = open;
    }

    /// Whether a `<pre>` block is open.
    pub fn in_preformat(&self) -> bool {
        self.preformat
    }

    /// Mark the preformatted block open or closed.
    pub fn set_preformat(&mut self, open: bool) {
        self.preformat = open;
    }

    /// Table structure.
    pub fn table(&self) -> &TableState {
        &self.table
    }

    /// Mutable table structure.
    pub fn table_mut(&mut self) -> &mut TableState {
        &mut self.table
    }

    /// Whether the next blank line should not emit a break.
    pub fn suppress_blank_line(&self) -> bool {
        self.suppress_blank_line
    }

    /// Set whether the next blank line should emit a break.
    pub fn set_suppress_blank_line(&mut self, suppress: bool) {
        self.suppress_blank_line = suppress;
    }

    /// Next number for an unlabeled external link, starting at 1.
    pub fn next_link_number(&mut self) -> usize {
        self.link_number += 1;
        self.link_number
    }

    /// Count one occurrence of a link to the canonical article `name`.
    pub fn record_internal_link(&mut self, name: &str) {
        *self.internal_links.entry(name.to_owned()).or_default() += 1;
    }

    /// Link occurrence counts collected so far.
    pub fn internal_links(&self) -> &BTreeMap<String, usize> {
        &self.internal_links
    }

    /// Tag the document with a category.
    pub fn add_category(&mut self, name: impl Into<String>) {
        self.categories.insert(name.into());
    }

    /// Categories collected so far.
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Table of contents collector.
    pub fn toc(&self) -> &TocBuilder {
        &self.toc
    }

    /// Mutable table of contents collector.
    pub fn toc_mut(&mut self) -> &mut TocBuilder {
        &mut self.toc
    }

    /// Record that a rule deliberately dropped a stashed region.
    pub(crate) fn consume_placeholder(&mut self, placeholder: Placeholder) {
        self.consumed.insert(placeholder);
    }

    /// Stashed regions dropped by rules; restoration does not expect them back.
    pub(crate) fn consumed_placeholders(&self) -> &BTreeSet<Placeholder> {
        &self.consumed
    }

    /// Close everything still open at the end of the document.
    pub fn close_all(&mut self) -> String {
        let mut out = self.emphasis.flush();
        if self.preformat {
            self.preformat = false;
            out.push_str("</pre>\n");
        }
        if self.definition_list {
            self.definition_list = false;
            out.push_str("</dl>\n");
        }
        out.push_str(&self.lists.close_all());
        if self.table.open {
            out.push_str(self.table.close_row());
            self.table.open = false;
            out.push_str("</table>");
        }
        out
    }

    /// Consume the state, returning link occurrences, categories and TOC entries.
    pub(crate) fn into_outputs(
        mut self,
    ) -> (BTreeMap<String, usize>, BTreeSet<String>, Vec<TocEntry>) {
        let toc = self.toc.take_entries();
        (self.internal_links, self.categories, toc)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_list_stack_nesting() {
        let mut lists = ListStack::default();
        assert_eq!(lists.adjust(1, ListKind::Unordered), "\n<ul>\n");
        assert_eq!(lists.adjust(2, ListKind::Ordered), "\n<ol>\n");
        assert_eq!(lists.levels(), &[ListKind::Unordered, ListKind::Ordered]);
        assert_eq!(lists.adjust(1, ListKind::Unordered), "\n</ol>\n");
        assert_eq!(lists.close_all(), "\n</ul>\n");
        assert_eq!(lists.depth(), 0);
    }

    #[test]
    fn test_list_stack_deep_jump_uses_one_kind() {
        let mut lists = ListStack::default();
        assert_eq!(lists.adjust(2, ListKind::Ordered), "\n<ol>\n\n<ol>\n");
    }

    #[test]
    fn test_list_kind_from_marker() {
        assert_eq!(ListKind::from_marker('#'), ListKind::Ordered);
        assert_eq!(ListKind::from_marker('*'), ListKind::Unordered);
    }

    #[test]
    fn test_table_close_row() {
        let mut table = TableState {
            open: true,
            row_open: true,
            cell_open: true,
        };
        assert_eq!(table.close_row(), "</td></tr>");
        assert_eq!(table.close_row(), "");
        table.row_open = true;
        assert_eq!(table.close_row(), "</tr>");
    }

    #[test]
    fn test_internal_link_counts() {
        let mut state = ParserState::new(None);
        state.record_internal_link("Main_page");
        state.record_internal_link("Main_page");
        state.record_internal_link("Other");
        assert_eq!(state.internal_links().get("Main_page"), Some(&2));
        assert_eq!(state.internal_links().get("Other"), Some(&1));
    }

    #[test]
    fn test_link_numbers_increment() {
        let mut state = ParserState::new(None);
        assert_eq!(state.next_link_number(), 1);
        assert_eq!(state.next_link_number(), 2);
    }

    #[test]
    fn test_close_all() {
        let mut state = ParserState::new(None);
        state.emphasis_mut().toggle(3);
        state.set_definition_list(true);
        state.lists_mut().adjust(1, ListKind::Unordered);
        state.table_mut().open = true;
        state.table_mut().row_open = true;
        state.table_mut().cell_open = true;
        assert_eq!(
            state.close_all(),
            "</b></dl>\n\n</ul>\n</td></tr></table>"
        );
        assert_eq!(state.close_all(), "");
    }
}
