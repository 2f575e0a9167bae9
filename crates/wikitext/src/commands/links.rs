//! `wikitext links` command implementation.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Args;
use wikitext_config::Config;
use wikitext_renderer::RenderResult;

use super::{build_renderer, page_name, read_input, render_options};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the links command.
#[derive(Args)]
pub(crate) struct LinksArgs {
    /// Markup file to scan (default: read stdin).
    file: Option<PathBuf>,

    /// Value of `{{PAGENAME}}` (default: input file stem).
    #[arg(long)]
    page_name: Option<String>,
}

impl LinksArgs {
    /// Execute the links command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, input or rendering fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(config_path, None)?;

        let text = read_input(self.file.as_deref())?;
        let renderer = build_renderer(&config, page_name(self.page_name, self.file.as_deref()));
        let doc = renderer.document(text).with_options(render_options(&config));
        let result = doc.render()?;

        let mut stdout = std::io::stdout().lock();
        output.highlight("Internal links");
        stdout.write_all(format_links(result).as_bytes())?;
        stdout.flush()?;
        output.highlight("Categories");
        stdout.write_all(format_categories(result).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

/// One `count<TAB>article` line per linked article.
fn format_links(result: &RenderResult) -> String {
    result
        .internal_links
        .iter()
        .fold(String::new(), |mut out, (name, count)| {
            writeln!(out, "{count}\t{name}").unwrap();
            out
        })
}

/// One category name per line.
fn format_categories(result: &RenderResult) -> String {
    result
        .categories
        .iter()
        .fold(String::new(), |mut out, category| {
            writeln!(out, "{category}").unwrap();
            out
        })
}
