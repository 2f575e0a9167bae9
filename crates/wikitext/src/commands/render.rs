//! `wikitext render` command implementation.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use wikitext_config::{CliSettings, Config};

use super::{build_renderer, page_name, read_input, render_options};
use crate::error::CliError;
use crate::output::Output;

/// Output format for rendered documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum Format {
    /// HTML fragment.
    #[default]
    Html,
    /// JSON object with HTML, links, categories and TOC entries.
    Json,
}

/// Arguments for the render command.
#[derive(Args)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct RenderArgs {
    /// Markup file to render (default: read stdin).
    file: Option<PathBuf>,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Collect headings into a table of contents (overrides config).
    #[arg(long)]
    toc: bool,

    /// Base id for heading anchors (overrides config).
    #[arg(long)]
    toc_id: Option<String>,

    /// Omit back-to-top links after headings.
    #[arg(long)]
    embedded: bool,

    /// Echo header lines instead of rendering headings.
    #[arg(long)]
    no_headers: bool,

    /// Leave `{{VARIABLE}}` references untouched.
    #[arg(long)]
    ignore_vars: bool,

    /// Leave the `{{TOC}}` placeholder untouched.
    #[arg(long)]
    ignore_toc: bool,

    /// Value of `{{PAGENAME}}` (default: input file stem).
    #[arg(long)]
    page_name: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, input, rendering or output fails.
    pub(crate) fn execute(self, config_path: Option<&Path>) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            headers: self.no_headers.then_some(false),
            embedded: self.embedded.then_some(true),
            ignore_vars: self.ignore_vars.then_some(true),
            ignore_toc: self.ignore_toc.then_some(true),
            toc_enabled: self.toc.then_some(true),
            toc_base_id: self.toc_id,
        };
        let config = Config::load(config_path, Some(&cli_settings))?;

        let text = read_input(self.file.as_deref())?;
        let page_name = page_name(self.page_name, self.file.as_deref());
        let rendered = render(&config, text, page_name, self.format)?;

        match self.output {
            Some(path) => {
                std::fs::write(&path, rendered)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

/// Render `text` with `config` into the requested format.
fn render(
    config: &Config,
    text: String,
    page_name: String,
    format: Format,
) -> Result<String, CliError> {
    let renderer = build_renderer(config, page_name);
    let mut doc = renderer.document(text).with_options(render_options(config));
    if config.toc.enabled {
        doc = doc.with_toc(config.toc.base_id.as_str());
    }

    let result = doc.render()?;
    tracing::debug!(
        bytes = result.html.len(),
        links = result.internal_links.len(),
        categories = result.categories.len(),
        headings = result.toc.len(),
        "Rendered document"
    );

    match format {
        Format::Html => Ok(result.html.clone()),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(result)?;
            json.push('\n');
            Ok(json)
        }
    }
}
