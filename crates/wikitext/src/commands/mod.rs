//! CLI command implementations.

pub(crate) mod links;
pub(crate) mod render;

use std::io::Read;
use std::path::Path;

use wikitext_config::{Config, Numbering};
use wikitext_renderer::{
    Issue, IssueTable, NumberingMode, RenderOptions, RenderSettings, TemplateRouter, WikiRenderer,
};

use crate::error::CliError;

pub(crate) use links::LinksArgs;
pub(crate) use render::RenderArgs;

/// Read markup from `path`, or from stdin when absent.
fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Page name for `{{PAGENAME}}`: explicit value, else the input file stem.
fn page_name(explicit: Option<String>, file: Option<&Path>) -> String {
    explicit
        .or_else(|| {
            file.and_then(Path::file_stem)
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_default()
}

/// Renderer configured from `config`.
fn build_renderer(config: &Config, page_name: String) -> WikiRenderer {
    let settings = RenderSettings {
        site_name: config.site.name.clone(),
        site_tagline: config.site.tagline.clone(),
        page_name,
        internal_namespace: config.parser.internal_namespace.clone(),
        top_label: config.parser.top_label.clone(),
        default_language: config.highlight.default_language.clone(),
        default_numbering: numbering_mode(config.highlight.default_numbering),
        default_interval: config.highlight.default_interval,
    };

    let router = TemplateRouter::new()
        .with_article(&config.routes.article)
        .with_issue(&config.routes.issue)
        .with_internal(&config.routes.internal)
        .with_image(&config.routes.image);

    let issues = config.issues.iter().fold(IssueTable::new(), |table, entry| {
        table.with_issue(Issue {
            project_key: entry.project.clone(),
            number: entry.number,
            formatted_number: format!("{}-{}", entry.project, entry.number),
            title: entry.title.clone(),
            closed: entry.closed,
            deleted: entry.deleted,
        })
    });

    WikiRenderer::new()
        .with_settings(settings)
        .with_router(router)
        .with_issue_lookup(issues)
}

/// Per-document options from the `[parser]` section.
fn render_options(config: &Config) -> RenderOptions {
    RenderOptions::default()
        .with_headers(config.parser.headers)
        .with_embedded(config.parser.embedded)
        .with_ignore_vars(config.parser.ignore_vars)
        .with_ignore_toc(config.parser.ignore_toc)
}

fn numbering_mode(numbering: Numbering) -> NumberingMode {
    match numbering {
        Numbering::None => NumberingMode::None,
        Numbering::Normal => NumberingMode::Normal,
        Numbering::Fancy => NumberingMode::Fancy,
    }
}
