//! Configuration management for the wikitext renderer.
//!
//! Parses `wikitext.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.name`
//! - `site.tagline`
//! - `toc.base_id`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "wikitext.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override `parser.headers`.
    pub headers: Option<bool>,
    /// Override `parser.embedded`.
    pub embedded: Option<bool>,
    /// Override `parser.ignore_vars`.
    pub ignore_vars: Option<bool>,
    /// Override `parser.ignore_toc`.
    pub ignore_toc: Option<bool>,
    /// Override `toc.enabled`.
    pub toc_enabled: Option<bool>,
    /// Override `toc.base_id`.
    pub toc_base_id: Option<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site identity used by variables.
    pub site: SiteConfig,
    /// Parser flags.
    pub parser: ParserConfig,
    /// Table of contents generation.
    pub toc: TocConfig,
    /// Code block defaults.
    pub highlight: HighlightConfig,
    /// URL templates.
    pub routes: RoutesConfig,
    /// Static issue table.
    pub issues: Vec<IssueConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Site configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site name (`{{SITENAME}}`).
    pub name: String,
    /// Site tagline (`{{SITETAGLINE}}`).
    pub tagline: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Wiki".to_owned(),
            tagline: String::new(),
        }
    }
}

/// Parser configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ParserConfig {
    /// Render section headers (false echoes header lines as text).
    pub headers: bool,
    /// Omit the back-to-top link after headers.
    pub embedded: bool,
    /// Leave `{{VARIABLE}}` references untouched.
    pub ignore_vars: bool,
    /// Leave the `{{TOC}}` placeholder unexpanded.
    pub ignore_toc: bool,
    /// Namespace reserved for application routes (`[[App:/path|label]]`).
    pub internal_namespace: String,
    /// Label of the back-to-top link.
    pub top_label: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            headers: true,
            embedded: false,
            ignore_vars: false,
            ignore_toc: false,
            internal_namespace: "App".to_owned(),
            top_label: "top".to_owned(),
        }
    }
}

/// Table of contents configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TocConfig {
    /// Whether heading ids and TOC entries are generated.
    pub enabled: bool,
    /// Prefix of generated heading ids.
    pub base_id: String,
}

impl Default for TocConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_id: "article".to_owned(),
        }
    }
}

/// Line numbering mode for code blocks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Numbering {
    /// No line numbers.
    #[default]
    None,
    /// Plain line numbers.
    Normal,
    /// Line numbers with every n-th line highlighted.
    Fancy,
}

/// Code highlighting configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Language used when a `<source>` block has no `lang` attribute.
    pub default_language: String,
    /// Numbering used when a `<source>` block has no `line` attribute.
    pub default_numbering: Numbering,
    /// Highlight interval used by fancy numbering.
    pub default_interval: u32,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            default_language: "text".to_owned(),
            default_numbering: Numbering::None,
            default_interval: 5,
        }
    }
}

/// URL templates.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Article URL, with `{name}`.
    pub article: String,
    /// Issue URL, with `{issue}` and optionally `{project}`.
    pub issue: String,
    /// Application route URL, with `{path}`.
    pub internal: String,
    /// Image URL, with `{path}`.
    pub image: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            article: "/wiki/{name}".to_owned(),
            issue: "/{project}/issues/{issue}".to_owned(),
            internal: "/{path}".to_owned(),
            image: "/images/{path}".to_owned(),
        }
    }
}

/// Issue entry of the static issue table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueConfig {
    /// Project key.
    pub project: String,
    /// Issue number within the project.
    pub number: u64,
    /// Issue title.
    pub title: String,
    /// Whether the issue is closed.
    #[serde(default)]
    pub closed: bool,
    /// Whether the issue is deleted.
    #[serde(default)]
    pub deleted: bool,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.name`").
        field: String,
        /// Error message (e.g., "${`SITE_NAME`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL template to contain `placeholder`.
fn require_placeholder(template: &str, placeholder: &str, field: &str) -> Result<(), ConfigError> {
    if !template.contains(placeholder) {
        return Err(ConfigError::Validation(format!(
            "{field} must contain {placeholder}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wikitext.toml` in current directory and parents,
    /// falling back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if parsing,
    /// expansion or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            tracing::debug!("No {CONFIG_FILENAME} found, using defaults");
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(headers) = settings.headers {
            self.parser.headers = headers;
        }
        if let Some(embedded) = settings.embedded {
            self.parser.embedded = embedded;
        }
        if let Some(ignore_vars) = settings.ignore_vars {
            self.parser.ignore_vars = ignore_vars;
        }
        if let Some(ignore_toc) = settings.ignore_toc {
            self.parser.ignore_toc = ignore_toc;
        }
        if let Some(enabled) = settings.toc_enabled {
            self.toc.enabled = enabled;
        }
        if let Some(base_id) = &settings.toc_base_id {
            self.toc.base_id.clone_from(base_id);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;
        config.warn_duplicate_issues();

        tracing::debug!(path = %path.display(), issues = config.issues.len(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_parser()?;
        self.validate_toc()?;
        self.validate_highlight()?;
        self.validate_routes()?;
        self.validate_issues()?;
        Ok(())
    }

    fn validate_parser(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.parser.internal_namespace, "parser.internal_namespace")
    }

    fn validate_toc(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.toc.base_id, "toc.base_id")
    }

    fn validate_highlight(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.highlight.default_language, "highlight.default_language")?;
        if self.highlight.default_interval == 0 {
            return Err(ConfigError::Validation(
                "highlight.default_interval must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_routes(&self) -> Result<(), ConfigError> {
        require_placeholder(&self.routes.article, "{name}", "routes.article")?;
        require_placeholder(&self.routes.issue, "{issue}", "routes.issue")?;
        require_placeholder(&self.routes.internal, "{path}", "routes.internal")?;
        require_placeholder(&self.routes.image, "{path}", "routes.image")?;
        Ok(())
    }

    fn validate_issues(&self) -> Result<(), ConfigError> {
        for issue in &self.issues {
            require_non_empty(&issue.project, "issues.project")?;
        }
        Ok(())
    }

    /// Later entries with the same project and number are never found.
    fn warn_duplicate_issues(&self) {
        for (index, issue) in self.issues.iter().enumerate() {
            let duplicate = self.issues[..index].iter().any(|earlier| {
                earlier.number == issue.number && earlier.project.eq_ignore_ascii_case(&issue.project)
            });
            if duplicate {
                tracing::warn!(
                    project = %issue.project,
                    number = issue.number,
                    "Duplicate issue entry is shadowed by an earlier one"
                );
            }
        }
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.name = expand::expand_env(&self.site.name, "site.name")?;
        self.site.tagline = expand::expand_env(&self.site.tagline, "site.tagline")?;
        self.toc.base_id = expand::expand_env(&self.toc.base_id, "toc.base_id")?;
        Ok(())
    }
}
