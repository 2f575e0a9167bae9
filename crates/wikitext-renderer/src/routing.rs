//! URL-template router.

use crate::collaborator::{Issue, Router};
use crate::error::CollaboratorError;

/// Router that fills URL templates.
///
/// Placeholders: `{name}` (article), `{project}` and `{issue}` (issue page),
/// `{path}` (internal routes and images).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateRouter {
    article: String,
    issue: String,
    internal: String,
    image: String,
}

impl Default for TemplateRouter {
    fn default() -> Self {
        Self {
            article: "/wiki/{name}".to_owned(),
            issue: "/{project}/issues/{issue}".to_owned(),
            internal: "/{path}".to_owned(),
            image: "/images/{path}".to_owned(),
        }
    }
}

impl TemplateRouter {
    /// Router with the default templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the article URL template.
    #[must_use]
    pub fn with_article(mut self, template: impl Into<String>) -> Self {
        self.article = template.into();
        self
    }

    /// Set the issue URL template.
    #[must_use]
    pub fn with_issue(mut self, template: impl Into<String>) -> Self {
        self.issue = template.into();
        self
    }

    /// Set the internal route URL template.
    #[must_use]
    pub fn with_internal(mut self, template: impl Into<String>) -> Self {
        self.internal = template.into();
        self
    }

    /// Set the image URL template.
    #[must_use]
    pub fn with_image(mut self, template: impl Into<String>) -> Self {
        self.image = template.into();
        self
    }
}

impl Router for TemplateRouter {
    fn article_url(&self, name: &str) -> Result<String, CollaboratorError> {
        Ok(self.article.replace("{name}", name))
    }

    fn issue_url(&self, issue: &Issue) -> Result<String, CollaboratorError> {
        Ok(self
            .issue
            .replace("{project}", &issue.project_key.to_lowercase())
            .replace("{issue}", &issue.number.to_string()))
    }

    fn internal_url(&self, path: &str) -> Result<String, CollaboratorError> {
        Ok(self.internal.replace("{path}", path.trim_start_matches('/')))
    }

    fn image_url(&self, path: &str) -> Result<String, CollaboratorError> {
        Ok(self.image.replace("{path}", path.trim_start_matches('/')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates() {
        let router = TemplateRouter::new();
        assert_eq!(router.article_url("Main_page").unwrap(), "/wiki/Main_page");
        assert_eq!(router.internal_url("/dashboard").unwrap(), "/dashboard");
        assert_eq!(router.image_url("smileys/2.png").unwrap(), "/images/smileys/2.png");
    }

    #[test]
    fn test_issue_url() {
        let router = TemplateRouter::new().with_issue("https://bugs.example/{project}/{issue}");
        let issue = Issue {
            project_key: "CORE".to_owned(),
            number: 12,
            formatted_number: "CORE-12".to_owned(),
            title: String::new(),
            closed: false,
            deleted: false,
        };
        assert_eq!(
            router.issue_url(&issue).unwrap(),
            "https://bugs.example/core/12"
        );
    }

    #[test]
    fn test_custom_article_template() {
        let router = TemplateRouter::new().with_article("/docs/{name}.html");
        assert_eq!(router.article_url("Setup").unwrap(), "/docs/Setup.html");
    }
}
