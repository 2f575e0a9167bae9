//! Built-in issue lookups.

use std::sync::LazyLock;

use regex::Regex;

use crate::collaborator::{Issue, IssueLookup};
use crate::error::CollaboratorError;

static REFERENCE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#?(?:([A-Za-z0-9]+)-)?(\d+)\s*$").unwrap());

/// Lookup that never finds anything; every reference renders as text.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIssues;

impl IssueLookup for NoIssues {
    fn find_issue(&self, _reference: &str) -> Result<Option<Issue>, CollaboratorError> {
        Ok(None)
    }
}

/// In-memory issue table.
///
/// References are matched on their trailing id: `bug #12` looks up number 12
/// in the default project, `issue CORE-12` number 12 in project `CORE`.
#[derive(Clone, Debug, Default)]
pub struct IssueTable {
    default_project: Option<String>,
    issues: Vec<Issue>,
}

impl IssueTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Project used for references without a project prefix.
    ///
    /// Without one, an unqualified reference matches the first issue with
    /// that number in any project.
    #[must_use]
    pub fn with_default_project(mut self, project: impl Into<String>) -> Self {
        self.default_project = Some(project.into());
        self
    }

    /// Add an issue.
    #[must_use]
    pub fn with_issue(mut self, issue: Issue) -> Self {
        self.issues.push(issue);
        self
    }

    /// Number of issues in the table.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl IssueLookup for IssueTable {
    fn find_issue(&self, reference: &str) -> Result<Option<Issue>, CollaboratorError> {
        let Some(caps) = REFERENCE_ID.captures(reference) else {
            return Ok(None);
        };
        let number: u64 = caps[2].parse()?;
        let project = caps
            .get(1)
            .map(|m| m.as_str())
            .or(self.default_project.as_deref());

        let found = self.issues.iter().find(|issue| {
            issue.number == number
                && project.is_none_or(|key| issue.project_key.eq_ignore_ascii_case(key))
        });
        Ok(found.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(project: &str, number: u64) -> Issue {
        Issue {
            project_key: project.to_owned(),
            number,
            formatted_number: format!("{project}-{number}"),
            title: format!("Issue {number}"),
            closed: false,
            deleted: false,
        }
    }

    #[test]
    fn test_no_issues() {
        assert_eq!(NoIssues.find_issue("bug #1").unwrap(), None);
    }

    #[test]
    fn test_unqualified_reference_uses_default_project() {
        let table = IssueTable::new()
            .with_default_project("CORE")
            .with_issue(issue("WEB", 12))
            .with_issue(issue("CORE", 12));
        let found = table.find_issue("bug #12").unwrap().unwrap();
        assert_eq!(found.project_key, "CORE");
    }

    #[test]
    fn test_unqualified_reference_without_default_matches_any_project() {
        let table = IssueTable::new().with_issue(issue("WEB", 3));
        assert_eq!(table.find_issue("ticket 3").unwrap().unwrap().project_key, "WEB");
    }

    #[test]
    fn test_qualified_reference() {
        let table = IssueTable::new()
            .with_issue(issue("CORE", 7))
            .with_issue(issue("WEB", 7));
        let found = table.find_issue("issue web-7").unwrap().unwrap();
        assert_eq!(found.formatted_number, "WEB-7");
    }

    #[test]
    fn test_unknown_reference() {
        let table = IssueTable::new().with_issue(issue("CORE", 1));
        assert_eq!(table.find_issue("bug #2").unwrap(), None);
        assert_eq!(table.find_issue("bug #OTHER-1").unwrap(), None);
    }
}
