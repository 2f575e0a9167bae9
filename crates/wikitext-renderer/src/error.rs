//! Error types for wiki markup rendering.

use std::fmt;

/// Error reported by an external collaborator (highlighter, router, TOC template).
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Kind of protected region pulled out of the markup before line parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StashKind {
    /// `<nowiki>` literal span.
    Nowiki,
    /// `<source>` code block.
    Code,
}

impl fmt::Display for StashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nowiki => f.write_str("nowiki"),
            Self::Code => f.write_str("code"),
        }
    }
}

/// Error during document rendering.
///
/// Malformed markup never produces an error; these variants cover broken
/// internal invariants and failures propagated from collaborators.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// Restoration found placeholders that do not match the stashed regions.
    #[error("{kind} stash mismatch: {stashed} stashed, {placeholders} placeholders in output")]
    StashMismatch {
        /// Which stash was being drained.
        kind: StashKind,
        /// Number of regions expected back in the output.
        stashed: usize,
        /// Number of placeholder tokens found in the rendered output.
        placeholders: usize,
    },

    /// Syntax highlighter failed.
    #[error("syntax highlighting failed: {0}")]
    Highlight(#[source] CollaboratorError),

    /// URL generation failed.
    #[error("route generation failed: {0}")]
    Routing(#[source] CollaboratorError),

    /// Table of contents template failed.
    #[error("table of contents rendering failed: {0}")]
    Toc(#[source] CollaboratorError),
}
