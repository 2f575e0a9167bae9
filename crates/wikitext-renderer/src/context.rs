//! Read-only environment shared by the rules of one render.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::collaborator::{IssueLookup, Router};
use crate::options::{RenderOptions, RenderSettings};
use crate::registry::CustomRule;
use crate::stash::Stash;

/// Everything a rule may consult besides the mutable [`ParserState`](crate::ParserState).
pub(crate) struct RenderEnv<'a> {
    /// Per-document flags.
    pub options: RenderOptions,
    /// Process-wide settings.
    pub settings: &'a RenderSettings,
    /// Issue reference lookup.
    pub issues: &'a dyn IssueLookup,
    /// URL generation.
    pub router: &'a dyn Router,
    /// Time used by date variables.
    pub now: NaiveDateTime,
    /// Custom inline rules snapshotted when the render started.
    pub custom_rules: Vec<Arc<CustomRule>>,
    /// Protected regions cut out of this document.
    pub stash: &'a Stash,
}
