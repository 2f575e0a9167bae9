//! Registry of caller-supplied inline rules.
//!
//! Registered rules run after the built-in inline rules, in registration
//! order, on every line that reaches the inline pass. Registration is
//! append-only and may happen from any thread; each render works on a
//! snapshot taken when it starts.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use regex::{Captures, Regex};

use crate::state::{Control, ParserState};

/// Replacement produced by a custom rule for one match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleOutput {
    /// Text replacing the match.
    pub text: String,
    /// Flow control after this rule; `Stop` and `StopAll` both end the inline pass.
    pub control: Control,
}

impl RuleOutput {
    /// Replace the match and continue with the next rule.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            control: Control::Continue,
        }
    }

    /// Replace the match and skip the remaining inline rules for this line.
    pub fn stop(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            control: Control::Stop,
        }
    }
}

/// Handler invoked for every match of a custom rule.
pub type RuleHandler = dyn Fn(&Captures<'_>, &mut ParserState) -> RuleOutput + Send + Sync;

/// A pattern and the handler applied to each of its matches.
pub struct CustomRule {
    pattern: Regex,
    handler: Box<RuleHandler>,
}

impl CustomRule {
    /// Pattern matched against the line.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Replace all matches in `line`, returning the new line and the strongest
    /// control requested by any match.
    pub(crate) fn apply(&self, line: &str, state: &mut ParserState) -> (String, Control) {
        let mut control = Control::Continue;
        let replaced = self.pattern.replace_all(line, |caps: &Captures<'_>| {
            let output = (self.handler)(caps, state);
            if output.control != Control::Continue {
                control = Control::Stop;
            }
            output.text
        });
        (replaced.into_owned(), control)
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomRule")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Shared, append-only list of custom inline rules.
///
/// Cloning yields another handle to the same list.
#[derive(Clone, Debug, Default)]
pub struct RuleRegistry {
    rules: Arc<RwLock<Vec<Arc<CustomRule>>>>,
}

impl RuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. It applies to every render started afterwards.
    ///
    /// # Example
    ///
    /// ```
    /// use regex::Regex;
    /// use wikitext_renderer::{RuleOutput, RuleRegistry};
    ///
    /// let registry = RuleRegistry::new();
    /// registry.register(Regex::new(r"\bTODO\b").unwrap(), |_, _| {
    ///     RuleOutput::text(r#"<span class="todo">TODO</span>"#)
    /// });
    /// assert_eq!(registry.len(), 1);
    /// ```
    pub fn register<F>(&self, pattern: Regex, handler: F)
    where
        F: Fn(&Captures<'_>, &mut ParserState) -> RuleOutput + Send + Sync + 'static,
    {
        let rule = Arc::new(CustomRule {
            pattern,
            handler: Box::new(handler),
        });
        self.rules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rule);
    }

    /// Rules registered so far, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<CustomRule>> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no rule has been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
