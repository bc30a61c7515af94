//! Locator candidate model

use serde::{Deserialize, Serialize};

use holdfast_core_types::ElementHandle;

/// Selection strategy for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocatorKind {
    /// Raw CSS selector
    Css,

    /// Single attribute equality, compiled to an attribute selector
    Attr,

    /// ARIA role narrowed by visible text
    RoleText,
}

impl LocatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorKind::Css => "css",
            LocatorKind::Attr => "attr",
            LocatorKind::RoleText => "role-text",
        }
    }
}

/// One candidate selector for a logical element. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub kind: LocatorKind,
    /// Raw selector text sent to the session's query engine.
    pub query: String,
    /// Visible-text filter applied after the query (role-text only).
    pub text_filter: Option<String>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::Css,
            query: selector.into(),
            text_filter: None,
        }
    }

    pub fn attr(name: &str, value: &str) -> Self {
        Self {
            kind: LocatorKind::Attr,
            query: format!("[{name}='{value}']"),
            text_filter: None,
        }
    }

    pub fn role_text(role: &str, text: impl Into<String>) -> Self {
        Self {
            kind: LocatorKind::RoleText,
            query: format!("[role='{role}']"),
            text_filter: Some(text.into()),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.text_filter {
            Some(text) => write!(f, "{}:{} ~ \"{}\"", self.kind.name(), self.query, text),
            None => write!(f, "{}:{}", self.kind.name(), self.query),
        }
    }
}

/// Ordered candidates for one logical element.
///
/// Order encodes priority: most specific and stable selectors first.
/// Duplicates are harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorSet {
    /// Human label for diagnostics ("username field").
    pub label: String,
    pub candidates: Vec<Locator>,
}

impl LocatorSet {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            candidates: Vec::new(),
        }
    }

    pub fn with(mut self, candidate: Locator) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn single(label: impl Into<String>, candidate: Locator) -> Self {
        Self::new(label).with(candidate)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Successful resolution: the winning handle and which candidate matched.
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    pub handle: ElementHandle,
    /// Index into the set's candidate list.
    pub candidate: usize,
}

/// Outcome of walking a locator set. `NotFound` is an expected value on
/// optional-element paths and is never raised as an error here.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(ResolvedElement),
    NotFound,
}

impl Resolution {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn handle(&self) -> Option<&ElementHandle> {
        match self {
            Resolution::Found(resolved) => Some(&resolved.handle),
            Resolution::NotFound => None,
        }
    }
}
