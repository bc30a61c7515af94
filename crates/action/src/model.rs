//! Action request and report model

use serde::{Deserialize, Serialize};

use holdfast_locator::LocatorSet;

/// Kind of user action to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Click,
    Type,
    Select,
    /// Click-class action with the keyboard fallback tier enabled.
    Submit,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Select => "select",
            ActionKind::Submit => "submit",
        }
    }

    /// Submit-class actions may fall through to the keyboard tier.
    pub fn allows_keyboard_fallback(&self) -> bool {
        matches!(self, ActionKind::Submit)
    }

    pub fn takes_value(&self) -> bool {
        matches!(self, ActionKind::Type | ActionKind::Select)
    }
}

/// One requested action against a logical element.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub target: LocatorSet,
    pub value: Option<String>,
    /// Password-class field: verification checks non-emptiness only and
    /// the value never reaches logs.
    pub masked: bool,
}

impl ActionRequest {
    pub fn click(target: LocatorSet) -> Self {
        Self {
            kind: ActionKind::Click,
            target,
            value: None,
            masked: false,
        }
    }

    pub fn submit(target: LocatorSet) -> Self {
        Self {
            kind: ActionKind::Submit,
            target,
            value: None,
            masked: false,
        }
    }

    pub fn type_text(target: LocatorSet, value: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Type,
            target,
            value: Some(value.into()),
            masked: false,
        }
    }

    pub fn type_masked(target: LocatorSet, value: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Type,
            target,
            value: Some(value.into()),
            masked: true,
        }
    }

    pub fn select(target: LocatorSet, value: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Select,
            target,
            value: Some(value.into()),
            masked: false,
        }
    }

    /// Value as it may appear in logs.
    pub fn loggable_value(&self) -> &str {
        if self.masked {
            "***"
        } else {
            self.value.as_deref().unwrap_or("")
        }
    }
}

/// Strategy tier used for one interaction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// Direct native interaction (hit-tested).
    Native,
    /// Scripted interaction, bypassing hit-testing.
    Scripted,
    /// Enter key to the focused field (submit-class only).
    Keyboard,
}

impl Tier {
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Native => "native",
            Tier::Scripted => "scripted",
            Tier::Keyboard => "keyboard",
        }
    }
}

/// Bookkeeping for one tier attempt. Diagnostic only; discarded with the
/// report at the end of the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionAttempt {
    pub tier: Tier,
    /// 1-based retry round this attempt belongs to.
    pub round: u32,
    pub ok: bool,
    pub reason: Option<String>,
}

/// Outcome of a completed (successful) action call.
#[derive(Debug, Clone)]
pub struct ActionReport {
    pub kind: ActionKind,
    /// Logical element label, for diagnosis without reading internals.
    pub label: String,
    pub attempts: Vec<ActionAttempt>,
    /// Whether a post-condition was checked and held (always true for
    /// value-bearing actions; true for clicks only when a custom
    /// post-condition was supplied).
    pub verified: bool,
}

impl ActionReport {
    /// Tiers that were exercised, in order, for failure messages.
    pub fn tiers_attempted(attempts: &[ActionAttempt]) -> String {
        let names: Vec<&str> = attempts.iter().map(|a| a.tier.name()).collect();
        names.join(", ")
    }
}
