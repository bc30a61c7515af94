//! Session port: the narrow browser interface the engine consumes

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SessionError;

/// Opaque reference to a resolved element within the current page.
///
/// Handles are only valid for the session that produced them and may go
/// stale after navigation or DOM surgery.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Keys the engine sends to the active element.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Enter,
}

/// Browser session boundary.
///
/// Implemented by the surrounding harness (WebDriver, CDP, a fake in
/// tests); the engine never creates or tears down the session. Element
/// operations come in native and scripted flavors because the interaction
/// layer (hit-testing) can reject input that the DOM itself accepts.
#[async_trait]
pub trait SessionPort: Send + Sync {
    /// Current page URL.
    async fn current_url(&self) -> Result<String, SessionError>;

    /// Current document title.
    async fn title(&self) -> Result<String, SessionError>;

    /// Query elements by raw selector; empty result is not an error.
    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, SessionError>;

    /// Evaluate a script expression in the page, returning its value.
    async fn run_script(&self, script: &str) -> Result<Value, SessionError>;

    /// Navigate the session to a URL.
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// Native (hit-tested) click.
    async fn click(&self, el: &ElementHandle) -> Result<(), SessionError>;

    /// Scripted click, bypassing hit-testing.
    async fn click_js(&self, el: &ElementHandle) -> Result<(), SessionError>;

    /// Clear an input's current value.
    async fn clear(&self, el: &ElementHandle) -> Result<(), SessionError>;

    /// Native key-by-key typing into an element.
    async fn type_text(&self, el: &ElementHandle, text: &str) -> Result<(), SessionError>;

    /// Direct scripted value assignment.
    async fn set_value_js(&self, el: &ElementHandle, value: &str) -> Result<(), SessionError>;

    /// Native select-by-value on a dropdown.
    async fn select_value(&self, el: &ElementHandle, value: &str) -> Result<(), SessionError>;

    /// Current value of an input element.
    async fn value(&self, el: &ElementHandle) -> Result<String, SessionError>;

    /// Rendered text content.
    async fn text(&self, el: &ElementHandle) -> Result<String, SessionError>;

    /// Attribute lookup; `None` when the attribute is absent.
    async fn attribute(
        &self,
        el: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SessionError>;

    async fn is_displayed(&self, el: &ElementHandle) -> Result<bool, SessionError>;

    async fn is_enabled(&self, el: &ElementHandle) -> Result<bool, SessionError>;

    async fn is_in_viewport(&self, el: &ElementHandle) -> Result<bool, SessionError>;

    /// Move input focus to an element.
    async fn focus(&self, el: &ElementHandle) -> Result<(), SessionError>;

    /// Send a key to the currently focused element.
    async fn press_key(&self, key: Key) -> Result<(), SessionError>;
}
