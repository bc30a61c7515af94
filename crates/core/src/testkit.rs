//! In-memory session double for engine tests
//!
//! Models just enough of a page to exercise the engine: elements answer to
//! a fixed set of raw selectors, carry visibility/enabled/viewport flags,
//! and can be wired to intercept clicks or mutate the page when clicked.
//! Script evaluation recognizes the probe scripts the engine injects
//! (readiness, idle counter, overlay surgery) by their stable fragments.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::{ElementHandle, Key, SessionError, SessionPort};

/// Page mutation applied when an element is successfully clicked
/// (or when Enter is pressed, for form submission).
#[derive(Clone, Debug)]
pub enum ClickEffect {
    SetUrl(String),
    SetTitle(String),
    AddElement(Box<FakeElement>),
    RemoveMatching(String),
    RemoveOverlays,
}

/// One element in the fake page.
#[derive(Clone, Debug)]
pub struct FakeElement {
    pub id: String,
    pub selectors: Vec<String>,
    pub visible: bool,
    pub enabled: bool,
    pub in_viewport: bool,
    pub value: String,
    pub text: String,
    pub attributes: HashMap<String, String>,
    /// Removed by overlay surgery scripts and escape-key dismissal.
    pub overlay: bool,
    /// Reject this many native clicks with an interception error.
    pub intercept_clicks: u32,
    /// Reject scripted clicks too (forces the keyboard tier).
    pub reject_scripted_clicks: bool,
    /// Reject native typing/selecting (forces scripted value assignment).
    pub reject_native_input: bool,
    /// Clicking this element removes all overlay-flagged elements.
    pub dismisses_overlays_on_click: bool,
    pub click_effects: Vec<ClickEffect>,
}

impl FakeElement {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            selectors: Vec::new(),
            visible: true,
            enabled: true,
            in_viewport: true,
            value: String::new(),
            text: String::new(),
            attributes: HashMap::new(),
            overlay: false,
            intercept_clicks: 0,
            reject_scripted_clicks: false,
            reject_native_input: false,
            dismisses_overlays_on_click: false,
            click_effects: Vec::new(),
        }
    }

    /// Raw selectors this element answers to.
    pub fn matching<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selectors.extend(selectors.into_iter().map(Into::into));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn off_screen(mut self) -> Self {
        self.in_viewport = false;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn as_overlay(mut self) -> Self {
        self.overlay = true;
        self
    }

    pub fn intercepting_clicks(mut self, count: u32) -> Self {
        self.intercept_clicks = count;
        self
    }

    pub fn rejecting_scripted_clicks(mut self) -> Self {
        self.reject_scripted_clicks = true;
        self
    }

    pub fn rejecting_native_input(mut self) -> Self {
        self.reject_native_input = true;
        self
    }

    pub fn dismissing_overlays_on_click(mut self) -> Self {
        self.dismisses_overlays_on_click = true;
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.click_effects.push(effect);
        self
    }
}

#[derive(Debug, Default)]
struct PageState {
    url: String,
    title: String,
    elements: Vec<FakeElement>,
    escapes: u32,
    escapes_to_dismiss: Option<u32>,
    enter_effects: Vec<ClickEffect>,
    focused: Option<String>,
    document_ready: bool,
    network_idle: bool,
    invalid_selectors: Vec<String>,
    fail_scripts: bool,
    scripts: Vec<String>,
    navigations: Vec<String>,
    keys: Vec<Key>,
}

/// In-memory `SessionPort` implementation.
pub struct FakeSession {
    state: Mutex<PageState>,
}

impl FakeSession {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(PageState {
                url: url.into(),
                title: title.into(),
                document_ready: true,
                network_idle: true,
                ..PageState::default()
            }),
        }
    }

    pub fn add_element(&self, element: FakeElement) {
        self.lock().elements.push(element);
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.lock().url = url.into();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().title = title.into();
    }

    /// Overlay-flagged elements vanish once this many escapes were pressed.
    pub fn dismiss_overlays_after_escapes(&self, count: u32) {
        self.lock().escapes_to_dismiss = Some(count);
    }

    /// Effects applied when Enter reaches the focused element.
    pub fn set_enter_effects(&self, effects: Vec<ClickEffect>) {
        self.lock().enter_effects = effects;
    }

    /// Queries for this selector fail with `InvalidSelector`.
    pub fn mark_selector_invalid(&self, selector: impl Into<String>) {
        self.lock().invalid_selectors.push(selector.into());
    }

    pub fn set_document_ready(&self, ready: bool) {
        self.lock().document_ready = ready;
    }

    pub fn set_network_idle(&self, idle: bool) {
        self.lock().network_idle = idle;
    }

    /// All script evaluation fails with `ScriptFailed`.
    pub fn fail_scripts(&self, fail: bool) {
        self.lock().fail_scripts = fail;
    }

    pub fn url(&self) -> String {
        self.lock().url.clone()
    }

    pub fn escape_count(&self) -> u32 {
        self.lock().escapes
    }

    pub fn script_log(&self) -> Vec<String> {
        self.lock().scripts.clone()
    }

    pub fn navigation_log(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn focused_element(&self) -> Option<String> {
        self.lock().focused.clone()
    }

    /// Count of elements answering to a selector, for post-state assertions.
    pub fn matching_count(&self, selector: &str) -> usize {
        self.lock()
            .elements
            .iter()
            .filter(|e| e.selectors.iter().any(|s| s == selector))
            .count()
    }

    pub fn element_value(&self, id: &str) -> Option<String> {
        self.lock()
            .elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.value.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_element<T>(
        &self,
        el: &ElementHandle,
        f: impl FnOnce(&mut FakeElement) -> T,
    ) -> Result<T, SessionError> {
        let mut state = self.lock();
        match state.elements.iter_mut().find(|e| e.id == el.0) {
            Some(element) => Ok(f(element)),
            None => Err(SessionError::StaleElement { id: el.0.clone() }),
        }
    }

    fn apply_effects(state: &mut PageState, effects: &[ClickEffect]) {
        for effect in effects {
            match effect {
                ClickEffect::SetUrl(url) => state.url = url.clone(),
                ClickEffect::SetTitle(title) => state.title = title.clone(),
                ClickEffect::AddElement(element) => state.elements.push((**element).clone()),
                ClickEffect::RemoveMatching(selector) => state
                    .elements
                    .retain(|e| !e.selectors.iter().any(|s| s == selector)),
                ClickEffect::RemoveOverlays => state.elements.retain(|e| !e.overlay),
            }
        }
    }
}

#[async_trait]
impl SessionPort for FakeSession {
    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.lock().url.clone())
    }

    async fn title(&self) -> Result<String, SessionError> {
        Ok(self.lock().title.clone())
    }

    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, SessionError> {
        let state = self.lock();
        if state.invalid_selectors.iter().any(|s| s == selector) {
            return Err(SessionError::InvalidSelector {
                selector: selector.to_string(),
            });
        }
        Ok(state
            .elements
            .iter()
            .filter(|e| e.selectors.iter().any(|s| s == selector))
            .map(|e| ElementHandle::new(e.id.clone()))
            .collect())
    }

    async fn run_script(&self, script: &str) -> Result<Value, SessionError> {
        let mut state = self.lock();
        state.scripts.push(script.to_string());
        if state.fail_scripts {
            return Err(SessionError::ScriptFailed {
                reason: "script evaluation disabled".into(),
            });
        }
        if script.contains("readyState") {
            return Ok(Value::Bool(state.document_ready));
        }
        if script.contains("jQuery") {
            return Ok(Value::Bool(state.network_idle));
        }
        if script.contains(".remove()") {
            state.elements.retain(|e| !e.overlay);
            return Ok(Value::Bool(true));
        }
        Ok(Value::Null)
    }

    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.navigations.push(url.to_string());
        state.url = url.to_string();
        Ok(())
    }

    async fn click(&self, el: &ElementHandle) -> Result<(), SessionError> {
        let mut state = self.lock();
        let element = state
            .elements
            .iter_mut()
            .find(|e| e.id == el.0)
            .ok_or_else(|| SessionError::StaleElement { id: el.0.clone() })?;
        if element.intercept_clicks > 0 {
            element.intercept_clicks -= 1;
            return Err(SessionError::InteractionFailed {
                reason: "click intercepted by another element".into(),
            });
        }
        let effects = element.click_effects.clone();
        let dismisses = element.dismisses_overlays_on_click;
        Self::apply_effects(&mut state, &effects);
        if dismisses {
            state.elements.retain(|e| !e.overlay);
        }
        Ok(())
    }

    async fn click_js(&self, el: &ElementHandle) -> Result<(), SessionError> {
        let mut state = self.lock();
        let element = state
            .elements
            .iter_mut()
            .find(|e| e.id == el.0)
            .ok_or_else(|| SessionError::StaleElement { id: el.0.clone() })?;
        if element.reject_scripted_clicks {
            return Err(SessionError::InteractionFailed {
                reason: "scripted click had no effect".into(),
            });
        }
        let effects = element.click_effects.clone();
        let dismisses = element.dismisses_overlays_on_click;
        Self::apply_effects(&mut state, &effects);
        if dismisses {
            state.elements.retain(|e| !e.overlay);
        }
        Ok(())
    }

    async fn clear(&self, el: &ElementHandle) -> Result<(), SessionError> {
        self.with_element(el, |e| e.value.clear())
    }

    async fn type_text(&self, el: &ElementHandle, text: &str) -> Result<(), SessionError> {
        self.with_element(el, |e| {
            if e.reject_native_input {
                Err(SessionError::InteractionFailed {
                    reason: "element did not accept keystrokes".into(),
                })
            } else {
                e.value.push_str(text);
                Ok(())
            }
        })?
    }

    async fn set_value_js(&self, el: &ElementHandle, value: &str) -> Result<(), SessionError> {
        self.with_element(el, |e| e.value = value.to_string())
    }

    async fn select_value(&self, el: &ElementHandle, value: &str) -> Result<(), SessionError> {
        self.with_element(el, |e| {
            if e.reject_native_input {
                Err(SessionError::InteractionFailed {
                    reason: "option could not be selected".into(),
                })
            } else {
                e.value = value.to_string();
                Ok(())
            }
        })?
    }

    async fn value(&self, el: &ElementHandle) -> Result<String, SessionError> {
        self.with_element(el, |e| e.value.clone())
    }

    async fn text(&self, el: &ElementHandle) -> Result<String, SessionError> {
        self.with_element(el, |e| e.text.clone())
    }

    async fn attribute(
        &self,
        el: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, SessionError> {
        self.with_element(el, |e| e.attributes.get(name).cloned())
    }

    async fn is_displayed(&self, el: &ElementHandle) -> Result<bool, SessionError> {
        self.with_element(el, |e| e.visible)
    }

    async fn is_enabled(&self, el: &ElementHandle) -> Result<bool, SessionError> {
        self.with_element(el, |e| e.enabled)
    }

    async fn is_in_viewport(&self, el: &ElementHandle) -> Result<bool, SessionError> {
        self.with_element(el, |e| e.in_viewport)
    }

    async fn focus(&self, el: &ElementHandle) -> Result<(), SessionError> {
        let id = el.0.clone();
        self.with_element(el, |_| ())?;
        self.lock().focused = Some(id);
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.keys.push(key);
        match key {
            Key::Escape => {
                state.escapes += 1;
                if let Some(threshold) = state.escapes_to_dismiss {
                    if state.escapes >= threshold {
                        state.elements.retain(|e| !e.overlay);
                    }
                }
            }
            Key::Enter => {
                let effects = state.enter_effects.clone();
                Self::apply_effects(&mut state, &effects);
            }
        }
        Ok(())
    }
}
