// Fake Driver - in-memory driver session for integration tests
//
// Models a document as a flat, ordered element list with tag, attributes,
// text, and state flags. Structured selectors are matched directly; raw
// XPath support is limited to the plain "//tag" form the tests use.
// Scripts the library emits (value assignment, innerHTML read, synthetic
// events, readiness probes) are interpreted; everything else records and
// returns null. This enables deterministic, offline integration testing.

// Note: Functions appear "unused" because each test binary compiles separately,
// but they ARE used across multiple test files. Suppress false-positive warnings.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use webquery::{DriverSession, ElementHandle, Error, Result, SelectBy, Selector};

const READY_STATE_PROBE: &str = "return document.readyState == 'complete';";
const AJAX_IDLE_PROBE: &str = "return (typeof($) === 'undefined') ? true : !$.active;";

/// One element of the fake document.
#[derive(Debug, Clone)]
pub struct FakeElement {
    id: u64,
    tag: String,
    attrs: HashMap<String, String>,
    text: String,
    displayed: bool,
    enabled: bool,
    selected: bool,
    removed: bool,
}

impl FakeElement {
    pub fn new(tag: &str) -> Self {
        Self {
            id: 0,
            tag: tag.to_string(),
            attrs: HashMap::new(),
            text: String::new(),
            displayed: true,
            enabled: true,
            selected: false,
            removed: false,
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    fn is_checkable(&self) -> bool {
        self.tag == "input"
            && self
                .attrs
                .get("type")
                .is_some_and(|t| t == "checkbox" || t == "radio")
    }
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    elements: Vec<FakeElement>,
    executed: Vec<String>,
    key_log: Vec<(u64, String)>,
    clear_log: Vec<u64>,
    click_counts: HashMap<u64, u64>,
    click_failures: HashMap<u64, u64>,
    stuck_clicks: HashMap<u64, u64>,
    select_log: Vec<(u64, SelectBy, String)>,
    events: Vec<String>,
    url: String,
    title: String,
    source: String,
    alert_open: bool,
    alerts_accepted: u64,
    ready_after: u64,
    ajax_after: u64,
}

/// In-memory [`DriverSession`] implementation.
pub struct FakeSession {
    inner: Mutex<Inner>,
}

impl FakeSession {
    pub fn new() -> Arc<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
        Arc::new(Self {
            inner: Mutex::new(Inner::default()),
        })
    }

    pub fn with_elements(elements: Vec<FakeElement>) -> Arc<Self> {
        let session = Self::new();
        for element in elements {
            session.add(element);
        }
        session
    }

    /// Adds an element to the document; returns its driver handle.
    pub fn add(&self, mut element: FakeElement) -> ElementHandle {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        element.id = inner.next_id;
        let handle = ElementHandle::new(element.id.to_string());
        inner.elements.push(element);
        handle
    }

    /// Removes elements with the given `id` attribute from the document.
    ///
    /// Handles already issued for them stay resolvable, like a driver whose
    /// element references outlive DOM removal.
    pub fn remove_by_id_attr(&self, id_attr: &str) {
        let mut inner = self.inner.lock();
        for element in &mut inner.elements {
            if element.attrs.get("id").is_some_and(|v| v == id_attr) {
                element.removed = true;
            }
        }
    }

    /// Makes the next `times` native clicks on the element fail as
    /// "not clickable".
    pub fn fail_clicks(&self, handle: &ElementHandle, times: u64) {
        let id = parse_id(handle).expect("valid handle");
        self.inner.lock().click_failures.insert(id, times);
    }

    /// Swallows the next `times` clicks on a checkable element without
    /// flipping its state.
    pub fn swallow_clicks(&self, handle: &ElementHandle, times: u64) {
        let id = parse_id(handle).expect("valid handle");
        self.inner.lock().stuck_clicks.insert(id, times);
    }

    /// Makes the readiness probe report false for the next `polls` calls.
    pub fn ready_after(&self, polls: u64) {
        self.inner.lock().ready_after = polls;
    }

    /// Makes the AJAX-idle probe report false for the next `polls` calls.
    pub fn ajax_idle_after(&self, polls: u64) {
        self.inner.lock().ajax_after = polls;
    }

    pub fn open_alert(&self) {
        self.inner.lock().alert_open = true;
    }

    pub fn set_page(&self, url: &str, title: &str, source: &str) {
        let mut inner = self.inner.lock();
        inner.url = url.to_string();
        inner.title = title.to_string();
        inner.source = source.to_string();
    }

    // ------------------------------------------------------------------
    // Assertion accessors
    // ------------------------------------------------------------------

    pub fn executed_scripts(&self) -> Vec<String> {
        self.inner.lock().executed.clone()
    }

    pub fn clicks(&self, handle: &ElementHandle) -> u64 {
        let id = parse_id(handle).expect("valid handle");
        self.inner.lock().click_counts.get(&id).copied().unwrap_or(0)
    }

    pub fn total_clicks(&self) -> u64 {
        self.inner.lock().click_counts.values().sum()
    }

    pub fn keys_sent(&self, handle: &ElementHandle) -> Vec<String> {
        let id = parse_id(handle).expect("valid handle");
        self.inner
            .lock()
            .key_log
            .iter()
            .filter(|(target, _)| *target == id)
            .map(|(_, keys)| keys.clone())
            .collect()
    }

    pub fn clear_count(&self, handle: &ElementHandle) -> usize {
        let id = parse_id(handle).expect("valid handle");
        self.inner
            .lock()
            .clear_log
            .iter()
            .filter(|target| **target == id)
            .count()
    }

    pub fn selections(&self) -> Vec<(SelectBy, String)> {
        self.inner
            .lock()
            .select_log
            .iter()
            .map(|(_, by, option)| (by.clone(), option.clone()))
            .collect()
    }

    pub fn events(&self) -> Vec<String> {
        self.inner.lock().events.clone()
    }

    pub fn alerts_accepted(&self) -> u64 {
        self.inner.lock().alerts_accepted
    }

    pub fn attr_of(&self, handle: &ElementHandle, name: &str) -> Option<String> {
        let id = parse_id(handle).expect("valid handle");
        let inner = self.inner.lock();
        element(&inner, id)
            .ok()
            .and_then(|el| el.attrs.get(name).cloned())
    }

    pub fn is_selected_now(&self, handle: &ElementHandle) -> bool {
        let id = parse_id(handle).expect("valid handle");
        let inner = self.inner.lock();
        element(&inner, id).map(|el| el.selected).unwrap_or(false)
    }
}

fn parse_id(handle: &ElementHandle) -> Result<u64> {
    handle
        .id()
        .parse()
        .map_err(|_| Error::Driver(format!("unknown element handle: {}", handle.id())))
}

fn element<'a>(inner: &'a Inner, id: u64) -> Result<&'a FakeElement> {
    inner
        .elements
        .iter()
        .find(|el| el.id == id)
        .ok_or_else(|| Error::Driver(format!("stale element reference: {id}")))
}

fn element_mut<'a>(inner: &'a mut Inner, id: u64) -> Result<&'a mut FakeElement> {
    inner
        .elements
        .iter_mut()
        .find(|el| el.id == id)
        .ok_or_else(|| Error::Driver(format!("stale element reference: {id}")))
}

fn selector_matches(selector: &Selector, el: &FakeElement) -> bool {
    match selector {
        Selector::Attribute { name, value, exact } => {
            el.attrs.get(name).is_some_and(|actual| {
                if *exact {
                    actual == value
                } else {
                    actual.contains(value.as_str())
                }
            })
        }
        Selector::TagName(tag) => el.tag == *tag,
        Selector::Text { text, exact } => {
            if *exact {
                el.text == *text
            } else {
                el.text.to_lowercase().contains(&text.to_lowercase())
            }
        }
        Selector::XPath(path) => path
            .strip_prefix("//")
            .is_some_and(|tag| !tag.contains('[') && el.tag == tag),
    }
}

/// Counts a click and flips checkable state, honoring the stuck-clicks knob.
fn register_click(inner: &mut Inner, id: u64) -> Result<()> {
    *inner.click_counts.entry(id).or_insert(0) += 1;
    let swallowed = match inner.stuck_clicks.get_mut(&id) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            true
        }
        _ => false,
    };
    let el = element_mut(inner, id)?;
    if el.is_checkable() && !swallowed {
        el.selected = !el.selected;
    }
    Ok(())
}

#[async_trait]
impl DriverSession for FakeSession {
    async fn find_all(&self, selector: &Selector) -> Result<Vec<ElementHandle>> {
        let inner = self.inner.lock();
        Ok(inner
            .elements
            .iter()
            .filter(|el| !el.removed && selector_matches(selector, el))
            .map(|el| ElementHandle::new(el.id.to_string()))
            .collect())
    }

    async fn tag_name(&self, handle: &ElementHandle) -> Result<String> {
        let inner = self.inner.lock();
        Ok(element(&inner, parse_id(handle)?)?.tag.clone())
    }

    async fn is_displayed(&self, handle: &ElementHandle) -> Result<bool> {
        let inner = self.inner.lock();
        Ok(element(&inner, parse_id(handle)?)?.displayed)
    }

    async fn is_enabled(&self, handle: &ElementHandle) -> Result<bool> {
        let inner = self.inner.lock();
        Ok(element(&inner, parse_id(handle)?)?.enabled)
    }

    async fn is_selected(&self, handle: &ElementHandle) -> Result<bool> {
        let inner = self.inner.lock();
        Ok(element(&inner, parse_id(handle)?)?.selected)
    }

    async fn get_attribute(&self, handle: &ElementHandle, name: &str) -> Result<Option<String>> {
        let inner = self.inner.lock();
        Ok(element(&inner, parse_id(handle)?)?.attrs.get(name).cloned())
    }

    async fn get_text(&self, handle: &ElementHandle) -> Result<String> {
        let inner = self.inner.lock();
        Ok(element(&inner, parse_id(handle)?)?.text.clone())
    }

    async fn click(&self, handle: &ElementHandle) -> Result<()> {
        let id = parse_id(handle)?;
        let mut inner = self.inner.lock();
        if let Some(remaining) = inner.click_failures.get_mut(&id)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(Error::Driver(
                "Element is not clickable at point (12, 34)".to_string(),
            ));
        }
        register_click(&mut inner, id)
    }

    async fn send_keys(&self, handle: &ElementHandle, keys: &str) -> Result<()> {
        let id = parse_id(handle)?;
        self.inner.lock().key_log.push((id, keys.to_string()));
        Ok(())
    }

    async fn clear(&self, handle: &ElementHandle) -> Result<()> {
        let id = parse_id(handle)?;
        let mut inner = self.inner.lock();
        inner.clear_log.push(id);
        element_mut(&mut inner, id)?
            .attrs
            .insert("value".to_string(), String::new());
        Ok(())
    }

    async fn select_option(
        &self,
        handle: &ElementHandle,
        by: SelectBy,
        option: &str,
    ) -> Result<()> {
        let id = parse_id(handle)?;
        let mut inner = self.inner.lock();
        inner.select_log.push((id, by.clone(), option.to_string()));
        if by == SelectBy::Value {
            element_mut(&mut inner, id)?
                .attrs
                .insert("value".to_string(), option.to_string());
        }
        Ok(())
    }

    async fn execute_script(&self, script: &str, args: &[ElementHandle]) -> Result<Value> {
        let mut inner = self.inner.lock();
        inner.executed.push(script.to_string());

        if script == READY_STATE_PROBE {
            if inner.ready_after > 0 {
                inner.ready_after -= 1;
                return Ok(json!(false));
            }
            return Ok(json!(true));
        }

        if script == AJAX_IDLE_PROBE {
            if inner.ajax_after > 0 {
                inner.ajax_after -= 1;
                return Ok(json!(false));
            }
            return Ok(json!(true));
        }

        if let Some(rest) = script.strip_prefix("arguments[0].value = \"") {
            let value = rest.strip_suffix("\";").unwrap_or(rest);
            let id = parse_id(args.first().ok_or_else(|| {
                Error::Driver("script expects an element argument".to_string())
            })?)?;
            element_mut(&mut inner, id)?
                .attrs
                .insert("value".to_string(), value.to_string());
            return Ok(Value::Null);
        }

        if script == "return arguments[0].innerHTML;" {
            let id = parse_id(args.first().ok_or_else(|| {
                Error::Driver("script expects an element argument".to_string())
            })?)?;
            return Ok(json!(element(&inner, id)?.text.clone()));
        }

        if script.starts_with("$(arguments[0]).") {
            let id = parse_id(args.first().ok_or_else(|| {
                Error::Driver("script expects an element argument".to_string())
            })?)?;
            if script.contains(".click()") {
                register_click(&mut inner, id)?;
            }
            return Ok(Value::Null);
        }

        Ok(Value::Null)
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.url = url.to_string();
        inner.events.push(format!("navigate:{url}"));
        Ok(())
    }

    async fn navigate_back(&self) -> Result<()> {
        self.inner.lock().events.push("back".to_string());
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.inner.lock().events.push("refresh".to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.inner.lock().url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.inner.lock().title.clone())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.inner.lock().source.clone())
    }

    async fn accept_alert(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.alert_open {
            inner.alert_open = false;
            inner.alerts_accepted += 1;
            Ok(())
        } else {
            Err(Error::Driver("no alert present".to_string()))
        }
    }
}
