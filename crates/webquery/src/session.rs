// DriverSession - the collaborator boundary to the browser-automation driver
//
// Everything webquery does ends up as a call through this trait: element
// lookup, element state reads, input, script execution, and navigation.
// The library owns no browser state of its own; a session handle is injected
// wherever a query or facade is constructed, so multiple independent sessions
// can coexist and tests can substitute a fake implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::selector::Selector;

/// Opaque handle to a DOM element, issued by the driver.
///
/// Handles stay valid as long as the driver keeps the underlying element
/// alive; a handle held across a page mutation may go stale, in which case
/// driver calls report [`crate::Error::Driver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    /// Creates a handle from a driver-issued id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Returns the driver-issued id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// How an option inside a single-select control is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectBy {
    /// Match the option's `value` attribute
    Value,
    /// Match the option's visible text
    VisibleText,
}

/// Driver session consumed by queries, waits, and the browser facade.
///
/// Implementations wrap a concrete automation driver (a WebDriver client, a
/// CDP connection, an in-memory fake). All methods are sequential; the
/// library never invokes a session concurrently from multiple tasks, and
/// implementations are not required to tolerate it.
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// Returns all elements matching the selector, in document order.
    async fn find_all(&self, selector: &Selector) -> Result<Vec<ElementHandle>>;

    /// Returns the element's tag name, lowercased.
    async fn tag_name(&self, element: &ElementHandle) -> Result<String>;

    /// Returns whether the element is displayed.
    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool>;

    /// Returns whether the element is enabled.
    async fn is_enabled(&self, element: &ElementHandle) -> Result<bool>;

    /// Returns whether the element (checkbox, radio, option) is selected.
    async fn is_selected(&self, element: &ElementHandle) -> Result<bool>;

    /// Returns the value of the named attribute, or `None` when absent.
    async fn get_attribute(&self, element: &ElementHandle, name: &str)
    -> Result<Option<String>>;

    /// Returns the element's visible text.
    async fn get_text(&self, element: &ElementHandle) -> Result<String>;

    /// Performs a native click on the element.
    async fn click(&self, element: &ElementHandle) -> Result<()>;

    /// Sends a key sequence to the element.
    async fn send_keys(&self, element: &ElementHandle, keys: &str) -> Result<()>;

    /// Clears the element's value (input-like elements).
    async fn clear(&self, element: &ElementHandle) -> Result<()>;

    /// Selects an option inside a single-select control.
    async fn select_option(
        &self,
        element: &ElementHandle,
        by: SelectBy,
        option: &str,
    ) -> Result<()>;

    /// Executes a script in the page, with elements bound as `arguments[n]`.
    async fn execute_script(
        &self,
        script: &str,
        args: &[ElementHandle],
    ) -> Result<serde_json::Value>;

    /// Navigates to the given URL.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Navigates one step back in the session history.
    async fn navigate_back(&self) -> Result<()>;

    /// Reloads the current page.
    async fn refresh(&self) -> Result<()>;

    /// Returns the current URL.
    async fn current_url(&self) -> Result<String>;

    /// Returns the current page title.
    async fn title(&self) -> Result<String>;

    /// Returns the current page source.
    async fn page_source(&self) -> Result<String>;

    /// Accepts the currently open alert, failing when none is present.
    async fn accept_alert(&self) -> Result<()>;
}
