// ElementQuery - fluent element search with in-memory refinement
//
// A query accumulates criteria and resolves them on demand: the first
// criterion becomes the primary selector handed to the driver for the coarse
// lookup, every criterion (including the first) is then re-applied as an
// in-memory filter over the returned handles. Criteria only accumulate;
// there is no removal. Combinators consume the query and return a new value,
// so a partially-built query can be cloned and specialized without the
// branches observing each other.
//
// Terminal operations re-resolve on every call unless a snapshot was cached
// via cache_search_result().

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::error::{Error, Result};
use crate::selector::Selector;
use crate::session::{DriverSession, ElementHandle, SelectBy};
use crate::tags::{JsEvent, TagAttribute, TagName};
use crate::wait::Wait;

/// Polling interval used by [`ElementQuery::exists_within`] (200 ms)
pub const EXISTS_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Click rounds before set_check gives up on a non-settling control
const CHECK_ROUNDS: usize = 10;

/// Pause before the single automatic retry of a native click
const NOT_CLICKABLE_RETRY_DELAY: Duration = Duration::from_secs(2);

// WebDriver key code points, used by the select-all + delete clear path
const KEY_CONTROL: char = '\u{e009}';
const KEY_DELETE: char = '\u{e017}';

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeCriterion {
    name: String,
    value: String,
    exact: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextCriterion {
    text: String,
    exact: bool,
}

/// Fluent element query bound to a driver session.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use webquery::{ElementQuery, TagAttribute, TagName};
///
/// let query = ElementQuery::new(Arc::clone(&session))
///     .by_tag_name(TagName::Input)
///     .by_type("checkbox", true)
///     .first();
///
/// if query.exists().await? {
///     query.set_check(true, false).await?;
/// }
/// ```
#[derive(Clone)]
pub struct ElementQuery {
    session: Arc<dyn DriverSession>,
    primary: Option<Selector>,
    attributes: Vec<AttributeCriterion>,
    tags: Vec<TagName>,
    text: Option<TextCriterion>,
    include_hidden: bool,
    index: Option<i64>,
    snapshot: Option<Arc<Vec<ElementHandle>>>,
}

impl ElementQuery {
    /// Creates an empty query against the given session.
    ///
    /// The query cannot be resolved until at least one criterion is added.
    pub fn new(session: Arc<dyn DriverSession>) -> Self {
        Self {
            session,
            primary: None,
            attributes: Vec::new(),
            tags: Vec::new(),
            text: None,
            include_hidden: false,
            index: None,
            snapshot: None,
        }
    }

    // ------------------------------------------------------------------
    // Criteria
    // ------------------------------------------------------------------

    /// Adds an attribute criterion.
    ///
    /// With `exact` false the attribute value only has to contain the
    /// expected value. The first criterion added to a query also becomes its
    /// primary selector.
    pub fn by_attribute(self, attribute: TagAttribute, value: &str, exact: bool) -> Self {
        self.push_attribute(attribute.as_str(), value, exact)
    }

    /// Adds a criterion on an attribute outside the canonical vocabulary
    /// (data attributes and the like).
    pub fn by_custom_attribute(self, name: &str, value: &str, exact: bool) -> Self {
        self.push_attribute(name, value, exact)
    }

    /// Adds an exact `id` attribute criterion.
    pub fn by_id(self, id: &str) -> Self {
        self.by_attribute(TagAttribute::Id, id, true)
    }

    /// Adds an exact `name` attribute criterion.
    pub fn by_name(self, name: &str) -> Self {
        self.by_attribute(TagAttribute::Name, name, true)
    }

    /// Adds an exact `class` attribute criterion.
    pub fn by_class(self, class: &str) -> Self {
        self.by_attribute(TagAttribute::Class, class, true)
    }

    /// Adds an exact `title` attribute criterion.
    pub fn by_title(self, title: &str) -> Self {
        self.by_attribute(TagAttribute::Title, title, true)
    }

    /// Adds an exact `href` attribute criterion.
    pub fn by_href(self, href: &str) -> Self {
        self.by_attribute(TagAttribute::Href, href, true)
    }

    /// Adds a `type` attribute criterion.
    pub fn by_type(self, r#type: &str, exact: bool) -> Self {
        self.by_attribute(TagAttribute::Type, r#type, exact)
    }

    /// Adds a tag-name criterion.
    ///
    /// Multiple tag criteria must all match, like the attribute criteria.
    pub fn by_tag_name(mut self, tag: TagName) -> Self {
        if self.primary.is_none() {
            self.primary = Some(Selector::TagName(tag.as_str().to_string()));
        }
        self.tags.push(tag);
        self
    }

    /// Sets a raw XPath expression as the primary selector.
    ///
    /// An XPath expression must be the first criterion: fails with
    /// [`Error::PrimarySelectorConflict`] when any criterion already fixed
    /// the primary selector.
    pub fn by_xpath(mut self, xpath: &str) -> Result<Self> {
        if self.primary.is_some() {
            return Err(Error::PrimarySelectorConflict);
        }
        self.primary = Some(Selector::XPath(xpath.to_string()));
        Ok(self)
    }

    /// Adds a text criterion; inexact matching is a case-insensitive
    /// substring test.
    pub fn by_text(mut self, text: &str, exact: bool) -> Self {
        if self.primary.is_none() {
            self.primary = Some(Selector::Text {
                text: text.to_string(),
                exact,
            });
        }
        self.text = Some(TextCriterion {
            text: text.to_string(),
            exact,
        });
        self
    }

    /// Restricts single-element operations to the match at `index`.
    ///
    /// Negative indexes count from the end of the matched set.
    pub fn by_index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    /// Restricts single-element operations to the first match.
    pub fn first(self) -> Self {
        self.by_index(0)
    }

    /// Restricts single-element operations to the last match.
    pub fn last(self) -> Self {
        self.by_index(-1)
    }

    /// Keeps non-displayed elements in the matched set.
    pub fn include_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }

    fn push_attribute(mut self, name: &str, value: &str, exact: bool) -> Self {
        if self.primary.is_none() {
            self.primary = Some(Selector::Attribute {
                name: name.to_string(),
                value: value.to_string(),
                exact,
            });
        }
        self.attributes.push(AttributeCriterion {
            name: name.to_string(),
            value: value.to_string(),
            exact,
        });
        self
    }

    // ------------------------------------------------------------------
    // Snapshot cache
    // ------------------------------------------------------------------

    /// Resolves the query once and pins the result.
    ///
    /// Subsequent terminal calls read from the pinned set instead of
    /// re-querying the live document, until the cache is cleared.
    pub async fn cache_search_result(mut self) -> Result<Self> {
        let matches = self.resolve().await?;
        self.snapshot = Some(Arc::new(matches));
        Ok(self)
    }

    /// Drops the pinned result set; terminal calls query live again.
    pub fn clear_search_result_cache(mut self) -> Self {
        self.snapshot = None;
        self
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Resolves the accumulated criteria into matched handles.
    ///
    /// Coarse lookup through the primary selector (or the pinned snapshot),
    /// then visibility, tag, text, and attribute refinement in that order.
    /// The positional index is not applied here.
    async fn resolve(&self) -> Result<Vec<ElementHandle>> {
        let working = match &self.snapshot {
            Some(snapshot) => snapshot.as_ref().clone(),
            None => {
                let primary = self.primary.as_ref().ok_or(Error::NoCriteria)?;
                self.session.find_all(primary).await?
            }
        };

        let working = self.filter_visibility(working).await?;
        let working = self.filter_tags(working).await?;
        let working = self.filter_text(working).await?;
        let working = self.filter_attributes(working).await?;

        tracing::trace!(
            criteria = %self.describe(),
            matched = working.len(),
            "resolved element query"
        );

        Ok(working)
    }

    async fn filter_visibility(&self, elements: Vec<ElementHandle>) -> Result<Vec<ElementHandle>> {
        if self.include_hidden {
            return Ok(elements);
        }
        let mut kept = Vec::with_capacity(elements.len());
        for element in elements {
            if self.session.is_displayed(&element).await? {
                kept.push(element);
            }
        }
        Ok(kept)
    }

    async fn filter_tags(&self, elements: Vec<ElementHandle>) -> Result<Vec<ElementHandle>> {
        if self.tags.is_empty() {
            return Ok(elements);
        }
        let mut kept = Vec::with_capacity(elements.len());
        for element in elements {
            let tag = self.session.tag_name(&element).await?;
            // Every tag criterion must match; conflicting tags yield an
            // empty set.
            if self.tags.iter().all(|t| t.as_str() == tag) {
                kept.push(element);
            }
        }
        Ok(kept)
    }

    async fn filter_text(&self, elements: Vec<ElementHandle>) -> Result<Vec<ElementHandle>> {
        let Some(criterion) = &self.text else {
            return Ok(elements);
        };
        let mut kept = Vec::with_capacity(elements.len());
        for element in elements {
            let text = self.session.get_text(&element).await?;
            let matches = if criterion.exact {
                text == criterion.text
            } else {
                text.to_lowercase().contains(&criterion.text.to_lowercase())
            };
            if matches {
                kept.push(element);
            }
        }
        Ok(kept)
    }

    async fn filter_attributes(&self, elements: Vec<ElementHandle>) -> Result<Vec<ElementHandle>> {
        let mut working = elements;
        for criterion in &self.attributes {
            let mut kept = Vec::with_capacity(working.len());
            for element in working {
                let Some(actual) = self.session.get_attribute(&element, &criterion.name).await?
                else {
                    continue;
                };
                let matches = if criterion.exact {
                    actual == criterion.value
                } else {
                    actual.contains(&criterion.value)
                };
                if matches {
                    kept.push(element);
                }
            }
            working = kept;
        }
        Ok(working)
    }

    /// Resolves to exactly one handle.
    ///
    /// Applies the positional index when set; otherwise the matched set must
    /// already be a singleton.
    async fn find_single(&self) -> Result<ElementHandle> {
        let matches = self.resolve().await?;
        let count = matches.len();

        match self.index {
            Some(index) => {
                let effective = if index < 0 { index + count as i64 } else { index };
                if effective < 0 || effective >= count as i64 {
                    return Err(Error::IndexOutOfRange { index, count });
                }
                Ok(matches[effective as usize].clone())
            }
            None => match count {
                0 => Err(Error::NotFound(self.describe())),
                1 => Ok(matches[0].clone()),
                _ => Err(Error::AmbiguousMatch {
                    count,
                    criteria: self.describe(),
                }),
            },
        }
    }

    // ------------------------------------------------------------------
    // Terminal reads
    // ------------------------------------------------------------------

    /// Returns whether at least one element matches.
    pub async fn exists(&self) -> Result<bool> {
        Ok(!self.resolve().await?.is_empty())
    }

    /// Polls [`ElementQuery::exists`] every 200 ms until true or timeout.
    pub async fn exists_within(&self, timeout: Duration) -> Result<bool> {
        Wait::spin_wait_with_interval(|| self.exists(), timeout, EXISTS_POLL_INTERVAL).await
    }

    /// Returns the matched element count, before positional selection.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.resolve().await?.len())
    }

    /// Returns whether the single matched element is enabled.
    pub async fn enabled(&self) -> Result<bool> {
        let element = self.find_single().await?;
        self.session.is_enabled(&element).await
    }

    /// Returns whether the single matched element is displayed.
    pub async fn displayed(&self) -> Result<bool> {
        let element = self.find_single().await?;
        self.session.is_displayed(&element).await
    }

    /// Returns whether the single matched element is selected.
    pub async fn selected(&self) -> Result<bool> {
        let element = self.find_single().await?;
        self.session.is_selected(&element).await
    }

    /// Returns the single matched element's text, falling back to its
    /// `value` attribute when the text is empty (inputs report their content
    /// through `value`).
    pub async fn text(&self) -> Result<String> {
        let element = self.find_single().await?;
        let text = self.session.get_text(&element).await?;
        if !text.is_empty() {
            return Ok(text);
        }
        Ok(self
            .session
            .get_attribute(&element, TagAttribute::Value.as_str())
            .await?
            .unwrap_or_default())
    }

    /// Returns the single matched element's inner HTML.
    pub async fn inner_html(&self) -> Result<String> {
        let element = self.find_single().await?;
        let value = self
            .session
            .execute_script(
                "return arguments[0].innerHTML;",
                std::slice::from_ref(&element),
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Returns the named attribute of the single matched element.
    pub async fn get_attribute(&self, attribute: TagAttribute) -> Result<Option<String>> {
        let element = self.find_single().await?;
        self.session.get_attribute(&element, attribute.as_str()).await
    }

    // ------------------------------------------------------------------
    // Enumeration
    // ------------------------------------------------------------------

    /// Runs `action` once per matched element, in document order.
    ///
    /// The matched set is snapshotted before the first call, so the view
    /// stays stable while the action mutates page state. Each invocation
    /// receives a positioned query addressing one element of the snapshot.
    pub async fn for_each<F, Fut>(&self, mut action: F) -> Result<()>
    where
        F: FnMut(ElementQuery) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let snapshot = Arc::new(self.resolve().await?);
        for position in 0..snapshot.len() {
            action(self.positioned(Arc::clone(&snapshot), position)).await?;
        }
        Ok(())
    }

    /// Transforms every matched element, in document order.
    pub async fn map<T, F, Fut>(&self, mut transform: F) -> Result<Vec<T>>
    where
        F: FnMut(ElementQuery) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let snapshot = Arc::new(self.resolve().await?);
        let mut results = Vec::with_capacity(snapshot.len());
        for position in 0..snapshot.len() {
            results.push(transform(self.positioned(Arc::clone(&snapshot), position)).await?);
        }
        Ok(results)
    }

    /// Returns positioned queries for the matched elements the predicate
    /// keeps.
    pub async fn filter<F, Fut>(&self, mut predicate: F) -> Result<Vec<ElementQuery>>
    where
        F: FnMut(ElementQuery) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let snapshot = Arc::new(self.resolve().await?);
        let mut kept = Vec::new();
        for position in 0..snapshot.len() {
            let item = self.positioned(Arc::clone(&snapshot), position);
            if predicate(item.clone()).await? {
                kept.push(item);
            }
        }
        Ok(kept)
    }

    /// Returns the one matched element the predicate keeps.
    pub async fn single<F, Fut>(&self, predicate: F) -> Result<ElementQuery>
    where
        F: FnMut(ElementQuery) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let mut matches = self.filter(predicate).await?;
        match matches.len() {
            0 => Err(Error::NotFound(self.describe())),
            1 => Ok(matches.remove(0)),
            count => Err(Error::AmbiguousMatch {
                count,
                criteria: self.describe(),
            }),
        }
    }

    fn positioned(&self, snapshot: Arc<Vec<ElementHandle>>, position: usize) -> ElementQuery {
        let mut item = self.clone();
        item.snapshot = Some(snapshot);
        item.index = Some(position as i64);
        item
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Sends a key sequence to the single matched element.
    pub async fn send_keys(&self, keys: &str) -> Result<()> {
        let element = self.find_single().await?;
        self.session.send_keys(&element, keys).await
    }

    /// Replaces the single matched element's content with `value`.
    ///
    /// Input-like elements are cleared natively; anything else gets a
    /// select-all + delete key chord. A non-empty value is then assigned
    /// through the script collaborator and a synthetic keyup is fired, with
    /// any failure of the notification suppressed.
    pub async fn set_text(&self, value: &str) -> Result<()> {
        let element = self.find_single().await?;
        let tag = self.session.tag_name(&element).await?;

        if tag == TagName::Input.as_str() || tag == TagName::TextArea.as_str() {
            self.session.clear(&element).await?;
        } else {
            self.session
                .send_keys(&element, &format!("{KEY_CONTROL}a"))
                .await?;
            self.session
                .send_keys(&element, &KEY_DELETE.to_string())
                .await?;
        }

        if value.is_empty() {
            return Ok(());
        }

        self.session
            .execute_script(
                &format!("arguments[0].value = \"{value}\";"),
                std::slice::from_ref(&element),
            )
            .await?;

        Wait::try_run(|| self.fire_event_on(&element, JsEvent::KeyUp)).await;

        Ok(())
    }

    /// Clicks the single matched element.
    ///
    /// Requires the element to be enabled. By default a synthetic click
    /// event is dispatched for non-link tags; with `native` true (or on a
    /// link) the driver performs a real click, retried once after 2 s when
    /// the driver reports the element as not clickable.
    pub async fn click(&self, native: bool) -> Result<()> {
        let element = self.find_single().await?;

        if !self.session.is_enabled(&element).await? {
            return Err(Error::ElementDisabled(self.describe()));
        }

        let tag = self.session.tag_name(&element).await?;
        if !native && tag != TagName::Link.as_str() {
            return self.fire_event_on(&element, JsEvent::Click).await;
        }

        match self.session.click(&element).await {
            Err(Error::Driver(message)) if message.contains("not clickable") => {
                tracing::debug!(
                    criteria = %self.describe(),
                    "element not clickable yet, retrying once"
                );
                time::sleep(NOT_CLICKABLE_RETRY_DELAY).await;
                self.session.click(&element).await
            }
            other => other,
        }
    }

    /// Drives the single matched checkbox or radio button to `target`.
    ///
    /// Clicks only while the reported state disagrees with `target`, re-finds
    /// the element between rounds, and gives up after ten rounds. Already in
    /// the target state means no click at all.
    pub async fn set_check(&self, target: bool, native: bool) -> Result<()> {
        let element = self.find_single().await?;
        if !self.session.is_enabled(&element).await? {
            return Err(Error::ElementDisabled(self.describe()));
        }

        for _ in 0..CHECK_ROUNDS {
            let element = self.find_single().await?;
            if self.session.is_selected(&element).await? == target {
                return Ok(());
            }
            self.click(native).await?;
        }

        Err(Error::CheckStateNotReached {
            target,
            criteria: self.describe(),
        })
    }

    /// Selects an option of the single matched select control by its
    /// `value` attribute.
    pub async fn select_by_value(&self, option_value: &str) -> Result<()> {
        self.select_common(SelectBy::Value, option_value).await
    }

    /// Selects an option of the single matched select control by its
    /// visible text.
    pub async fn select_by_text(&self, option_text: &str) -> Result<()> {
        self.select_common(SelectBy::VisibleText, option_text).await
    }

    async fn select_common(&self, by: SelectBy, option: &str) -> Result<()> {
        if option.is_empty() {
            return Err(Error::InvalidArgument(
                "select option must not be empty".to_string(),
            ));
        }
        let element = self.find_single().await?;
        if !self.session.is_enabled(&element).await? {
            return Err(Error::ElementDisabled(self.describe()));
        }
        self.session.select_option(&element, by, option).await
    }

    /// Dispatches a synthetic event on the single matched element.
    pub async fn fire_event(&self, event: JsEvent) -> Result<()> {
        let element = self.find_single().await?;
        self.fire_event_on(&element, event).await
    }

    async fn fire_event_on(&self, element: &ElementHandle, event: JsEvent) -> Result<()> {
        self.session
            .execute_script(
                &format!("$(arguments[0]).{event}();"),
                std::slice::from_ref(element),
            )
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Description
    // ------------------------------------------------------------------

    /// Human-readable rendering of the accumulated criteria, as it appears
    /// in error messages.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self
            .attributes
            .iter()
            .map(|criterion| {
                format!(
                    "{}: {} ({})",
                    criterion.name,
                    criterion.value,
                    if criterion.exact { "exact" } else { "contains" }
                )
            })
            .collect();

        parts.extend(self.tags.iter().map(|tag| format!("tag: {tag}")));

        if let Some(Selector::XPath(path)) = &self.primary {
            parts.push(format!("XPath: {path}"));
        }

        if let Some(criterion) = &self.text {
            parts.push(format!(
                "text: {} ({})",
                criterion.text,
                if criterion.exact { "exact" } else { "contains" }
            ));
        }

        parts.join(", ")
    }
}

impl fmt::Debug for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementQuery")
            .field("criteria", &self.describe())
            .field("include_hidden", &self.include_hidden)
            .field("index", &self.index)
            .field("cached", &self.snapshot.is_some())
            .finish()
    }
}
