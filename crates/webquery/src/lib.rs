//! webquery: fluent element queries and polling waits over a pluggable
//! browser-automation driver.
//!
//! This crate owns no browser. It layers two things over an injected
//! [`DriverSession`]: a criteria-accumulating element query that resolves to
//! live element handles on demand, and a timeout-budgeted polling helper for
//! "retry until satisfied" conditions. Everything else — navigation, DOM
//! access, input — is delegation through the session trait, so any driver
//! (a WebDriver client, a CDP connection, an in-memory fake for tests) can
//! sit underneath.
//!
//! # Examples
//!
//! ## Querying and acting on elements
//!
//! ```ignore
//! use std::sync::Arc;
//! use webquery::{Browser, TagName};
//!
//! async fn submit_login(browser: &Browser) -> webquery::Result<()> {
//!     browser.query().by_id("username").set_text("admin").await?;
//!     browser.query().by_id("password").set_text("hunter2").await?;
//!
//!     // Criteria accumulate; the first one drives the coarse lookup and
//!     // every one of them refines the result in memory.
//!     browser
//!         .query()
//!         .by_tag_name(TagName::Input)
//!         .by_type("submit", true)
//!         .first()
//!         .click(false)
//!         .await?;
//!
//!     browser.wait_ready_state().await
//! }
//! ```
//!
//! ## Waiting with a budget
//!
//! ```ignore
//! use std::time::Duration;
//! use webquery::Wait;
//!
//! async fn wait_for_banner(browser: &webquery::Browser) -> webquery::Result<()> {
//!     let banner = browser.query().by_class("banner");
//!
//!     // One-shot form: boolean outcome, no error on timeout.
//!     if banner.exists_within(Duration::from_secs(5)).await? {
//!         return Ok(());
//!     }
//!
//!     // Chained form: promote the timeout to an error explicitly.
//!     Wait::with_timeout(Duration::from_secs(30))
//!         .wait_for(|| banner.exists())
//!         .await?
//!         .ensure_satisfied_with("banner never appeared")
//! }
//! ```
//!
//! ## Enumerating matches
//!
//! ```ignore
//! let rows = browser.query().by_tag_name(webquery::TagName::Div).by_class("row");
//! let labels = rows.map(|row| async move { row.text().await }).await?;
//! ```

mod browser;
mod element;
mod error;
mod selector;
mod session;
mod tags;
mod wait;

// Re-export error types
pub use error::{Error, Result};

// Re-export the browser facade and query builder
pub use browser::Browser;
pub use element::{ElementQuery, EXISTS_POLL_INTERVAL};

// Re-export the collaborator boundary
pub use session::{DriverSession, ElementHandle, SelectBy};

// Re-export selectors and the tag vocabulary
pub use selector::Selector;
pub use tags::{JsEvent, TagAttribute, TagName};

// Re-export the wait helper
pub use wait::{Wait, DEFAULT_POLL_INTERVAL};
