// Browser - thin facade over an injected driver session
//
// Holds the session handle and hands out queries bound to it. Navigation and
// page-level reads are pure delegation; the readiness probes are the only
// logic here, built on the same Wait helper the queries use.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::element::ElementQuery;
use crate::error::Result;
use crate::session::{DriverSession, ElementHandle};
use crate::wait::Wait;

/// Budget for the document readiness and AJAX-idle probes
const READY_STATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Polling interval for the readiness probes (100 ms)
const READY_STATE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Budget for the suppressed alert-accept poll
const ALERT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(5);

const READY_STATE_PROBE: &str = "return document.readyState == 'complete';";
const AJAX_IDLE_PROBE: &str = "return (typeof($) === 'undefined') ? true : !$.active;";

/// Browser-session facade bound to a driver session.
///
/// A `Browser` is a value, not a process-wide singleton: construct as many
/// as there are sessions, and clone freely — clones share the session.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use webquery::Browser;
///
/// let browser = Browser::new(session);
/// browser.navigate("https://example.test/login").await?;
/// browser.wait_ready_state().await?;
/// browser.query().by_id("username").set_text("admin").await?;
/// ```
#[derive(Clone)]
pub struct Browser {
    session: Arc<dyn DriverSession>,
}

impl Browser {
    /// Creates a facade over the given session.
    pub fn new(session: Arc<dyn DriverSession>) -> Self {
        Self { session }
    }

    /// Returns the underlying session handle.
    pub fn session(&self) -> &Arc<dyn DriverSession> {
        &self.session
    }

    /// Starts a fresh element query bound to this session.
    pub fn query(&self) -> ElementQuery {
        ElementQuery::new(Arc::clone(&self.session))
    }

    /// Navigates to the given URL.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.session
            .navigate(url)
            .await
            .map_err(|e| e.context(format!("navigating to '{url}'")))
    }

    /// Navigates one step back in the session history.
    pub async fn navigate_back(&self) -> Result<()> {
        self.session.navigate_back().await
    }

    /// Reloads the current page.
    pub async fn refresh(&self) -> Result<()> {
        self.session.refresh().await
    }

    /// Returns the current URL.
    pub async fn url(&self) -> Result<String> {
        self.session.current_url().await
    }

    /// Returns the current page title.
    pub async fn title(&self) -> Result<String> {
        self.session.title().await
    }

    /// Returns the current page source.
    pub async fn page_source(&self) -> Result<String> {
        self.session.page_source().await
    }

    /// Executes a script in the page, with elements bound as `arguments[n]`.
    pub async fn execute_script(
        &self,
        script: &str,
        args: &[ElementHandle],
    ) -> Result<serde_json::Value> {
        self.session.execute_script(script, args).await
    }

    /// Blocks until the document reports `readyState == 'complete'`.
    ///
    /// Polls every 100 ms for up to 60 s, then fails with a timeout error.
    pub async fn wait_ready_state(&self) -> Result<()> {
        let session = &self.session;
        Wait::with_interval(READY_STATE_TIMEOUT, READY_STATE_POLL_INTERVAL)
            .wait_for(|| async move {
                Ok(session
                    .execute_script(READY_STATE_PROBE, &[])
                    .await?
                    .as_bool()
                    .unwrap_or(false))
            })
            .await?
            .ensure_satisfied_with("document never reached readyState 'complete'")
    }

    /// Blocks until no AJAX request is active.
    ///
    /// Pages without the jQuery helper are treated as idle.
    pub async fn wait_ajax(&self) -> Result<()> {
        let session = &self.session;
        Wait::with_interval(READY_STATE_TIMEOUT, READY_STATE_POLL_INTERVAL)
            .wait_for(|| async move {
                Ok(session
                    .execute_script(AJAX_IDLE_PROBE, &[])
                    .await?
                    .as_bool()
                    .unwrap_or(false))
            })
            .await?
            .ensure_satisfied_with("pending AJAX requests never settled")
    }

    /// Accepts an alert if one opens within 5 s.
    ///
    /// The outcome is deliberately discarded: no alert appearing is not a
    /// failure.
    pub async fn accept_alert(&self) -> Result<()> {
        let session = &self.session;
        Wait::spin_wait(
            || async move { Ok(session.accept_alert().await.is_ok()) },
            ALERT_ACCEPT_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Resizes the window through the script collaborator.
    pub async fn resize_window(&self, width: u32, height: u32) -> Result<()> {
        self.session
            .execute_script(&format!("window.resizeTo({width}, {height});"), &[])
            .await?;
        Ok(())
    }
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser").finish_non_exhaustive()
    }
}
