use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by browser interactions, classified by how callers react.
#[derive(Debug, Error)]
pub enum UiError {
    /// An optional UI element is absent. Callers resolve this to a sentinel
    /// value or skip the action.
    #[error("element not found: {context}")]
    ElementNotFound { context: String },

    /// A click target is temporarily obscured by another element. Retried a
    /// bounded number of times, then treated like an absent element.
    #[error("element blocked for interaction: {reason}")]
    InteractionBlocked { reason: String },

    /// The session itself is unusable: navigation failed, the page never
    /// reached ready state, or the browser went away. Aborts the current
    /// region only.
    #[error("browser session failure: {0}")]
    Session(String),
}

/// Element lookup strategy plus selector, mirroring the WebDriver locator
/// strategies the site requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
    Id(String),
    ClassName(String),
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Locator::Css(selector.to_string())
    }

    pub fn xpath(selector: &str) -> Self {
        Locator::XPath(selector.to_string())
    }

    pub fn id(selector: &str) -> Self {
        Locator::Id(selector.to_string())
    }

    pub fn class_name(selector: &str) -> Self {
        Locator::ClassName(selector.to_string())
    }

    pub fn selector(&self) -> &str {
        match self {
            Locator::Css(s) | Locator::XPath(s) | Locator::Id(s) | Locator::ClassName(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css `{}`", s),
            Locator::XPath(s) => write!(f, "xpath `{}`", s),
            Locator::Id(s) => write!(f, "id `{}`", s),
            Locator::ClassName(s) => write!(f, "class `{}`", s),
        }
    }
}

/// A handle to a DOM element inside a live session.
#[async_trait]
pub trait PageElement: Clone + Send + Sync {
    async fn click(&self) -> Result<(), UiError>;
    async fn text(&self) -> Result<String, UiError>;
    async fn attr(&self, name: &str) -> Result<Option<String>, UiError>;
    async fn find(&self, locator: &Locator) -> Result<Self, UiError>;
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, UiError>;
}

/// One exclusive browser session. Created fresh per region visit and closed
/// on every exit path; never shared.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Elem: PageElement;

    async fn open(&self, url: &str) -> Result<(), UiError>;
    async fn poll_until_ready(&self, timeout: Duration) -> Result<(), UiError>;
    async fn find(&self, locator: &Locator) -> Result<Self::Elem, UiError>;
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Elem>, UiError>;
    async fn scroll_into_view(&self, element: &Self::Elem) -> Result<(), UiError>;
    /// Current scrollHeight of a container, for lazy-load detection.
    async fn content_height(&self, element: &Self::Elem) -> Result<i64, UiError>;
    async fn scroll_to_bottom(&self, element: &Self::Elem) -> Result<(), UiError>;
    async fn quit(self) -> Result<(), UiError>;
}

/// Creates fresh sessions; the coordinator opens one per region.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: BrowserSession;

    async fn create(&self) -> Result<Self::Session, UiError>;
}

/// Ordered fallback element lookup. The same semantic control is exposed
/// under different selectors depending on page state; the chain hides that
/// from callers.
#[derive(Debug, Clone)]
pub struct LocatorChain {
    locators: Vec<Locator>,
}

impl LocatorChain {
    pub fn new(locators: Vec<Locator>) -> Self {
        LocatorChain { locators }
    }

    /// Try each locator in order against the session root. "Not found" from
    /// one strategy advances the chain; exhausting all strategies yields
    /// `Ok(None)`, and callers decide whether that is fatal.
    pub async fn find_first<S: BrowserSession>(
        &self,
        session: &S,
    ) -> Result<Option<S::Elem>, UiError> {
        for locator in &self.locators {
            match session.find(locator).await {
                Ok(element) => return Ok(Some(element)),
                Err(UiError::ElementNotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

/// Poll for an element until it appears or `timeout` elapses. All waits in
/// the harvester are bounded; nothing blocks indefinitely.
pub async fn wait_for_present<S: BrowserSession>(
    session: &S,
    locator: &Locator,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<S::Elem, UiError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match session.find(locator).await {
            Ok(element) => return Ok(element),
            Err(UiError::ElementNotFound { .. }) if tokio::time::Instant::now() < deadline => {
                tokio::time::sleep(poll_interval).await;
            }
            Err(e) => return Err(e),
        }
    }
}
