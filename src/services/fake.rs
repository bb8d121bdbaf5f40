//! Scripted in-memory browser for exercising the harvesting state machine
//! without a real WebDriver server.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::event::EventRecord;

use super::browser::{BrowserSession, Locator, PageElement, SessionFactory, UiError};
use super::sink::RecordSink;

/// How a fake element reacts to clicks.
#[derive(Debug, Clone, Copy, Default)]
pub enum ClickScript {
    #[default]
    Succeed,
    /// Obscured forever; every click fails as InteractionBlocked.
    AlwaysBlocked,
    /// Obscured for the first n clicks, then clickable.
    BlockedTimes(u32),
    /// Click fails with a session-level error.
    Fail,
}

struct FakeElementInner {
    text: String,
    attrs: HashMap<String, String>,
    children: HashMap<String, Vec<FakeElement>>,
    click: ClickScript,
    clicks: Mutex<u32>,
}

#[derive(Clone)]
pub struct FakeElement {
    inner: Arc<FakeElementInner>,
}

impl FakeElement {
    pub fn builder() -> FakeElementBuilder {
        FakeElementBuilder::default()
    }

    pub fn click_count(&self) -> u32 {
        *self.inner.clicks.lock().unwrap()
    }
}

#[derive(Default)]
pub struct FakeElementBuilder {
    text: String,
    attrs: HashMap<String, String>,
    children: HashMap<String, Vec<FakeElement>>,
    click: ClickScript,
}

impl FakeElementBuilder {
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, selector: &str, element: FakeElement) -> Self {
        self.children
            .entry(selector.to_string())
            .or_default()
            .push(element);
        self
    }

    pub fn click(mut self, script: ClickScript) -> Self {
        self.click = script;
        self
    }

    pub fn build(self) -> FakeElement {
        FakeElement {
            inner: Arc::new(FakeElementInner {
                text: self.text,
                attrs: self.attrs,
                children: self.children,
                click: self.click,
                clicks: Mutex::new(0),
            }),
        }
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn click(&self) -> Result<(), UiError> {
        let count = {
            let mut clicks = self.inner.clicks.lock().unwrap();
            *clicks += 1;
            *clicks
        };
        match self.inner.click {
            ClickScript::Succeed => Ok(()),
            ClickScript::AlwaysBlocked => Err(UiError::InteractionBlocked {
                reason: "scripted overlay".to_string(),
            }),
            ClickScript::BlockedTimes(n) if count <= n => Err(UiError::InteractionBlocked {
                reason: "scripted overlay".to_string(),
            }),
            ClickScript::BlockedTimes(_) => Ok(()),
            ClickScript::Fail => Err(UiError::Session("scripted click failure".to_string())),
        }
    }

    async fn text(&self) -> Result<String, UiError> {
        Ok(self.inner.text.clone())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, UiError> {
        Ok(self.inner.attrs.get(name).cloned())
    }

    async fn find(&self, locator: &Locator) -> Result<Self, UiError> {
        self.inner
            .children
            .get(locator.selector())
            .and_then(|elements| elements.first())
            .cloned()
            .ok_or_else(|| UiError::ElementNotFound {
                context: locator.to_string(),
            })
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, UiError> {
        Ok(self
            .inner
            .children
            .get(locator.selector())
            .cloned()
            .unwrap_or_default())
    }
}

/// A scripted page: elements keyed by selector, plus a height sequence for
/// lazy-load scrolling.
#[derive(Default)]
pub struct FakeSession {
    elements: HashMap<String, Vec<FakeElement>>,
    heights: Mutex<VecDeque<i64>>,
    scrolls: Mutex<u32>,
    opened: Mutex<Vec<String>>,
    open_fails: bool,
}

impl FakeSession {
    pub fn new() -> Self {
        FakeSession::default()
    }

    pub fn with_elements(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }

    /// Heights reported by successive `content_height` calls; the last one
    /// repeats forever.
    pub fn with_heights(self, heights: Vec<i64>) -> Self {
        *self.heights.lock().unwrap() = heights.into();
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.open_fails = true;
        self
    }

    pub fn scroll_count(&self) -> u32 {
        *self.scrolls.lock().unwrap()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Elem = FakeElement;

    async fn open(&self, url: &str) -> Result<(), UiError> {
        if self.open_fails {
            return Err(UiError::Session("scripted navigation failure".to_string()));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn poll_until_ready(&self, _timeout: Duration) -> Result<(), UiError> {
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> Result<Self::Elem, UiError> {
        self.elements
            .get(locator.selector())
            .and_then(|elements| elements.first())
            .cloned()
            .ok_or_else(|| UiError::ElementNotFound {
                context: locator.to_string(),
            })
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Elem>, UiError> {
        Ok(self
            .elements
            .get(locator.selector())
            .cloned()
            .unwrap_or_default())
    }

    async fn scroll_into_view(&self, _element: &Self::Elem) -> Result<(), UiError> {
        Ok(())
    }

    async fn content_height(&self, _element: &Self::Elem) -> Result<i64, UiError> {
        let mut heights = self.heights.lock().unwrap();
        match heights.len() {
            0 => Ok(0),
            1 => Ok(heights[0]),
            _ => Ok(heights.pop_front().unwrap()),
        }
    }

    async fn scroll_to_bottom(&self, _element: &Self::Elem) -> Result<(), UiError> {
        *self.scrolls.lock().unwrap() += 1;
        Ok(())
    }

    async fn quit(self) -> Result<(), UiError> {
        Ok(())
    }
}

/// Hands out a scripted sequence of sessions; `None` entries fail the
/// creation attempt.
pub struct FakeFactory {
    sessions: Mutex<VecDeque<Option<FakeSession>>>,
}

impl FakeFactory {
    pub fn new(sessions: Vec<Option<FakeSession>>) -> Self {
        FakeFactory {
            sessions: Mutex::new(sessions.into()),
        }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn create(&self) -> Result<FakeSession, UiError> {
        match self.sessions.lock().unwrap().pop_front() {
            Some(Some(session)) => Ok(session),
            Some(None) => Err(UiError::Session("scripted session failure".to_string())),
            None => Err(UiError::Session("no scripted sessions left".to_string())),
        }
    }
}

/// Sink that remembers everything dispatched to it.
#[derive(Clone, Default)]
pub struct CollectingSink {
    records: Arc<Mutex<Vec<EventRecord>>>,
}

impl CollectingSink {
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSink for CollectingSink {
    async fn write_all(&self, records: &[EventRecord]) -> anyhow::Result<()> {
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }
}
