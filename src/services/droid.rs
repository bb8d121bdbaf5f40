use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::error::WebDriverError;
use thirtyfour::prelude::*;
use thirtyfour::DesiredCapabilities;

use crate::configuration::WebdriverSettings;

use super::browser::{BrowserSession, Locator, PageElement, SessionFactory, UiError};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Production browser session on a remote WebDriver server.
pub struct Droid {
    driver: WebDriver,
}

#[derive(Clone)]
pub struct DroidElement {
    element: WebElement,
}

fn by_for(locator: &Locator) -> By {
    match locator {
        Locator::Css(s) => By::Css(s.as_str()),
        Locator::XPath(s) => By::XPath(s.as_str()),
        Locator::Id(s) => By::Id(s.as_str()),
        Locator::ClassName(s) => By::ClassName(s.as_str()),
    }
}

fn ui_error(e: WebDriverError, context: &str) -> UiError {
    match e {
        WebDriverError::NoSuchElement(info) => UiError::ElementNotFound {
            context: format!("{}: {:?}", context, info),
        },
        WebDriverError::ElementClickIntercepted(info)
        | WebDriverError::ElementNotInteractable(info) => UiError::InteractionBlocked {
            reason: format!("{:?}", info),
        },
        other => UiError::Session(other.to_string()),
    }
}

#[async_trait]
impl PageElement for DroidElement {
    async fn click(&self) -> Result<(), UiError> {
        self.element.click().await.map_err(|e| ui_error(e, "click"))
    }

    async fn text(&self) -> Result<String, UiError> {
        self.element.text().await.map_err(|e| ui_error(e, "text"))
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, UiError> {
        self.element.attr(name).await.map_err(|e| ui_error(e, name))
    }

    async fn find(&self, locator: &Locator) -> Result<Self, UiError> {
        self.element
            .find(by_for(locator))
            .await
            .map(|element| DroidElement { element })
            .map_err(|e| ui_error(e, &locator.to_string()))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self>, UiError> {
        self.element
            .find_all(by_for(locator))
            .await
            .map(|elements| {
                elements
                    .into_iter()
                    .map(|element| DroidElement { element })
                    .collect()
            })
            .map_err(|e| ui_error(e, &locator.to_string()))
    }
}

#[async_trait]
impl BrowserSession for Droid {
    type Elem = DroidElement;

    async fn open(&self, url: &str) -> Result<(), UiError> {
        self.driver
            .goto(url)
            .await
            .map_err(|e| UiError::Session(e.to_string()))
    }

    async fn poll_until_ready(&self, timeout: Duration) -> Result<(), UiError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let ret = self
                .driver
                .execute("return document.readyState", Vec::new())
                .await
                .map_err(|e| UiError::Session(e.to_string()))?;
            let state: String = ret.convert().map_err(|e| UiError::Session(e.to_string()))?;
            if state == "complete" {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(UiError::Session(format!(
                    "page did not reach ready state within {:?}",
                    timeout
                )));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn find(&self, locator: &Locator) -> Result<Self::Elem, UiError> {
        self.driver
            .find(by_for(locator))
            .await
            .map(|element| DroidElement { element })
            .map_err(|e| ui_error(e, &locator.to_string()))
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Elem>, UiError> {
        self.driver
            .find_all(by_for(locator))
            .await
            .map(|elements| {
                elements
                    .into_iter()
                    .map(|element| DroidElement { element })
                    .collect()
            })
            .map_err(|e| ui_error(e, &locator.to_string()))
    }

    async fn scroll_into_view(&self, element: &Self::Elem) -> Result<(), UiError> {
        element
            .element
            .scroll_into_view()
            .await
            .map_err(|e| ui_error(e, "scroll_into_view"))
    }

    async fn content_height(&self, element: &Self::Elem) -> Result<i64, UiError> {
        let arg = element
            .element
            .to_json()
            .map_err(|e| UiError::Session(e.to_string()))?;
        let ret = self
            .driver
            .execute("return arguments[0].scrollHeight", vec![arg])
            .await
            .map_err(|e| UiError::Session(e.to_string()))?;
        ret.convert().map_err(|e| UiError::Session(e.to_string()))
    }

    async fn scroll_to_bottom(&self, element: &Self::Elem) -> Result<(), UiError> {
        let arg = element
            .element
            .to_json()
            .map_err(|e| UiError::Session(e.to_string()))?;
        self.driver
            .execute("arguments[0].scrollTop = arguments[0].scrollHeight", vec![arg])
            .await
            .map_err(|e| UiError::Session(e.to_string()))?;
        Ok(())
    }

    async fn quit(self) -> Result<(), UiError> {
        self.driver
            .quit()
            .await
            .map_err(|e| UiError::Session(e.to_string()))
    }
}

/// Starts one fresh browser per call against the configured WebDriver
/// server.
pub struct DroidFactory {
    settings: WebdriverSettings,
}

impl DroidFactory {
    pub fn new(settings: WebdriverSettings) -> Self {
        DroidFactory { settings }
    }
}

#[async_trait]
impl SessionFactory for DroidFactory {
    type Session = Droid;

    async fn create(&self) -> Result<Droid, UiError> {
        let mut caps = DesiredCapabilities::chrome();
        if self.settings.headless {
            caps.set_headless()
                .map_err(|e| UiError::Session(e.to_string()))?;
        }
        caps.add_arg("--disable-notifications")
            .map_err(|e| UiError::Session(e.to_string()))?;

        let driver = WebDriver::new(&self.settings.server_url, caps)
            .await
            .map_err(|e| UiError::Session(format!("failed to start browser session: {}", e)))?;

        if let Err(e) = driver.maximize_window().await {
            log::warn!("Could not maximize browser window: {}", e);
        }

        Ok(Droid { driver })
    }
}
