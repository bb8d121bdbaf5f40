use std::time::Duration;

use crate::configuration::HarvestSettings;
use crate::domain::event::{
    EventRecord, DATA_NOT_FOUND, DATE_NOT_FOUND, IMAGE_NOT_FOUND, LOCATION_NOT_FOUND,
    SOURCE_NOT_FOUND,
};

use super::browser::{wait_for_present, BrowserSession, Locator, LocatorChain, PageElement, UiError};
use super::interaction::InteractionRetrier;

fn event_list_container() -> Locator {
    Locator::class_name("scroller")
}

fn event_marker() -> Locator {
    Locator::css("div[class^='event cat']")
}

fn marker_time() -> Locator {
    Locator::class_name("marker-time")
}

/// The "continue to map" control moves around depending on page state.
fn map_link_chain() -> LocatorChain {
    LocatorChain::new(vec![
        Locator::xpath("//*[@id='top']/div[2]/div[2]/div[2]/div[4]/a"),
        Locator::css("div.map_link_par a.map-link"),
    ])
}

/// Per-region extraction loop: one structured record per visible event
/// marker, with per-field sentinels and per-marker failure isolation.
pub struct EventHarvester {
    pub retrier: InteractionRetrier,
    pub page_load_timeout: Duration,
    pub element_wait: Duration,
    pub location_wait: Duration,
    pub poll_interval: Duration,
    pub marker_settle: Duration,
    pub inter_event_delay: Duration,
}

impl EventHarvester {
    pub fn from_settings(settings: &HarvestSettings) -> Self {
        EventHarvester {
            retrier: InteractionRetrier {
                max_attempts: settings.click_attempts,
                delay: settings.click_retry_delay(),
            },
            page_load_timeout: settings.page_load_timeout(),
            element_wait: settings.element_wait(),
            location_wait: settings.location_wait(),
            poll_interval: settings.poll_interval(),
            marker_settle: settings.marker_settle(),
            inter_event_delay: settings.inter_event_delay(),
        }
    }

    /// Harvest every event marker on a region's feed. A region whose event
    /// list never appears yields zero records rather than failing the run.
    pub async fn harvest<S: BrowserSession>(
        &self,
        session: &S,
        subdomain: &str,
    ) -> Result<Vec<EventRecord>, UiError> {
        let url = format!("https://{}.liveuamap.com/", subdomain);
        log::info!("Visiting {}", url);

        session.open(&url).await?;
        session.poll_until_ready(self.page_load_timeout).await?;

        match wait_for_present(
            session,
            &event_list_container(),
            self.element_wait,
            self.poll_interval,
        )
        .await
        {
            Ok(_) => {}
            Err(UiError::ElementNotFound { .. }) => {
                log::warn!("No event list found on {}", url);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        }

        let markers = session.find_all(&event_marker()).await?;
        let mut records = Vec::new();

        for (idx, marker) in markers.iter().enumerate() {
            log::info!("Processing event {} of {} in {}", idx + 1, markers.len(), subdomain);
            match self.process_marker(session, marker, subdomain).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    log::error!("Error during processing event {} in {}: {}", idx + 1, subdomain, e)
                }
            }
            tokio::time::sleep(self.inter_event_delay).await;
        }

        Ok(records)
    }

    async fn process_marker<S: BrowserSession>(
        &self,
        session: &S,
        marker: &S::Elem,
        subdomain: &str,
    ) -> Result<EventRecord, UiError> {
        // The first click selects the marker, the second reveals the detail
        // pane. Both clicks are required; this is a quirk of the site.
        self.retrier.click(marker).await?;
        tokio::time::sleep(self.marker_settle).await;
        self.retrier.click(marker).await?;

        let location = self.extract_location(session).await;

        self.open_map_view(session).await;

        let date = text_or(marker, &Locator::css("span.date_add"), DATE_NOT_FOUND).await;
        let source_url =
            attr_or(marker, &Locator::css("a.source-link"), "href", SOURCE_NOT_FOUND).await;
        let title = text_or(marker, &Locator::css("div.title"), DATA_NOT_FOUND).await;
        let image_url = attr_or(marker, &Locator::css("label img"), "src", IMAGE_NOT_FOUND).await;

        Ok(EventRecord {
            region: subdomain.to_string(),
            date,
            source_url,
            title,
            image_url,
            location,
        })
    }

    /// The location lives in a marker-time element that appears only after
    /// the detail pane opens, so it is polled rather than looked up once.
    async fn extract_location<S: BrowserSession>(&self, session: &S) -> String {
        let marker_time = match wait_for_present(
            session,
            &marker_time(),
            self.location_wait,
            self.poll_interval,
        )
        .await
        {
            Ok(element) => element,
            Err(_) => return LOCATION_NOT_FOUND.to_string(),
        };

        match marker_time.find(&Locator::css("a")).await {
            Ok(link) => match link.text().await {
                Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
                _ => LOCATION_NOT_FOUND.to_string(),
            },
            Err(_) => LOCATION_NOT_FOUND.to_string(),
        }
    }

    /// Best effort; absence of the control is logged but never aborts the
    /// marker.
    async fn open_map_view<S: BrowserSession>(&self, session: &S) {
        match map_link_chain().find_first(session).await {
            Ok(Some(link)) => {
                if let Err(e) = link.click().await {
                    log::warn!("Failed to open map view: {}", e);
                }
            }
            Ok(None) => log::warn!("No jump-to-map link found."),
            Err(e) => log::warn!("Error locating jump-to-map link: {}", e),
        }
    }
}

async fn text_or<E: PageElement>(root: &E, locator: &Locator, sentinel: &str) -> String {
    match root.find(locator).await {
        Ok(element) => match element.text().await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => sentinel.to_string(),
        },
        Err(_) => sentinel.to_string(),
    }
}

async fn attr_or<E: PageElement>(root: &E, locator: &Locator, name: &str, sentinel: &str) -> String {
    match root.find(locator).await {
        Ok(element) => match element.attr(name).await {
            Ok(Some(value)) => value,
            _ => sentinel.to_string(),
        },
        Err(_) => sentinel.to_string(),
    }
}
