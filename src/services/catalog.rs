use std::collections::HashSet;
use std::time::Duration;

use crate::configuration::HarvestSettings;
use crate::domain::region::{is_reserved_subdomain, subdomain_from_url, Region};

use super::browser::{wait_for_present, BrowserSession, Locator, PageElement, UiError};
use super::interaction::{InteractionRetrier, LazyListExpander};

const HOME_URL: &str = "https://liveuamap.com";
const SITE_DOMAIN: &str = "liveuamap.com";
/// Class marker on menu entries that expand into nested subregions.
const PARENT_CLASS_MARKER: &str = "hasLvl";

fn region_menu_button() -> Locator {
    Locator::id("modalRegions")
}

fn menu_container() -> Locator {
    Locator::css("div.modal-body")
}

fn region_entry() -> Locator {
    Locator::css("a.modalRegName")
}

fn subregion_entry() -> Locator {
    Locator::css("li.col-md-4 > a[href*='liveuamap.com']")
}

fn return_control() -> Locator {
    Locator::css("a.retallregs")
}

/// Walks the region-selection menu into a flat, deduplicated catalog of
/// regions. Parent entries are expanded exactly one level deep; the site's
/// hierarchy has no deeper nesting.
pub struct RegionCatalogBuilder {
    pub retrier: InteractionRetrier,
    pub expander: LazyListExpander,
    pub page_load_timeout: Duration,
    pub element_wait: Duration,
    pub poll_interval: Duration,
    pub page_settle: Duration,
    pub menu_settle: Duration,
}

impl RegionCatalogBuilder {
    pub fn from_settings(settings: &HarvestSettings) -> Self {
        RegionCatalogBuilder {
            retrier: InteractionRetrier {
                max_attempts: settings.click_attempts,
                delay: settings.click_retry_delay(),
            },
            expander: LazyListExpander {
                pause: settings.scroll_pause(),
                max_scrolls: settings.max_scrolls,
            },
            page_load_timeout: settings.page_load_timeout(),
            element_wait: settings.element_wait(),
            poll_interval: settings.poll_interval(),
            page_settle: settings.page_settle(),
            menu_settle: settings.menu_settle(),
        }
    }

    /// Build the catalog. If the menu cannot be opened at all the run
    /// proceeds with an empty catalog instead of failing.
    pub async fn build<S: BrowserSession>(&self, session: &S) -> Vec<Region> {
        match self.try_build(session).await {
            Ok(catalog) => {
                log::info!("Found {} valid regions.", catalog.len());
                catalog
            }
            Err(e) => {
                log::error!("Could not open region selector: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_build<S: BrowserSession>(&self, session: &S) -> Result<Vec<Region>, UiError> {
        session.open(HOME_URL).await?;
        session.poll_until_ready(self.page_load_timeout).await?;
        tokio::time::sleep(self.page_settle).await;

        let open_button = wait_for_present(
            session,
            &region_menu_button(),
            self.element_wait,
            self.poll_interval,
        )
        .await?;
        session.scroll_into_view(&open_button).await?;
        if !self.retrier.click(&open_button).await? {
            return Err(UiError::Session(
                "region selector button never became clickable".to_string(),
            ));
        }
        log::info!("Clicked 'Select regions' button.");
        tokio::time::sleep(self.menu_settle).await;

        // All entries must be loaded before enumeration; the menu loads
        // them incrementally on scroll.
        self.expand_menu(session).await;
        wait_for_present(session, &region_entry(), self.element_wait, self.poll_interval).await?;

        let mut catalog: Vec<Region> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        let total = session.find_all(&region_entry()).await?.len();
        for idx in 0..total {
            // Re-query each step: expanding a parent and returning reloads
            // the list and stales earlier handles.
            let entries = session.find_all(&region_entry()).await?;
            let Some(entry) = entries.get(idx) else {
                break;
            };
            if let Err(e) = self.visit_entry(session, entry, &mut catalog, &mut seen).await {
                log::warn!("Error processing region entry {}: {}", idx + 1, e);
            }
        }

        Ok(catalog)
    }

    async fn visit_entry<S: BrowserSession>(
        &self,
        session: &S,
        entry: &S::Elem,
        catalog: &mut Vec<Region>,
        seen: &mut HashSet<String>,
    ) -> Result<(), UiError> {
        let class_attr = entry.attr("class").await?.unwrap_or_default();
        if class_attr.contains(PARENT_CLASS_MARKER) {
            return self.expand_parent(session, entry, catalog, seen).await;
        }

        let Some(href) = entry.attr("href").await? else {
            return Ok(());
        };
        if !href.contains(SITE_DOMAIN) {
            return Ok(());
        }
        let Some(subdomain) = subdomain_from_url(&href) else {
            return Ok(());
        };
        if is_reserved_subdomain(&subdomain) {
            return Ok(());
        }
        if let Some(name) = display_name(entry).await? {
            record_region(catalog, seen, name, subdomain);
        }
        Ok(())
    }

    async fn expand_parent<S: BrowserSession>(
        &self,
        session: &S,
        entry: &S::Elem,
        catalog: &mut Vec<Region>,
        seen: &mut HashSet<String>,
    ) -> Result<(), UiError> {
        let title = entry.attr("title").await?.unwrap_or_default();
        log::debug!("Expanding parent region: {}", title);

        if !self.retrier.click(entry).await? {
            log::warn!("Failed to expand parent region {}", title);
            return Ok(());
        }
        tokio::time::sleep(self.menu_settle).await;
        self.expand_menu(session).await;

        match session.find_all(&subregion_entry()).await {
            Ok(children) => {
                for child in children {
                    let Some(href) = child.attr("href").await? else {
                        continue;
                    };
                    let Some(subdomain) = subdomain_from_url(&href) else {
                        continue;
                    };
                    if is_reserved_subdomain(&subdomain) {
                        continue;
                    }
                    if let Some(name) = display_name(&child).await? {
                        record_region(catalog, seen, name, subdomain);
                    }
                }
            }
            Err(e) => log::warn!("Failed extracting subregions from {}: {}", title, e),
        }

        // Back to the top-level list, which reloads and must be re-expanded.
        match session.find(&return_control()).await {
            Ok(control) => {
                if !self.retrier.click(&control).await? {
                    log::warn!("Return-to-all-regions control never became clickable");
                }
                tokio::time::sleep(self.menu_settle).await;
                self.expand_menu(session).await;
            }
            Err(e) => log::warn!("Could not return to all regions after {}: {}", title, e),
        }

        Ok(())
    }

    async fn expand_menu<S: BrowserSession>(&self, session: &S) {
        match session.find(&menu_container()).await {
            Ok(container) => {
                if let Err(e) = self.expander.expand_to_bottom(session, &container).await {
                    log::warn!("Failed to scroll region menu: {}", e);
                }
            }
            Err(e) => log::warn!("Region menu container not present: {}", e),
        }
    }
}

/// Visible link text, falling back to the title attribute. Entries with
/// neither are skipped.
async fn display_name<E: PageElement>(entry: &E) -> Result<Option<String>, UiError> {
    let text = entry.text().await?.trim().to_string();
    if !text.is_empty() {
        return Ok(Some(text));
    }
    let title = entry.attr("title").await?.unwrap_or_default().trim().to_string();
    Ok((!title.is_empty()).then_some(title))
}

fn record_region(
    catalog: &mut Vec<Region>,
    seen: &mut HashSet<String>,
    name: String,
    subdomain: String,
) {
    if seen.insert(subdomain.clone()) {
        log::debug!("Region added: {} ({})", name, subdomain);
        catalog.push(Region { name, subdomain });
    }
}
