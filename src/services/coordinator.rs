use crate::domain::event::EventRecord;
use crate::domain::region::Region;

use super::browser::{BrowserSession, SessionFactory, UiError};
use super::catalog::RegionCatalogBuilder;
use super::harvester::EventHarvester;
use super::selection::SelectionProvider;
use super::sink::SinkSet;

/// Drives a full run: catalog discovery, region selection, per-region
/// harvesting with one fresh exclusive session each, aggregation, and
/// sink dispatch. No region failure aborts the run.
pub struct HarvestCoordinator<F: SessionFactory> {
    pub factory: F,
    pub catalog_builder: RegionCatalogBuilder,
    pub harvester: EventHarvester,
}

impl<F: SessionFactory> HarvestCoordinator<F> {
    pub async fn run(
        &self,
        selector: &dyn SelectionProvider,
        sinks: &SinkSet,
    ) -> anyhow::Result<Vec<EventRecord>> {
        let catalog = self.build_catalog().await;
        if catalog.is_empty() {
            log::warn!("Region catalog is empty.");
        }

        let selection = selector.choose(&catalog);
        log::info!("Selected {} region(s) to scrape.", selection.subdomains.len());

        let mut aggregate: Vec<EventRecord> = Vec::new();
        for subdomain in &selection.subdomains {
            match self.harvest_region(subdomain).await {
                Ok(mut records) => {
                    log::info!("Collected {} events from {}.", records.len(), subdomain);
                    aggregate.append(&mut records);
                }
                Err(e) => log::error!("Error while scraping {}: {}", subdomain, e),
            }
        }

        if aggregate.is_empty() {
            log::warn!("No events collected from selected regions.");
            return Ok(aggregate);
        }

        for sink in sinks.for_mode(selection.output) {
            if let Err(e) = sink.write_all(&aggregate).await {
                log::error!("Sink dispatch failed: {:?}", e);
            }
        }

        Ok(aggregate)
    }

    async fn build_catalog(&self) -> Vec<Region> {
        let session = match self.factory.create().await {
            Ok(session) => session,
            Err(e) => {
                log::error!("Could not start a browser session for region discovery: {}", e);
                return Vec::new();
            }
        };

        let catalog = self.catalog_builder.build(&session).await;

        if let Err(e) = session.quit().await {
            log::warn!("Failed to close discovery session: {}", e);
        }
        catalog
    }

    /// The session is closed on every exit path, success or failure.
    async fn harvest_region(&self, subdomain: &str) -> Result<Vec<EventRecord>, UiError> {
        let session = self.factory.create().await?;

        let outcome = self.harvester.harvest(&session, subdomain).await;

        if let Err(e) = session.quit().await {
            log::warn!("Failed to close session for {}: {}", subdomain, e);
        } else {
            log::info!("Driver closed for {}.", subdomain);
        }

        outcome
    }
}
