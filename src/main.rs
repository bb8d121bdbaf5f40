use std::time::Duration;

use env_logger::Env;
use magpie::{
    configuration::get_configuration,
    services::{
        ConsoleSelection, CsvSink, DroidFactory, EventHarvester, FixedSelection,
        HarvestCoordinator, OutputMode, RegionCatalogBuilder, SelectionProvider, SinkSet,
        StoreSink,
    },
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let connection_pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy_with(configuration.database.with_db());

    let coordinator = HarvestCoordinator {
        factory: DroidFactory::new(configuration.webdriver.clone()),
        catalog_builder: RegionCatalogBuilder::from_settings(&configuration.harvest),
        harvester: EventHarvester::from_settings(&configuration.harvest),
    };

    let sinks = SinkSet {
        csv: Box::new(CsvSink {
            path: configuration.output.csv_path.clone().into(),
        }),
        store: Box::new(StoreSink {
            pool: connection_pool,
        }),
    };

    let selector: Box<dyn SelectionProvider> = match configuration.harvest.fixed_regions.clone() {
        Some(subdomains) => Box::new(FixedSelection {
            subdomains,
            output: configuration.output.mode.unwrap_or(OutputMode::Csv),
        }),
        None => Box::new(ConsoleSelection),
    };

    if let Err(e) = coordinator.run(selector.as_ref(), &sinks).await {
        log::error!("Scraper encountered an error: {:?}", e);
    }
}
