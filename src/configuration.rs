use std::time::Duration;

use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::PgConnectOptions;

use crate::services::selection::OutputMode;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub webdriver: WebdriverSettings,
    pub harvest: HarvestSettings,
    pub database: DatabaseSettings,
    pub output: OutputSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct WebdriverSettings {
    /// Remote WebDriver server, e.g. http://localhost:4444/wd/hub
    pub server_url: String,
    pub headless: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct HarvestSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_load_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub element_wait_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub location_wait_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub poll_interval_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub click_attempts: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub click_retry_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub page_settle_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub menu_settle_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub marker_settle_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub inter_event_delay_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub scroll_pause_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_scrolls: u32,
    /// When set, the interactive region prompt is skipped and exactly
    /// these subdomains are harvested.
    pub fixed_regions: Option<Vec<String>>,
}

impl HarvestSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn location_wait(&self) -> Duration {
        Duration::from_secs(self.location_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn click_retry_delay(&self) -> Duration {
        Duration::from_millis(self.click_retry_delay_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn menu_settle(&self) -> Duration {
        Duration::from_millis(self.menu_settle_ms)
    }

    pub fn marker_settle(&self) -> Duration {
        Duration::from_millis(self.marker_settle_ms)
    }

    pub fn inter_event_delay(&self) -> Duration {
        Duration::from_millis(self.inter_event_delay_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .port(self.port)
    }

    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct OutputSettings {
    pub csv_path: String,
    /// Output mode used with `fixed_regions`; the interactive prompt asks
    /// for the mode itself.
    pub mode: Option<OutputMode>,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");

    let settings = config::Config::builder()
        .add_source(config::File::from(base_path.join("configuration.yaml")))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
