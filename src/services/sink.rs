use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Local;
use sqlx::PgPool;

use crate::dal::event_db;
use crate::domain::event::EventRecord;

use super::selection::OutputMode;

#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn write_all(&self, records: &[EventRecord]) -> anyhow::Result<()>;
}

/// The sinks available to a run; the selected output mode picks from them.
pub struct SinkSet {
    pub csv: Box<dyn RecordSink>,
    pub store: Box<dyn RecordSink>,
}

impl SinkSet {
    pub fn for_mode(&self, mode: OutputMode) -> Vec<&dyn RecordSink> {
        match mode {
            OutputMode::Csv => vec![self.csv.as_ref()],
            OutputMode::Store => vec![self.store.as_ref()],
            OutputMode::Both => vec![self.csv.as_ref(), self.store.as_ref()],
        }
    }
}

/// Writes a header row from the record's field names followed by one row
/// per record. An empty sequence is a logged no-op.
pub struct CsvSink {
    pub path: PathBuf,
}

#[async_trait]
impl RecordSink for CsvSink {
    async fn write_all(&self, records: &[EventRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            log::info!("No data to save.");
            return Ok(());
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        log::info!("Saved {} events to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Document-store sink: per region, one document per scrape timestamp
/// holding the array of events; a second write within the same timestamp
/// appends to the existing array.
pub struct StoreSink {
    pub pool: PgPool,
}

#[async_trait]
impl RecordSink for StoreSink {
    async fn write_all(&self, records: &[EventRecord]) -> anyhow::Result<()> {
        if records.is_empty() {
            log::info!("No data to store.");
            return Ok(());
        }

        let scrape_time = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        for (collection, group) in group_by_region(records) {
            let events = serde_json::to_value(&group)?;
            event_db::upsert_events(&self.pool, &collection, &scrape_time, events).await?;
            log::info!(
                "Upserted {} events into collection {} at {}",
                group.len(),
                collection,
                scrape_time
            );
        }

        Ok(())
    }
}

/// Group records by their region tag, preserving first-seen region order
/// and per-region record order. Collection names are lowercase.
fn group_by_region(records: &[EventRecord]) -> Vec<(String, Vec<EventRecord>)> {
    let mut groups: Vec<(String, Vec<EventRecord>)> = Vec::new();
    for record in records {
        let collection = record.region.to_lowercase();
        match groups.iter_mut().find(|(name, _)| *name == collection) {
            Some((_, group)) => group.push(record.clone()),
            None => groups.push((collection, vec![record.clone()])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::{group_by_region, CsvSink, RecordSink};
    use crate::domain::event::EventRecord;

    fn record(region: &str, location: &str) -> EventRecord {
        EventRecord {
            region: region.to_string(),
            date: "2024-01-01".to_string(),
            source_url: "http://a".to_string(),
            title: "t".to_string(),
            image_url: "http://i".to_string(),
            location: location.to_string(),
        }
    }

    #[tokio::test]
    async fn csv_round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");
        let records = vec![record("ukraine", "Kyiv")];

        let sink = CsvSink { path: path.clone() };
        sink.write_all(&records).await.unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(|h| h.to_string())
            .collect();
        assert_eq!(
            headers,
            vec!["region", "date", "source_url", "title", "image_url", "location"]
        );

        let rows: Vec<EventRecord> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, records);
    }

    #[tokio::test]
    async fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.csv");

        let sink = CsvSink { path: path.clone() };
        sink.write_all(&[]).await.unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn grouping_preserves_order_and_lowercases_collections() {
        let records = vec![
            record("Ukraine", "Kyiv"),
            record("china", "Beijing"),
            record("Ukraine", "Lviv"),
        ];

        let groups = group_by_region(&records);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "ukraine");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].location, "Lviv");
        assert_eq!(groups[1].0, "china");
    }
}
