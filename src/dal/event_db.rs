use sqlx::postgres::PgQueryResult;
use sqlx::PgPool;

/// Upsert a batch of events into a region's collection for one scrape
/// timestamp. A repeated write for the same (collection, scrape_time)
/// appends to the stored events array instead of replacing it.
pub async fn upsert_events(
    pool: &PgPool,
    collection: &str,
    scrape_time: &str,
    events: serde_json::Value,
) -> Result<PgQueryResult, sqlx::Error> {
    sqlx::query(
        r#"
        insert into harvest_events
            (collection, scrape_time, events)
        values
            ($1, $2, $3)
        on conflict(collection, scrape_time) do update set
            events = harvest_events.events || excluded.events
        "#,
    )
    .bind(collection)
    .bind(scrape_time)
    .bind(events)
    .execute(pool)
    .await
}
