pub mod event_db;
