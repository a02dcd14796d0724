//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - stories(id, title, synopsis, blurb, genre)
//! - characters, locations, lore_entries, manuscripts (each keyed by story_id)
//! - timeline_events(id, story_id, title, date, sort_order, summary, location_id)
//! - event_characters(event_id, character_id, position)

pub mod record;
pub mod schema;
pub mod sqlite;

pub use record::Record;
pub use sqlite::{DbStats, SqliteStore};
