//! # Storyteller - Story Bible Backend
//!
//! Keeps the facts of a story straight while it is being written.
//!
//! Storyteller provides:
//! - A canonical model for stories, characters, locations, lore, timeline events and manuscripts
//! - SQLite-backed storage with per-story snapshots
//! - A consistency checker for timeline contradictions and relationship hints
//! - Pluggable text analysis (lexical or local embeddings) for manuscripts
//! - A REST server and a command-line interface over the same store

pub mod model;
pub mod consistency;
pub mod nlp;
pub mod storage;
pub mod export;
pub mod server;
pub mod output;
pub mod config;
pub mod seed;
pub mod ui;

// Re-exports for convenient access
pub use model::{Character, Location, LoreEntry, Manuscript, Story, StorySnapshot, TimelineEvent};
pub use consistency::{CheckerConfig, Conflict, ConflictKind, ConsistencyChecker, RelationshipSuggestion};
pub use nlp::{TextAnalyzer, TextSimilarity};
pub use storage::{DbStats, Record, SqliteStore};

/// Result type alias for Storyteller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Storyteller operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Analyzer error: {0}")]
    Analyzer(String),
}
