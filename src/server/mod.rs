use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::consistency::ConsistencyChecker;
use crate::model::{Character, Location, LoreEntry, Manuscript, Story, TimelineEvent};
use crate::nlp::TextAnalyzer;
use crate::storage::SqliteStore;

pub mod routes;

/// Server state
pub struct AppState {
    pub store: Mutex<SqliteStore>,
    pub checker: ConsistencyChecker,
    pub analyzer: Arc<dyn TextAnalyzer>,
}

impl AppState {
    pub fn new(store: SqliteStore, checker: ConsistencyChecker, analyzer: Arc<dyn TextAnalyzer>) -> Self {
        Self {
            store: Mutex::new(store),
            checker,
            analyzer,
        }
    }
}

/// All REST routes over a shared state
pub fn router(state: Arc<AppState>) -> Router {
    use routes::*;

    Router::new()
        .route("/", get(index))
        .route("/api/stories", get(list::<Story>).post(create::<Story>))
        .route("/api/stories/{id}", get(read::<Story>).put(update::<Story>).delete(remove::<Story>))
        .route("/api/stories/{id}/consistency", get(story_consistency))
        .route("/api/stories/{id}/export", get(export_story))
        .route("/api/characters", get(list::<Character>).post(create::<Character>))
        .route(
            "/api/characters/{id}",
            get(read::<Character>).put(update::<Character>).delete(remove::<Character>),
        )
        .route("/api/characters/{id}/arc", get(character_arc))
        .route("/api/locations", get(list::<Location>).post(create::<Location>))
        .route(
            "/api/locations/{id}",
            get(read::<Location>).put(update::<Location>).delete(remove::<Location>),
        )
        .route("/api/lore", get(list::<LoreEntry>).post(create::<LoreEntry>))
        .route(
            "/api/lore/{id}",
            get(read::<LoreEntry>).put(update::<LoreEntry>).delete(remove::<LoreEntry>),
        )
        .route("/api/timeline", get(list::<TimelineEvent>).post(create::<TimelineEvent>))
        .route(
            "/api/timeline/{id}",
            get(read::<TimelineEvent>).put(update::<TimelineEvent>).delete(remove::<TimelineEvent>),
        )
        .route("/api/manuscripts", get(list::<Manuscript>).post(create::<Manuscript>))
        .route(
            "/api/manuscripts/{id}",
            get(read::<Manuscript>).put(update::<Manuscript>).delete(remove::<Manuscript>),
        )
        .route("/api/manuscripts/{id}/analyze", get(analyze_manuscript))
        .route("/api/ai/timeline-check", post(timeline_check))
        .route("/api/ai/relationships", post(relationships))
        .route("/api/ai/character-arc", post(arc_from_body))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::permissive());
    }
    let origins = origins
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}

pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state)
        .layer(cors_layer(&config.cors_origins)?)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!("Starting server on {}", addr);
    if !crate::output::is_quiet() {
        println!("{} Server running at http://{}", crate::ui::Icons::GLOBE, addr);
    }

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_origins() {
        assert!(cors_layer(&["*".to_string()]).is_ok());
        assert!(cors_layer(&["http://localhost:5173".to_string()]).is_ok());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
