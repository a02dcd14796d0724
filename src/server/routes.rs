use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::consistency::{ArcReport, Conflict, ConsistencyReport, DevelopmentHint, RelationshipSuggestion};
use crate::model::{apply_patch, Character, Manuscript, TimelineEvent};
use crate::nlp::{AnalysisMode, ManuscriptReport};
use crate::server::AppState;
use crate::storage::Record;
use crate::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Request body, decoded by the handler so shape errors become a 400
pub type Body = Result<Json<Value>, JsonRejection>;

#[derive(Debug, Default, Deserialize)]
pub struct StoryFilter {
    pub story_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeParams {
    pub mode: Option<String>,
}

/// Items stay raw JSON so one malformed record cannot fail the request
#[derive(Debug, Deserialize)]
pub struct TimelineCheckRequest {
    #[serde(default)]
    pub events: Vec<Value>,
    #[serde(default)]
    pub characters: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipsRequest {
    #[serde(default)]
    pub characters: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct ArcResponse {
    pub character_id: i64,
    pub name: String,
    #[serde(flatten)]
    pub arc: ArcReport,
    pub development: Vec<DevelopmentHint>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

fn api_error(err: Error) -> ApiError {
    match err {
        Error::NotFound(_) => error_response(StatusCode::NOT_FOUND, err.to_string()),
        Error::InvalidInput(msg) => error_response(StatusCode::BAD_REQUEST, msg),
        other => {
            tracing::error!("Request failed: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

fn join_error(err: tokio::task::JoinError) -> ApiError {
    tracing::error!("Analysis task failed: {}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "analysis task failed")
}

fn body_value(body: Body) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| error_response(StatusCode::BAD_REQUEST, rejection.body_text()))
}

fn decode<T: DeserializeOwned>(body: Body) -> Result<T, ApiError> {
    serde_json::from_value(body_value(body)?)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e)))
}

/// Decode each item on its own, skipping the ones that cannot be read
fn decode_items<T>(items: Vec<Value>, kind: &str, convert: fn(Value) -> crate::Result<T>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match convert(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping {} #{}: {}", kind, index, e);
                None
            }
        })
        .collect()
}

pub async fn index(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(serde_json::json!({
        "name": "storyteller",
        "version": env!("CARGO_PKG_VERSION"),
        "analyzer": state.analyzer.name(),
    }))
}

// ========== Generic CRUD ==========

pub async fn list<T: Record>(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<StoryFilter>,
) -> ApiResult<Vec<T>> {
    let store = state.store.lock().await;
    T::list(&store, filter.story_id).map(Json).map_err(api_error)
}

pub async fn create<T: Record>(
    State(state): State<Arc<AppState>>,
    body: Body,
) -> Result<(StatusCode, Json<T>), ApiError> {
    let record: T = decode(body)?;
    record.validate().map_err(api_error)?;

    let store = state.store.lock().await;
    let saved = T::insert(&store, &record).map_err(api_error)?;
    tracing::info!("Created {} {}", T::NAME, saved.id());
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn read<T: Record>(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<T> {
    let store = state.store.lock().await;
    T::fetch(&store, id).map(Json).map_err(api_error)
}

/// Partial update: only the keys present in the body change.
pub async fn update<T: Record>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Body,
) -> ApiResult<T> {
    let patch = body_value(body)?;

    let store = state.store.lock().await;
    let current = T::fetch(&store, id).map_err(api_error)?;
    let merged = apply_patch(&current, &patch).map_err(api_error)?;
    merged.validate().map_err(api_error)?;
    T::update(&store, &merged).map_err(api_error)?;
    Ok(Json(merged))
}

pub async fn remove<T: Record>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.lock().await;
    T::delete(&store, id).map_err(api_error)?;
    tracing::info!("Deleted {} {}", T::NAME, id);
    Ok(StatusCode::NO_CONTENT)
}

// ========== Story Tools ==========

pub async fn story_consistency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<ConsistencyReport> {
    let snapshot = {
        let store = state.store.lock().await;
        store.load_snapshot(id).map_err(api_error)?
    };
    Ok(Json(state.checker.check_snapshot(&snapshot)))
}

pub async fn export_story(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<([(header::HeaderName, &'static str); 1], String), ApiError> {
    let store = state.store.lock().await;
    let markdown = crate::export::export_story(&store, id).map_err(api_error)?;
    Ok(([(header::CONTENT_TYPE, "text/markdown; charset=utf-8")], markdown))
}

async fn arc_report(state: Arc<AppState>, character: Character) -> ApiResult<ArcResponse> {
    tokio::task::spawn_blocking(move || {
        let arc = state
            .checker
            .analyze_character_arc_coherence(&character, state.analyzer.as_ref());
        let development = state.checker.suggest_character_development(&character);
        Json(ArcResponse {
            character_id: character.id,
            name: character.name,
            arc,
            development,
        })
    })
    .await
    .map_err(join_error)
}

pub async fn character_arc(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> ApiResult<ArcResponse> {
    let character = {
        let store = state.store.lock().await;
        Character::fetch(&store, id).map_err(api_error)?
    };
    arc_report(state, character).await
}

pub async fn analyze_manuscript(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<AnalyzeParams>,
) -> ApiResult<ManuscriptReport> {
    let mode = match params.mode.as_deref() {
        Some(raw) => raw.parse::<AnalysisMode>().map_err(api_error)?,
        None => AnalysisMode::default(),
    };

    let (manuscript, characters, events) = {
        let store = state.store.lock().await;
        let manuscript = Manuscript::fetch(&store, id).map_err(api_error)?;
        let characters = store.list_characters(Some(manuscript.story_id)).map_err(api_error)?;
        let events = store.list_events(manuscript.story_id).map_err(api_error)?;
        (manuscript, characters, events)
    };

    tokio::task::spawn_blocking(move || {
        Json(crate::nlp::analyze_manuscript(
            &manuscript,
            &characters,
            &events,
            mode,
            state.analyzer.as_ref(),
            &state.checker,
        ))
    })
    .await
    .map_err(join_error)
}

// ========== Stateless Checks ==========

pub async fn timeline_check(State(state): State<Arc<AppState>>, body: Body) -> ApiResult<Vec<Conflict>> {
    let request: TimelineCheckRequest = decode(body)?;
    let events = decode_items(request.events, "event", TimelineEvent::from_loose);
    let characters = decode_items(request.characters, "character", Character::from_loose);
    Ok(Json(state.checker.check_timeline_consistency(&events, &characters)))
}

pub async fn relationships(
    State(state): State<Arc<AppState>>,
    body: Body,
) -> ApiResult<Vec<RelationshipSuggestion>> {
    let request: RelationshipsRequest = decode(body)?;
    let characters = decode_items(request.characters, "character", Character::from_loose);
    Ok(Json(state.checker.suggest_relationships(&characters)))
}

pub async fn arc_from_body(State(state): State<Arc<AppState>>, body: Body) -> ApiResult<ArcResponse> {
    let character: Character = decode(body)?;
    arc_report(state, character).await
}
