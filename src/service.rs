//! JSON HTTP surface. Every response carries `success`; failures carry `error`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::anki::{self, CardAnalysis, FlashcardRecord};
use crate::audio::{AudioLocation, AudioLocator};
use crate::catalog;
use crate::error::{AppError, Result};
use crate::generator::{GeneratedSentence, SentenceGenerator};
use crate::rate_limiter::{LimitType, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub generator: SentenceGenerator,
    pub locator: AudioLocator,
    pub rate_limiter: Arc<RateLimiter>,
}

/// Build the router: API routes under `api_prefix`, the audio cache under
/// `audio_url_prefix`.
pub fn router(state: AppState, api_prefix: &str, audio_url_prefix: &str) -> Router {
    let audio_dir = state.locator.dir().to_path_buf();

    let api = Router::new()
        .route("/levels", get(levels))
        .route("/topics", get(topics))
        .route("/generate-sentence", post(generate_sentence))
        .route("/generate-audio", post(generate_audio))
        .route("/export-anki", post(export_anki))
        .with_state(state);

    let api_prefix = api_prefix.trim_end_matches('/');
    let app = if api_prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(api_prefix, api)
    };

    let audio_url_prefix = audio_url_prefix.trim_end_matches('/');
    let app = if audio_url_prefix.is_empty() {
        app.fallback_service(ServeDir::new(audio_dir))
    } else {
        app.nest_service(audio_url_prefix, ServeDir::new(audio_dir))
    };

    app.layer(CorsLayer::permissive())
}

/// Peer IP when served with connect info, `"local"` otherwise.
pub struct ClientId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "local".to_string());
        Ok(ClientId(id))
    }
}

#[derive(Serialize)]
struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

fn success<T>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(req)| req)
        .map_err(|e| AppError::invalid(e.body_text()))
}

fn admit(state: &AppState, client: &ClientId, kind: LimitType) -> Result<()> {
    if state.rate_limiter.check(&client.0, kind) {
        Ok(())
    } else {
        log::warn!("Rate limited: {:?} for client {}", kind, client.0);
        Err(AppError::RateLimited)
    }
}

#[derive(Serialize)]
struct LevelsBody {
    levels: std::collections::BTreeMap<&'static str, &'static str>,
}

async fn levels() -> Json<Success<LevelsBody>> {
    success(LevelsBody {
        levels: catalog::list_levels(),
    })
}

#[derive(Serialize)]
struct TopicsBody {
    topics: &'static [&'static str],
}

async fn topics() -> Json<Success<TopicsBody>> {
    success(TopicsBody {
        topics: catalog::list_topics(),
    })
}

#[derive(Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    topic: Option<String>,
}

async fn generate_sentence(
    State(state): State<AppState>,
    client: ClientId,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Success<GeneratedSentence>>> {
    admit(&state, &client, LimitType::Generate)?;
    let req = body(payload)?;
    let level = req.level.unwrap_or_else(|| "A1".to_string());
    let topic = req.topic.unwrap_or_else(|| "Daily Routine".to_string());

    log::info!("Received generate request: level={} topic={}", level, topic);
    let generated = state.generator.generate(&level, &topic).await?;
    Ok(success(generated))
}

#[derive(Deserialize)]
struct AudioRequest {
    #[serde(default)]
    text: String,
}

async fn generate_audio(
    State(state): State<AppState>,
    client: ClientId,
    payload: std::result::Result<Json<AudioRequest>, JsonRejection>,
) -> Result<Json<Success<AudioLocation>>> {
    admit(&state, &client, LimitType::Audio)?;
    let req = body(payload)?;

    log::info!("Received audio request: {}", req.text);
    let location = state.locator.locate(&req.text).await?;
    Ok(success(location))
}

#[derive(Deserialize)]
struct ExportRequest {
    #[serde(default)]
    sentence: String,
    #[serde(default)]
    translation: String,
    #[serde(default)]
    analysis: serde_json::Value,
}

#[derive(Serialize)]
struct ExportBody {
    anki_data: FlashcardRecord,
    csv_format: String,
}

async fn export_anki(
    State(state): State<AppState>,
    client: ClientId,
    payload: std::result::Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Json<Success<ExportBody>>> {
    admit(&state, &client, LimitType::Export)?;
    let req = body(payload)?;
    if req.sentence.is_empty() {
        return Err(AppError::invalid("No sentence provided"));
    }

    let analysis: CardAnalysis = if req.analysis.is_null() {
        CardAnalysis::default()
    } else {
        serde_json::from_value(req.analysis).map_err(|e| AppError::upstream("Export failed", e))?
    };

    log::info!("Received export request: {}", req.sentence);
    let export = anki::export(&req.sentence, &req.translation, &analysis)?;
    Ok(success(ExportBody {
        anki_data: export.card,
        csv_format: export.csv_line,
    }))
}
