//! Audio endpoints

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use gallery_common::db::{self, Art, Audio, AudioPatch, NewAudio};
use serde::Deserialize;
use tracing::info;

use super::StatusResponse;
use crate::error::{ApiError, ApiResult};
use crate::pagination::page;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AudioListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// POST /audio/
pub async fn create_audio(
    State(state): State<AppState>,
    Json(new): Json<NewAudio>,
) -> ApiResult<Json<Audio>> {
    let audio = state.audio.create(&new).await?;
    info!(audio_id = audio.id, audio_type = %audio.audio_type, "Created audio");
    Ok(Json(audio))
}

/// GET /audio/
pub async fn list_audio(
    State(state): State<AppState>,
    Query(params): Query<AudioListParams>,
) -> ApiResult<Json<Vec<Audio>>> {
    let page = page(params.skip, params.limit);
    Ok(Json(state.audio.list(page.skip, page.limit).await?))
}

/// GET /audio/{id}/
pub async fn get_audio(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Audio>> {
    Ok(Json(state.audio.retrieve(id).await?))
}

/// PUT /audio/{id}/
pub async fn update_audio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<AudioPatch>,
) -> ApiResult<Json<Audio>> {
    let audio = state.audio.update(id, patch).await?;
    info!(audio_id = id, "Updated audio");
    Ok(Json(audio))
}

/// DELETE /audio/{id}/
pub async fn delete_audio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StatusResponse>> {
    state.audio.delete(id).await?;
    info!(audio_id = id, "Deleted audio");
    Ok(Json(StatusResponse {
        status: "Audio successfully terminated.",
    }))
}

/// GET /audio/{id}/art
pub async fn get_audio_art(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Art>>> {
    if !state.audio.exists(id).await? {
        return Err(ApiError::NotFound(format!("Audio {} not found", id)));
    }
    Ok(Json(db::art_for_audio(&state.db, id).await?))
}

pub fn audio_routes() -> Router<AppState> {
    Router::new()
        .route("/audio/", get(list_audio).post(create_audio))
        .route("/audio/:id/", get(get_audio).put(update_audio).delete(delete_audio))
        .route("/audio/:id/art", get(get_audio_art))
}
