//! Art/audio link endpoints

use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use gallery_common::db::{self, ArtAudioLink};
use serde::Deserialize;
use tracing::info;

use super::StatusResponse;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewLink {
    pub art_id: i64,
    pub audio_id: i64,
}

/// POST /links/
pub async fn create_link(
    State(state): State<AppState>,
    Json(new): Json<NewLink>,
) -> ApiResult<Json<ArtAudioLink>> {
    let link = db::add_link(&state.db, new.art_id, new.audio_id).await?;
    info!(link_id = link.id, art_id = link.art_id, audio_id = link.audio_id, "Created link");
    Ok(Json(link))
}

/// DELETE /links/{id}/
pub async fn delete_link(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StatusResponse>> {
    db::remove_link(&state.db, id).await?;
    info!(link_id = id, "Removed link");
    Ok(Json(StatusResponse {
        status: "Link successfully removed.",
    }))
}

pub fn link_routes() -> Router<AppState> {
    Router::new()
        .route("/links/", post(create_link))
        .route("/links/:id/", delete(delete_link))
}
