//! Artwork endpoints
//!
//! Creating an artwork is a multipart upload: the image's dominant colours
//! are extracted first, so an undecodable file never reaches the image host,
//! then the image is uploaded and the record stored with its URL and tags.

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    routing::get,
    Json, Router,
};
use gallery_common::db::{self, Art, ArtPatch, ArtType, Audio, NewArt};
use gallery_common::palette;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::StatusResponse;
use crate::error::{ApiError, ApiResult};
use crate::pagination::page;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ArtListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub parent_id: Option<i64>,
}

/// Artwork plus its children and linked audio
#[derive(Debug, Serialize)]
pub struct ArtDetail {
    #[serde(flatten)]
    pub art: Art,
    pub related_artwork: Vec<Art>,
    pub linked_audio: Vec<Audio>,
}

/// Fields collected from the upload form
#[derive(Debug, Default)]
struct ArtUpload {
    title: Option<String>,
    art_type: Option<String>,
    description: Option<String>,
    parent_id: Option<String>,
    file: Option<Bytes>,
}

impl ArtUpload {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut upload = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "file" => upload.file = Some(field.bytes().await?),
                "title" => upload.title = Some(field.text().await?),
                "art_type" => upload.art_type = Some(field.text().await?),
                "description" => upload.description = Some(field.text().await?),
                "parent_id" => upload.parent_id = Some(field.text().await?),
                // Unknown fields are ignored
                _ => {}
            }
        }
        Ok(upload)
    }
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing form field '{}'", field)))
}

/// POST /art/
pub async fn create_art(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Json<Art>> {
    let upload = ArtUpload::read(multipart).await?;

    let title = required(upload.title, "title")?;
    let art_type: ArtType = required(upload.art_type, "art_type")?.parse()?;
    let description = upload.description.filter(|d| !d.is_empty());
    let parent_id = match upload.parent_id.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("parent_id '{}' is not an integer", raw)))?,
        ),
    };
    let file = upload
        .file
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing form field 'file'".to_string()))?;

    state.art.check_parent(None, parent_id).await?;

    let options = state.extraction;
    let image = file.clone();
    let colours = tokio::task::spawn_blocking(move || palette::extract_colours(&image, &options))
        .await
        .map_err(|e| ApiError::Internal(format!("Colour extraction task failed: {}", e)))??;

    let uploaded = state.image_host.upload(file.to_vec()).await.map_err(|e| {
        warn!(error = %e, "Image upload failed");
        ApiError::BadRequest("Image upload failed".to_string())
    })?;

    let new = NewArt {
        title,
        description,
        art_type: Some(art_type),
        url: Some(uploaded.url),
        colours: Some(colours),
        tags: Some(uploaded.tags),
        parent_id,
    };
    let art = state.art.create(&new).await?;

    info!(art_id = art.id, colours = ?art.colours, "Created artwork");
    Ok(Json(art))
}

/// GET /art/
pub async fn list_art(
    State(state): State<AppState>,
    Query(params): Query<ArtListParams>,
) -> ApiResult<Json<Vec<Art>>> {
    let page = page(params.skip, params.limit);
    let rows = match params.parent_id {
        Some(parent_id) => state.art.list_by_parent(parent_id, page.skip, page.limit).await?,
        None => state.art.list(page.skip, page.limit).await?,
    };
    Ok(Json(rows))
}

/// GET /art/{id}/
pub async fn get_art(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Art>> {
    Ok(Json(state.art.retrieve(id).await?))
}

/// PUT /art/{id}/
pub async fn update_art(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ArtPatch>,
) -> ApiResult<Json<Art>> {
    if !state.art.exists(id).await? {
        return Err(ApiError::NotFound(format!("Artwork {} not found", id)));
    }
    state.art.check_parent(Some(id), patch.parent_id).await?;

    let art = state.art.update(id, patch).await?;
    info!(art_id = id, "Updated artwork");
    Ok(Json(art))
}

/// DELETE /art/{id}/
pub async fn delete_art(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StatusResponse>> {
    state.art.delete(id).await?;
    info!(art_id = id, "Deleted artwork");
    Ok(Json(StatusResponse {
        status: "Artwork successfully terminated.",
    }))
}

/// GET /art/{id}/detail
pub async fn get_art_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ArtDetail>> {
    let art = state.art.retrieve(id).await?;
    let related_artwork = state.art.children(id).await?;
    let linked_audio = db::audio_for_art(&state.db, id).await?;

    Ok(Json(ArtDetail {
        art,
        related_artwork,
        linked_audio,
    }))
}

/// GET /art/{id}/audio
pub async fn get_art_audio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Audio>>> {
    if !state.art.exists(id).await? {
        return Err(ApiError::NotFound(format!("Artwork {} not found", id)));
    }
    Ok(Json(db::audio_for_art(&state.db, id).await?))
}

pub fn art_routes() -> Router<AppState> {
    Router::new()
        .route("/art/", get(list_art).post(create_art))
        .route("/art/:id/", get(get_art).put(update_art).delete(delete_art))
        .route("/art/:id/detail", get(get_art_detail))
        .route("/art/:id/audio", get(get_art_audio))
}
