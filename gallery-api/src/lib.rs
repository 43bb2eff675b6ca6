//! gallery-api library: HTTP service for artwork and audio records
//!
//! Artwork uploads run through dominant colour extraction and are stored on
//! an external image host; audio records and art/audio links are plain CRUD.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use gallery_common::db::{Art, Audio, Repository};
use gallery_common::palette::ExtractionOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pagination;
pub mod services;

pub use error::{ApiError, ApiResult};
use services::ImageHost;

/// Largest accepted request body (image uploads)
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub art: Repository<Art>,
    pub audio: Repository<Audio>,
    pub image_host: Arc<dyn ImageHost>,
    /// Parameters for colour extraction on upload
    pub extraction: ExtractionOptions,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, image_host: Arc<dyn ImageHost>) -> Self {
        Self {
            art: Repository::new(db.clone()),
            audio: Repository::new(db.clone()),
            db,
            image_host,
            extraction: ExtractionOptions::default(),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::art_routes())
        .merge(api::audio_routes())
        .merge(api::link_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
