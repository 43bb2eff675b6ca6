//! HTTP route handlers

pub mod art;
pub mod audio;
pub mod health;
pub mod links;

pub use art::art_routes;
pub use audio::audio_routes;
pub use health::health_routes;
pub use links::link_routes;

use serde::Serialize;

/// Body returned by DELETE endpoints
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
