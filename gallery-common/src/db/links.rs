//! Many-to-many links between artworks and audio

use crate::db::art::Art;
use crate::db::audio::Audio;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ArtAudioLink {
    pub id: i64,
    pub art_id: i64,
    pub audio_id: i64,
    pub created: DateTime<Utc>,
}

async fn row_exists(pool: &SqlitePool, table: &str, id: i64) -> Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table);
    Ok(sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?)
}

/// Link an artwork to an audio record
///
/// Both ends must exist; a pair can only be linked once.
pub async fn add_link(pool: &SqlitePool, art_id: i64, audio_id: i64) -> Result<ArtAudioLink> {
    if !row_exists(pool, "art", art_id).await? {
        return Err(Error::NotFound(format!("Artwork {}", art_id)));
    }
    if !row_exists(pool, "audio", audio_id).await? {
        return Err(Error::NotFound(format!("Audio {}", audio_id)));
    }

    let result = sqlx::query_as::<_, ArtAudioLink>(
        r#"
        INSERT INTO art_audio_link (art_id, audio_id, created)
        VALUES (?, ?, ?)
        RETURNING id, art_id, audio_id, created
        "#,
    )
    .bind(art_id)
    .bind(audio_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await;

    match result {
        Ok(link) => {
            debug!(link_id = link.id, art_id, audio_id, "Linked art to audio");
            Ok(link)
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(Error::Conflict(format!(
            "Artwork {} is already linked to audio {}",
            art_id, audio_id
        ))),
        Err(e) => Err(e.into()),
    }
}

pub async fn remove_link(pool: &SqlitePool, link_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM art_audio_link WHERE id = ?")
        .bind(link_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Link {}", link_id)));
    }
    debug!(link_id, "Removed art/audio link");
    Ok(())
}

/// Audio linked to an artwork, in link order
pub async fn audio_for_art(pool: &SqlitePool, art_id: i64) -> Result<Vec<Audio>> {
    Ok(sqlx::query_as::<_, Audio>(
        r#"
        SELECT audio.* FROM audio
        JOIN art_audio_link link ON link.audio_id = audio.id
        WHERE link.art_id = ?
        ORDER BY link.id
        "#,
    )
    .bind(art_id)
    .fetch_all(pool)
    .await?)
}

/// Artworks linked to an audio record, in link order
pub async fn art_for_audio(pool: &SqlitePool, audio_id: i64) -> Result<Vec<Art>> {
    Ok(sqlx::query_as::<_, Art>(
        r#"
        SELECT art.* FROM art
        JOIN art_audio_link link ON link.art_id = art.id
        WHERE link.audio_id = ?
        ORDER BY link.id
        "#,
    )
    .bind(audio_id)
    .fetch_all(pool)
    .await?)
}
