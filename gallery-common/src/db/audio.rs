//! Audio records (mixes and playlists)

use crate::db::repository::Entity;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AudioType {
    Mix,
    Playlist,
}

impl AudioType {
    pub fn as_str(self) -> &'static str {
        match self {
            AudioType::Mix => "mix",
            AudioType::Playlist => "playlist",
        }
    }
}

impl fmt::Display for AudioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mix" => Ok(AudioType::Mix),
            "playlist" => Ok(AudioType::Playlist),
            other => Err(Error::InvalidInput(format!(
                "Unknown audio type '{}', expected 'mix' or 'playlist'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Audio {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub audio_type: AudioType,
    pub description: Option<String>,
    pub url: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAudio {
    pub title: String,
    #[serde(rename = "type")]
    pub audio_type: AudioType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl NewAudio {
    pub fn new(title: impl Into<String>, audio_type: AudioType) -> Self {
        Self {
            title: title.into(),
            audio_type,
            description: None,
            url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub audio_type: Option<AudioType>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::InvalidInput("Audio title must not be empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl Entity for Audio {
    const TABLE: &'static str = "audio";
    const NAME: &'static str = "Audio";

    type New = NewAudio;
    type Patch = AudioPatch;

    fn id(&self) -> i64 {
        self.id
    }

    async fn insert(conn: &mut SqliteConnection, new: &NewAudio, now: DateTime<Utc>) -> Result<i64> {
        require_title(&new.title)?;

        let result = sqlx::query(
            "INSERT INTO audio (title, type, description, url, created, updated) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.title)
        .bind(new.audio_type)
        .bind(&new.description)
        .bind(&new.url)
        .bind(now)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    fn apply(&mut self, patch: AudioPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(audio_type) = patch.audio_type {
            self.audio_type = audio_type;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if patch.url.is_some() {
            self.url = patch.url;
        }
    }

    async fn store(&self, conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<()> {
        require_title(&self.title)?;

        sqlx::query(
            "UPDATE audio SET title = ?, type = ?, description = ?, url = ?, updated = ? WHERE id = ?",
        )
        .bind(&self.title)
        .bind(self.audio_type)
        .bind(&self.description)
        .bind(&self.url)
        .bind(now)
        .bind(self.id)
        .execute(conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_in_memory;
    use crate::db::repository::Repository;

    #[test]
    fn test_new_audio_requires_type() {
        let result: std::result::Result<NewAudio, _> = serde_json::from_str(r#"{"title": "Set"}"#);
        assert!(result.is_err());

        let parsed: NewAudio =
            serde_json::from_str(r#"{"title": "Set", "type": "playlist"}"#).unwrap();
        assert_eq!(parsed.audio_type, AudioType::Playlist);
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!("album".parse::<AudioType>().is_err());
        let result: std::result::Result<AudioPatch, _> = serde_json::from_str(r#"{"type": "album"}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let repo: Repository<Audio> = Repository::new(init_in_memory().await.unwrap());

        let created = repo.create(&NewAudio::new("Night Drive", AudioType::Mix)).await.unwrap();
        assert_eq!(created.audio_type, AudioType::Mix);
        assert_eq!(created.description, None);

        let patch = AudioPatch {
            description: Some("Late set".to_string()),
            ..Default::default()
        };
        let updated = repo.update(created.id, patch).await.unwrap();
        assert_eq!(updated.title, "Night Drive");
        assert_eq!(updated.description.as_deref(), Some("Late set"));

        repo.delete(created.id).await.unwrap();
        assert!(matches!(repo.retrieve(created.id).await, Err(Error::NotFound(_))));
        assert!(matches!(repo.delete(created.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_bulk_create_is_atomic() {
        let repo: Repository<Audio> = Repository::new(init_in_memory().await.unwrap());

        let batch = vec![
            NewAudio::new("One", AudioType::Mix),
            NewAudio::new("  ", AudioType::Playlist),
        ];
        assert!(repo.bulk_create(&batch).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 0);

        let batch = vec![
            NewAudio::new("One", AudioType::Mix),
            NewAudio::new("Two", AudioType::Playlist),
        ];
        let created = repo.bulk_create(&batch).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
