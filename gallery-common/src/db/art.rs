//! Artwork records

use crate::db::repository::{Entity, HasParent};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row, SqliteConnection};
use std::fmt;
use std::str::FromStr;

/// Origin of an artwork
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ArtType {
    Original,
    Ai,
}

impl ArtType {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtType::Original => "original",
            ArtType::Ai => "ai",
        }
    }
}

impl fmt::Display for ArtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "original" => Ok(ArtType::Original),
            "ai" => Ok(ArtType::Ai),
            other => Err(Error::InvalidInput(format!(
                "Unknown art type '{}', expected 'original' or 'ai'",
                other
            ))),
        }
    }
}

/// A stored artwork
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Art {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub art_type: ArtType,
    /// Hosted image URL
    pub url: Option<String>,
    /// Dominant colours as `hsl(H, S%, L%)` strings
    pub colours: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub parent_id: Option<i64>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Fields supplied when creating an artwork
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArt {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub art_type: Option<ArtType>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub colours: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl NewArt {
    pub fn new(title: impl Into<String>, art_type: ArtType) -> Self {
        Self {
            title: title.into(),
            art_type: Some(art_type),
            ..Default::default()
        }
    }
}

/// Mutable artwork fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub art_type: Option<ArtType>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub colours: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl FromRow<'_, SqliteRow> for Art {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let colours: Option<Json<Vec<String>>> = row.try_get("colours")?;
        let tags: Option<Json<Vec<String>>> = row.try_get("tags")?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            art_type: row.try_get("type")?,
            url: row.try_get("url")?,
            colours: colours.map(|c| c.0),
            tags: tags.map(|t| t.0),
            parent_id: row.try_get("parent_id")?,
            created: row.try_get("created")?,
            updated: row.try_get("updated")?,
        })
    }
}

#[async_trait]
impl Entity for Art {
    const TABLE: &'static str = "art";
    const NAME: &'static str = "Artwork";

    type New = NewArt;
    type Patch = ArtPatch;

    fn id(&self) -> i64 {
        self.id
    }

    async fn insert(conn: &mut SqliteConnection, new: &NewArt, now: DateTime<Utc>) -> Result<i64> {
        if new.title.trim().is_empty() {
            return Err(Error::InvalidInput("Artwork title must not be empty".to_string()));
        }
        let art_type = new
            .art_type
            .ok_or_else(|| Error::InvalidInput("Artwork type is required".to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO art (title, description, type, url, colours, tags, parent_id, created, updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(art_type)
        .bind(&new.url)
        .bind(new.colours.as_ref().map(Json))
        .bind(new.tags.as_ref().map(Json))
        .bind(new.parent_id)
        .bind(now)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    fn apply(&mut self, patch: ArtPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(art_type) = patch.art_type {
            self.art_type = art_type;
        }
        if let Some(url) = patch.url {
            self.url = Some(url);
        }
        if let Some(colours) = patch.colours {
            self.colours = Some(colours);
        }
        if let Some(tags) = patch.tags {
            self.tags = Some(tags);
        }
        if let Some(parent_id) = patch.parent_id {
            self.parent_id = Some(parent_id);
        }
    }

    async fn store(&self, conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidInput("Artwork title must not be empty".to_string()));
        }

        sqlx::query(
            r#"
            UPDATE art
            SET title = ?, description = ?, type = ?, url = ?, colours = ?, tags = ?,
                parent_id = ?, updated = ?
            WHERE id = ?
            "#,
        )
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.art_type)
        .bind(&self.url)
        .bind(self.colours.as_ref().map(Json))
        .bind(self.tags.as_ref().map(Json))
        .bind(self.parent_id)
        .bind(now)
        .bind(self.id)
        .execute(conn)
        .await?;

        Ok(())
    }
}

impl HasParent for Art {
    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_in_memory;
    use crate::db::repository::Repository;

    async fn repo() -> Repository<Art> {
        Repository::new(init_in_memory().await.unwrap())
    }

    fn painting(title: &str) -> NewArt {
        NewArt {
            colours: Some(vec!["hsl(0, 100%, 50%)".to_string()]),
            tags: Some(vec!["sky".to_string(), "sea".to_string()]),
            url: Some("https://img.example/1.png".to_string()),
            ..NewArt::new(title, ArtType::Original)
        }
    }

    #[test]
    fn test_art_type_parsing() {
        assert_eq!("ai".parse::<ArtType>().unwrap(), ArtType::Ai);
        assert_eq!("original".parse::<ArtType>().unwrap(), ArtType::Original);
        assert!("AI".parse::<ArtType>().is_err());
    }

    #[test]
    fn test_patch_rejects_identity_fields() {
        let result: std::result::Result<ArtPatch, _> =
            serde_json::from_str(r#"{"id": 7, "title": "x"}"#);
        assert!(result.is_err());
        let result: std::result::Result<ArtPatch, _> =
            serde_json::from_str(r#"{"created": "2024-01-01T00:00:00Z"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialized_type_field() {
        let art = Art {
            id: 1,
            title: "t".to_string(),
            description: None,
            art_type: ArtType::Ai,
            url: None,
            colours: None,
            tags: None,
            parent_id: None,
            created: Utc::now(),
            updated: Utc::now(),
        };
        let json = serde_json::to_value(&art).unwrap();
        assert_eq!(json["type"], "ai");
        assert!(json["colours"].is_null());
    }

    #[tokio::test]
    async fn test_create_and_retrieve_round_trip() {
        let repo = repo().await;
        let created = repo.create(&painting("Harbour")).await.unwrap();

        let loaded = repo.retrieve(created.id).await.unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.tags.as_deref(), Some(&["sky".to_string(), "sea".to_string()][..]));
        assert_eq!(loaded.created, loaded.updated);
    }

    #[tokio::test]
    async fn test_missing_type_rejected() {
        let repo = repo().await;
        let new = NewArt {
            title: "Untyped".to_string(),
            ..Default::default()
        };
        assert!(matches!(repo.create(&new).await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_patch_leaves_absent_fields() {
        let repo = repo().await;
        let created = repo.create(&painting("Harbour")).await.unwrap();

        let patch = ArtPatch {
            title: Some("Harbour at Dusk".to_string()),
            art_type: Some(ArtType::Ai),
            ..Default::default()
        };
        let updated = repo.update(created.id, patch).await.unwrap();

        assert_eq!(updated.title, "Harbour at Dusk");
        assert_eq!(updated.art_type, ArtType::Ai);
        assert_eq!(updated.colours, created.colours);
        assert_eq!(updated.url, created.url);
        assert_eq!(updated.created, created.created);
        assert!(updated.updated >= created.updated);
    }

    #[tokio::test]
    async fn test_children_and_parent_checks() {
        let repo = repo().await;
        let root = repo.create(&painting("Root")).await.unwrap();
        let child = repo
            .create(&NewArt {
                parent_id: Some(root.id),
                ..painting("Child")
            })
            .await
            .unwrap();
        repo.create(&painting("Unrelated")).await.unwrap();

        let children = repo.children(root.id).await.unwrap();
        assert_eq!(children.iter().map(|a| a.id).collect::<Vec<_>>(), vec![child.id]);
        assert_eq!(repo.list_by_parent(root.id, 1, 10).await.unwrap().len(), 0);

        // Unknown parent, self parent, and a cycle through the child
        assert!(repo.check_parent(None, Some(999)).await.is_err());
        assert!(repo.check_parent(Some(root.id), Some(root.id)).await.is_err());
        assert!(repo.check_parent(Some(root.id), Some(child.id)).await.is_err());
        assert!(repo.check_parent(Some(child.id), Some(root.id)).await.is_ok());
        assert!(repo.check_parent(Some(child.id), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_deleting_parent_orphans_children() {
        let repo = repo().await;
        let root = repo.create(&painting("Root")).await.unwrap();
        let child = repo
            .create(&NewArt {
                parent_id: Some(root.id),
                ..painting("Child")
            })
            .await
            .unwrap();

        repo.delete(root.id).await.unwrap();

        let orphan = repo.retrieve(child.id).await.unwrap();
        assert_eq!(orphan.parent_id, None);
    }
}
