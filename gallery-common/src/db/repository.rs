//! Generic CRUD repository
//!
//! Each persisted type implements [`Entity`] once: how to insert it, which
//! fields a patch may change, and how to write those fields back. Identity
//! and timestamps are never part of a patch, so an update cannot touch them.

use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::marker::PhantomData;
use tracing::debug;

/// A table-backed record identified by an integer `id`
#[async_trait]
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static {
    /// Table name
    const TABLE: &'static str;
    /// Human-readable name used in error messages
    const NAME: &'static str;

    /// Insert payload
    type New: Send + Sync;
    /// Optional mutable fields; `None` leaves a field unchanged
    type Patch: Send;

    fn id(&self) -> i64;

    /// Insert a new row stamped with `now`, returning its id
    async fn insert(conn: &mut SqliteConnection, new: &Self::New, now: DateTime<Utc>) -> Result<i64>;

    /// Copy every field set in `patch` onto `self`
    fn apply(&mut self, patch: Self::Patch);

    /// Write all mutable fields back, stamping `updated` with `now`
    async fn store(&self, conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<()>;
}

/// An entity carrying a self-referencing `parent_id`
pub trait HasParent: Entity {
    const PARENT_COLUMN: &'static str = "parent_id";

    fn parent_id(&self) -> Option<i64>;
}

/// CRUD operations for one entity type over a shared pool
pub struct Repository<E> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

async fn fetch<E: Entity>(conn: &mut SqliteConnection, id: i64) -> Result<Option<E>> {
    let sql = format!("SELECT * FROM {} WHERE id = ?", E::TABLE);
    Ok(sqlx::query_as::<_, E>(&sql).bind(id).fetch_optional(conn).await?)
}

async fn fetch_required<E: Entity>(conn: &mut SqliteConnection, id: i64) -> Result<E> {
    fetch(conn, id).await?.ok_or_else(|| not_found::<E>(id))
}

fn not_found<E: Entity>(id: i64) -> Error {
    Error::NotFound(format!("{} {}", E::NAME, id))
}

impl<E: Entity> Repository<E> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create(&self, new: &E::New) -> Result<E> {
        let mut conn = self.pool.acquire().await?;
        let id = E::insert(&mut *conn, new, Utc::now()).await?;
        debug!(table = E::TABLE, id, "Created row");
        fetch_required(&mut *conn, id).await
    }

    /// Insert every record or none of them
    pub async fn bulk_create(&self, news: &[E::New]) -> Result<Vec<E>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut created = Vec::with_capacity(news.len());
        for new in news {
            let id = E::insert(&mut *tx, new, now).await?;
            created.push(fetch_required(&mut *tx, id).await?);
        }

        tx.commit().await?;
        debug!(table = E::TABLE, count = created.len(), "Bulk created rows");
        Ok(created)
    }

    pub async fn find(&self, id: i64) -> Result<Option<E>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut *conn, id).await
    }

    /// Like [`find`](Self::find) but a missing row is `Error::NotFound`
    pub async fn retrieve(&self, id: i64) -> Result<E> {
        self.find(id).await?.ok_or_else(|| not_found::<E>(id))
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", E::TABLE);
        let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(exists)
    }

    /// Rows ordered by id, skipping `skip` and returning at most `limit`
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<E>> {
        let sql = format!("SELECT * FROM {} ORDER BY id LIMIT ? OFFSET ?", E::TABLE);
        Ok(sqlx::query_as::<_, E>(&sql)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
        Ok(sqlx::query_scalar(&sql).fetch_one(&self.pool).await?)
    }

    pub async fn update(&self, id: i64, patch: E::Patch) -> Result<E> {
        let mut tx = self.pool.begin().await?;
        let updated = update_in::<E>(&mut *tx, id, patch).await?;
        tx.commit().await?;
        debug!(table = E::TABLE, id, "Updated row");
        Ok(updated)
    }

    /// Apply several patches atomically; any missing id aborts the batch
    pub async fn bulk_update(&self, updates: Vec<(i64, E::Patch)>) -> Result<Vec<E>> {
        let mut tx = self.pool.begin().await?;

        let mut updated = Vec::with_capacity(updates.len());
        for (id, patch) in updates {
            updated.push(update_in::<E>(&mut *tx, id, patch).await?);
        }

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", E::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(not_found::<E>(id));
        }
        debug!(table = E::TABLE, id, "Deleted row");
        Ok(())
    }
}

async fn update_in<E: Entity>(conn: &mut SqliteConnection, id: i64, patch: E::Patch) -> Result<E> {
    let mut entity: E = fetch_required(conn, id).await?;
    entity.apply(patch);
    entity.store(conn, Utc::now()).await?;
    fetch_required(conn, id).await
}

impl<E: HasParent> Repository<E> {
    /// Every row whose parent is `parent_id`
    pub async fn children(&self, parent_id: i64) -> Result<Vec<E>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY id",
            E::TABLE,
            E::PARENT_COLUMN
        );
        Ok(sqlx::query_as::<_, E>(&sql)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn list_by_parent(&self, parent_id: i64, skip: i64, limit: i64) -> Result<Vec<E>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY id LIMIT ? OFFSET ?",
            E::TABLE,
            E::PARENT_COLUMN
        );
        Ok(sqlx::query_as::<_, E>(&sql)
            .bind(parent_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Check that `child` (None for a row not yet created) may hang under `parent`
    ///
    /// The parent must exist, and the new edge must not close a cycle.
    pub async fn check_parent(&self, child: Option<i64>, parent: Option<i64>) -> Result<()> {
        let Some(parent) = parent else {
            return Ok(());
        };

        let mut seen = HashSet::new();
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if Some(id) == child {
                return Err(Error::InvalidInput(format!(
                    "{} {} cannot be its own ancestor",
                    E::NAME,
                    id
                )));
            }
            if !seen.insert(id) {
                // Pre-existing loop that does not involve `child`
                break;
            }
            let Some(row) = self.find(id).await? else {
                return Err(Error::InvalidInput(format!(
                    "Parent {} {} does not exist",
                    E::NAME,
                    id
                )));
            };
            cursor = row.parent_id();
        }

        Ok(())
    }
}
