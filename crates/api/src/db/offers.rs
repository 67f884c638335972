//! Offer repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use agfood_core::OfferId;

use super::RepositoryError;
use crate::models::{NewOffer, Offer};

/// Internal row type for `PostgreSQL` offer queries.
#[derive(Debug, sqlx::FromRow)]
struct OfferRow {
    id: i32,
    title: String,
    description: Option<String>,
    image_url: Option<String>,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OfferRow> for Offer {
    fn from(row: OfferRow) -> Self {
        Self {
            id: OfferId::new(row.id),
            title: row.title,
            description: row.description,
            image_path: row.image_url,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for offer database operations.
pub struct OfferRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OfferRepository<'a> {
    /// Create a new offer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all offers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Offer>, RepositoryError> {
        let rows = sqlx::query_as::<_, OfferRow>(
            r"
            SELECT id, title, description, image_url, starts_at, ends_at,
                   is_active, created_at, updated_at
            FROM offer
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List active offers whose window contains `now`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_current(&self, now: DateTime<Utc>) -> Result<Vec<Offer>, RepositoryError> {
        let rows = sqlx::query_as::<_, OfferRow>(
            r"
            SELECT id, title, description, image_url, starts_at, ends_at,
                   is_active, created_at, updated_at
            FROM offer
            WHERE is_active
              AND (starts_at IS NULL OR starts_at <= $1)
              AND (ends_at IS NULL OR ends_at >= $1)
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(now)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an offer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError> {
        let row = sqlx::query_as::<_, OfferRow>(
            r"
            SELECT id, title, description, image_url, starts_at, ends_at,
                   is_active, created_at, updated_at
            FROM offer
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a new offer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, offer: &NewOffer) -> Result<Offer, RepositoryError> {
        let row = sqlx::query_as::<_, OfferRow>(
            r"
            INSERT INTO offer (title, description, image_url, starts_at, ends_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, image_url, starts_at, ends_at,
                      is_active, created_at, updated_at
            ",
        )
        .bind(&offer.title)
        .bind(offer.description.as_deref())
        .bind(offer.image_path.as_deref())
        .bind(offer.starts_at)
        .bind(offer.ends_at)
        .bind(offer.is_active)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Set the active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no offer has this ID.
    pub async fn set_active(&self, id: OfferId, is_active: bool) -> Result<Offer, RepositoryError> {
        let row = sqlx::query_as::<_, OfferRow>(
            r"
            UPDATE offer
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, image_url, starts_at, ends_at,
                      is_active, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(is_active)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete an offer, returning the removed row so its image can be released.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no offer has this ID.
    pub async fn delete(&self, id: OfferId) -> Result<Offer, RepositoryError> {
        let row = sqlx::query_as::<_, OfferRow>(
            r"
            DELETE FROM offer
            WHERE id = $1
            RETURNING id, title, description, image_url, starts_at, ends_at,
                      is_active, created_at, updated_at
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }
}
