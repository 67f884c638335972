//! Product repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use agfood_core::{PriceTiers, ProductId};

use super::RepositoryError;
use crate::models::{Product, ProductChanges, ProductDraft};

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    product_name: String,
    pack_name: String,
    weight: String,
    protein_intake: String,
    available_days: Vec<String>,
    available_time: String,
    single_order: i32,
    weekly_subscription: i32,
    monthly_subscription: i32,
    image_url: String,
    ingredients: Vec<String>,
    discounts: Vec<String>,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let prices = PriceTiers {
            single_order: row.single_order,
            weekly_subscription: row.weekly_subscription,
            monthly_subscription: row.monthly_subscription,
        };
        if !prices.is_valid() {
            return Err(RepositoryError::DataCorruption(format!(
                "negative price tier on product {}",
                row.id
            )));
        }

        Ok(Self {
            id: ProductId::new(row.id),
            product_name: row.product_name,
            pack_name: row.pack_name,
            weight: row.weight,
            protein_intake: row.protein_intake,
            available_day: row.available_days,
            available_time: row.available_time,
            prices,
            image_path: row.image_url,
            ingredients: row.ingredients,
            discounts: row.discounts,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, product_name, pack_name, weight, protein_intake,
                   available_days, available_time,
                   single_order, weekly_subscription, monthly_subscription,
                   image_url, ingredients, discounts, description,
                   created_at, updated_at
            FROM product
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, product_name, pack_name, weight, protein_intake,
                   available_days, available_time,
                   single_order, weekly_subscription, monthly_subscription,
                   image_url, ingredients, discounts, description,
                   created_at, updated_at
            FROM product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get every product whose ID is in `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, product_name, pack_name, weight, protein_intake,
                   available_days, available_time,
                   single_order, weekly_subscription, monthly_subscription,
                   image_url, ingredients, discounts, description,
                   created_at, updated_at
            FROM product
            WHERE id = ANY($1)
            ",
        )
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO product (
                product_name, pack_name, weight, protein_intake,
                available_days, available_time,
                single_order, weekly_subscription, monthly_subscription,
                image_url, ingredients, discounts, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, product_name, pack_name, weight, protein_intake,
                      available_days, available_time,
                      single_order, weekly_subscription, monthly_subscription,
                      image_url, ingredients, discounts, description,
                      created_at, updated_at
            ",
        )
        .bind(&draft.product_name)
        .bind(&draft.pack_name)
        .bind(&draft.weight)
        .bind(&draft.protein_intake)
        .bind(&draft.available_day)
        .bind(&draft.available_time)
        .bind(draft.prices.single_order)
        .bind(draft.prices.weekly_subscription)
        .bind(draft.prices.monthly_subscription)
        .bind(&draft.image_path)
        .bind(&draft.ingredients)
        .bind(&draft.discounts)
        .bind(&draft.description)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Apply a partial update. Fields left as `None` keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE product SET
                product_name = COALESCE($2, product_name),
                pack_name = COALESCE($3, pack_name),
                weight = COALESCE($4, weight),
                protein_intake = COALESCE($5, protein_intake),
                available_days = COALESCE($6, available_days),
                available_time = COALESCE($7, available_time),
                single_order = COALESCE($8, single_order),
                weekly_subscription = COALESCE($9, weekly_subscription),
                monthly_subscription = COALESCE($10, monthly_subscription),
                image_url = COALESCE($11, image_url),
                ingredients = COALESCE($12, ingredients),
                discounts = COALESCE($13, discounts),
                description = COALESCE($14, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, product_name, pack_name, weight, protein_intake,
                      available_days, available_time,
                      single_order, weekly_subscription, monthly_subscription,
                      image_url, ingredients, discounts, description,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.product_name.as_deref())
        .bind(changes.pack_name.as_deref())
        .bind(changes.weight.as_deref())
        .bind(changes.protein_intake.as_deref())
        .bind(changes.available_day.as_deref())
        .bind(changes.available_time.as_deref())
        .bind(changes.single_order)
        .bind(changes.weekly_subscription)
        .bind(changes.monthly_subscription)
        .bind(changes.image_path.as_deref())
        .bind(changes.ingredients.as_deref())
        .bind(changes.discounts.as_deref())
        .bind(changes.description.as_deref())
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
