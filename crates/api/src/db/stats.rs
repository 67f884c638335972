//! Dashboard counters.

use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

/// Row counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_customers: i64,
    pub total_orders: i64,
    pub total_products: i64,
}

impl DashboardStats {
    /// Count customers, orders and products in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn load(pool: &PgPool) -> Result<Self, RepositoryError> {
        let stats = sqlx::query_as::<_, Self>(
            r"
            SELECT (SELECT COUNT(*) FROM customer) AS total_customers,
                   (SELECT COUNT(*) FROM customer_order) AS total_orders,
                   (SELECT COUNT(*) FROM product) AS total_products
            ",
        )
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }
}
