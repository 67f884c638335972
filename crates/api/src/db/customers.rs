//! Customer repository.
//!
//! Customers are written by the contact form and by order placement. The
//! insert is exposed as a free function over any executor so placement can
//! run it inside its transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use agfood_core::{CustomerId, Email, Phone};

use super::RepositoryError;
use crate::models::{Customer, NewCustomer};

/// Internal row type for `PostgreSQL` customer queries.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    name: String,
    phone: String,
    email: Option<String>,
    message: Option<String>,
    address: Option<String>,
    wants_offers: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = RepositoryError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: CustomerId::new(row.id),
            name: row.name,
            phone,
            email,
            message: row.message,
            address: row.address,
            wants_offers: row.wants_offers,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insert a customer with any executor (pool or open transaction).
pub(super) async fn insert<'e, E>(
    executor: E,
    customer: &NewCustomer,
) -> Result<Customer, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, CustomerRow>(
        r"
        INSERT INTO customer (name, phone, email, message, address, wants_offers)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, phone, email, message, address, wants_offers,
                  created_at, updated_at
        ",
    )
    .bind(&customer.name)
    .bind(customer.phone.as_str())
    .bind(customer.email.as_ref().map(Email::as_str))
    .bind(customer.message.as_deref())
    .bind(customer.address.as_deref())
    .bind(customer.wants_offers)
    .fetch_one(executor)
    .await?;

    row.try_into()
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all customers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, name, phone, email, message, address, wants_offers,
                   created_at, updated_at
            FROM customer
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List the newest customer record per phone number, newest first.
    ///
    /// Checkout creates a customer row per order, so the same person shows up
    /// many times in [`list`](Self::list).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_unique_by_phone(&self) -> Result<Vec<Customer>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT * FROM (
                SELECT DISTINCT ON (phone)
                       id, name, phone, email, message, address, wants_offers,
                       created_at, updated_at
                FROM customer
                ORDER BY phone, created_at DESC, id DESC
            ) latest
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, name, phone, email, message, address, wants_offers,
                   created_at, updated_at
            FROM customer
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get every customer whose ID is in `ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_many(&self, ids: &[CustomerId]) -> Result<Vec<Customer>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(CustomerId::as_i32).collect();
        let rows = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, name, phone, email, message, address, wants_offers,
                   created_at, updated_at
            FROM customer
            WHERE id = ANY($1)
            ",
        )
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Create a customer from the contact form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, customer: &NewCustomer) -> Result<Customer, RepositoryError> {
        insert(self.pool, customer).await
    }

    /// Number of orders referencing a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_orders(&self, id: CustomerId) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM customer_order WHERE customer_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Delete a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no customer has this ID.
    /// Returns `RepositoryError::Conflict` if orders still reference it.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "customer has orders"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
