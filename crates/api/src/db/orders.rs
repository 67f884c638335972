//! Order repository.
//!
//! Placement writes the customer and the order in a single transaction, so a
//! failed order insert never leaves an orphaned customer behind.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use agfood_core::{CustomerId, DeliveryPoint, OrderId, OrderStatus, PaymentStatus};

use super::{CustomerRepository, RepositoryError, customers};
use crate::models::{Customer, NewCustomer, NewOrder, Order, OrderLine, OrderWithCustomer};

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    customer_id: i32,
    products: Json<Vec<OrderLine>>,
    total_price: i32,
    delivery_address: String,
    delivery_point: DeliveryPoint,
    delivery_charge: i32,
    status: OrderStatus,
    payment_method: String,
    payment_status: String,
    transaction_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_status: PaymentStatus = row.payment_status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            customer_id: CustomerId::new(row.customer_id),
            products: row.products.0,
            total_price: row.total_price,
            delivery_address: row.delivery_address,
            delivery_point: row.delivery_point,
            delivery_charge: row.delivery_charge,
            status: row.status,
            payment_method: row.payment_method,
            payment_status,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create the customer and the order referencing it, atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either insert fails; neither
    /// row is kept in that case.
    pub async fn place(
        &self,
        customer: &NewCustomer,
        order: &NewOrder,
    ) -> Result<(Customer, Order), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let customer = customers::insert(&mut *tx, customer).await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO customer_order (
                customer_id, products, total_price, delivery_address,
                delivery_point, delivery_charge, payment_method,
                payment_status, transaction_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, customer_id, products, total_price, delivery_address,
                      delivery_point, delivery_charge, status, payment_method,
                      payment_status, transaction_id, created_at, updated_at
            ",
        )
        .bind(customer.id)
        .bind(Json(&order.products))
        .bind(order.total_price)
        .bind(&order.delivery_address)
        .bind(order.delivery_point)
        .bind(order.delivery_charge)
        .bind(&order.payment_method)
        .bind(order.payment_status.as_str())
        .bind(&order.transaction_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((customer, row.try_into()?))
    }

    /// List all orders newest first, each with its customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid or an
    /// order's customer is missing.
    pub async fn list_with_customers(&self) -> Result<Vec<OrderWithCustomer>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, products, total_price, delivery_address,
                   delivery_point, delivery_charge, status, payment_method,
                   payment_status, transaction_id, created_at, updated_at
            FROM customer_order
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(Order::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut ids: Vec<CustomerId> = orders.iter().map(|o| o.customer_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let customers: HashMap<CustomerId, Customer> = CustomerRepository::new(self.pool)
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        orders
            .into_iter()
            .map(|order| {
                let customer = customers.get(&order.customer_id).cloned().ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "order {} references missing customer {}",
                        order.id, order.customer_id
                    ))
                })?;
                Ok(OrderWithCustomer { order, customer })
            })
            .collect()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, products, total_price, delivery_address,
                   delivery_point, delivery_charge, status, payment_method,
                   payment_status, transaction_id, created_at, updated_at
            FROM customer_order
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an order together with its customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the customer is missing.
    pub async fn get_with_customer(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithCustomer>, RepositoryError> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let customer = CustomerRepository::new(self.pool)
            .get_by_id(order.customer_id)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order {id} references missing customer {}",
                    order.customer_id
                ))
            })?;

        Ok(Some(OrderWithCustomer { order, customer }))
    }

    /// Set the fulfillment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE customer_order
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, customer_id, products, total_price, delivery_address,
                      delivery_point, delivery_charge, status, payment_method,
                      payment_status, transaction_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Set the payment status, and the provider's transaction id when given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn update_payment(
        &self,
        id: OrderId,
        status: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE customer_order
            SET payment_status = $2,
                transaction_id = COALESCE($3, transaction_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, customer_id, products, total_price, delivery_address,
                      delivery_point, delivery_charge, status, payment_method,
                      payment_status, transaction_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(transaction_id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
