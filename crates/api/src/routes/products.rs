//! Product route handlers.
//!
//! Create and update take `multipart/form-data` with an optional `image` file
//! part. Images live in Cloudinary; the product stores the delivery URL.

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use agfood_core::PriceTiers;

use crate::{
    db::ProductRepository,
    error::AppError,
    extract::{IdPath, ProductIdPath},
    middleware::RequireAdmin,
    models::{Product, ProductChanges, ProductDraft},
    services::{MediaFolder, StoreMoment, available_products},
    state::AppState,
};

use super::{MessageResponse, form::UploadForm, or_not_found};

const NOT_FOUND: &str = "Product not found";
const REQUIRED: &str = "productName, packName and image are required";

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list).post(create))
        .route("/products/available", get(available))
        .route("/products/{id}", get(show).put(update).delete(remove))
}

/// Response carrying a product and a status message.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub message: &'static str,
    pub product: Product,
}

/// Optional overrides for the availability clock.
#[derive(Debug, Default, Deserialize)]
pub struct AvailableQuery {
    /// Weekday name, e.g. `Friday`.
    pub day: Option<String>,
    /// Hour (`17`) or `HH:MM`.
    pub time: Option<String>,
}

/// Read every product field the form supplies.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for malformed prices, lists or weekdays.
pub fn product_changes(form: &UploadForm) -> Result<ProductChanges, AppError> {
    Ok(ProductChanges {
        product_name: form.text("productName"),
        pack_name: form.text("packName"),
        weight: form.text("weight"),
        protein_intake: form.text("proteinIntake"),
        available_day: form.weekdays("availableDay")?,
        available_time: form.text("availableTime"),
        single_order: form.price("singleOrder")?,
        weekly_subscription: form.price("weeklySubscription")?,
        monthly_subscription: form.price("monthlySubscription")?,
        image_path: None,
        ingredients: form.list("ingredients")?,
        discounts: form.list("discounts")?,
        description: form.text("description"),
    })
}

/// Turn a complete set of fields into a new product.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when the name or pack name is missing.
pub fn product_draft(changes: ProductChanges, image_path: String) -> Result<ProductDraft, AppError> {
    let (Some(product_name), Some(pack_name)) = (changes.product_name, changes.pack_name) else {
        return Err(AppError::BadRequest(REQUIRED.into()));
    };

    Ok(ProductDraft {
        product_name,
        pack_name,
        weight: changes.weight.unwrap_or_default(),
        protein_intake: changes.protein_intake.unwrap_or_default(),
        available_day: changes.available_day.unwrap_or_default(),
        available_time: changes.available_time.unwrap_or_default(),
        prices: PriceTiers {
            single_order: changes.single_order.unwrap_or_default(),
            weekly_subscription: changes.weekly_subscription.unwrap_or_default(),
            monthly_subscription: changes.monthly_subscription.unwrap_or_default(),
        },
        image_path,
        ingredients: changes.ingredients.unwrap_or_default(),
        discounts: changes.discounts.unwrap_or_default(),
        description: changes.description.unwrap_or_default(),
    })
}

/// List every product in id order.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(ProductRepository::new(state.pool()).list().await?))
}

/// Products visible in the storefront now, or at `?day=&time=`.
#[instrument(skip(state))]
pub async fn available(
    State(state): State<AppState>,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let moment = StoreMoment::resolve(
        Utc::now(),
        state.config().store_offset,
        query.day.as_deref(),
        query.time.as_deref(),
    )?;

    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(available_products(products, moment)))
}

/// Get a single product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    IdPath(id, _): ProductIdPath,
) -> Result<Json<Product>, AppError> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))
}

/// Create a product with its image.
#[instrument(skip(_admin, state, multipart))]
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let changes = product_changes(&form)?;

    let named = changes.product_name.is_some() && changes.pack_name.is_some();
    let (true, Some(image)) = (named, form.take_image()) else {
        return Err(AppError::BadRequest(REQUIRED.into()));
    };

    let uploaded = state.media().upload(MediaFolder::Products, image).await?;
    let draft = product_draft(changes, uploaded.url)?;

    let product = match ProductRepository::new(state.pool()).create(&draft).await {
        Ok(product) => product,
        Err(e) => {
            state.media().release_in_background(draft.image_path);
            return Err(e.into());
        }
    };

    tracing::info!(product_id = %product.id, "Product created");

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created",
            product,
        }),
    ))
}

/// Update the supplied fields of a product.
///
/// A new image is uploaded before the row changes; the old one is released
/// afterwards on a background task.
#[instrument(skip(_admin, state, multipart))]
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id, _): ProductIdPath,
    multipart: Multipart,
) -> Result<Json<ProductResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let mut changes = product_changes(&form)?;

    let repo = ProductRepository::new(state.pool());
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;

    if let Some(image) = form.take_image() {
        let uploaded = state.media().upload(MediaFolder::Products, image).await?;
        changes.image_path = Some(uploaded.url);
    }

    let product = match repo.update(id, &changes).await {
        Ok(product) => product,
        Err(e) => {
            if let Some(url) = changes.image_path {
                state.media().release_in_background(url);
            }
            return Err(or_not_found(NOT_FOUND)(e));
        }
    };

    if changes.image_path.is_some() && existing.image_path != product.image_path {
        state.media().release_in_background(existing.image_path);
    }

    tracing::info!(product_id = %id, "Product updated");

    Ok(Json(ProductResponse {
        message: "Product updated",
        product,
    }))
}

/// Delete a product and release its image.
#[instrument(skip(_admin, state))]
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id, _): ProductIdPath,
) -> Result<Json<MessageResponse>, AppError> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.into()))?;

    if !product.image_path.is_empty() {
        state.media().release_best_effort(&product.image_path).await;
    }

    repo.delete(id).await.map_err(or_not_found(NOT_FOUND))?;

    tracing::info!(product_id = %id, "Product deleted");

    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
