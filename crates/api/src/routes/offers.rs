//! Offer route handlers.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::{delete, get, patch},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    db::OfferRepository,
    error::AppError,
    extract::{ApiJson, IdPath, OfferIdPath},
    middleware::RequireAdmin,
    models::{NewOffer, Offer},
    services::MediaFolder,
    state::AppState,
};

use super::{MessageResponse, form::UploadForm, or_not_found};

const NOT_FOUND: &str = "Offer not found";

/// Build the offers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/offers", get(list).post(create))
        .route("/offers/active", get(active))
        .route("/offers/{id}", delete(remove))
        .route("/offers/{id}/status", patch(update_status))
}

/// Response carrying an offer and a status message.
#[derive(Debug, Serialize)]
pub struct OfferResponse {
    pub message: &'static str,
    pub offer: Offer,
}

/// Body of `PATCH /offers/{id}/status`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferStatusRequest {
    pub is_active: Option<bool>,
}

/// Read an offer from the form. New offers are active unless `isActive` says otherwise.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a missing title, malformed dates or a
/// window that ends before it starts.
pub fn new_offer(form: &UploadForm) -> Result<NewOffer, AppError> {
    let title = form
        .text("title")
        .ok_or_else(|| AppError::BadRequest("Title is required".into()))?;

    let starts_at = form.date("startsAt")?;
    let ends_at = form.date("endsAt")?;
    if let (Some(start), Some(end)) = (starts_at, ends_at)
        && end < start
    {
        return Err(AppError::BadRequest(
            "endsAt must not be before startsAt".into(),
        ));
    }

    Ok(NewOffer {
        title,
        description: form.text("description"),
        image_path: None,
        starts_at,
        ends_at,
        is_active: form.flag("isActive")?.unwrap_or(true),
    })
}

/// List every offer, newest first.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Offer>>, AppError> {
    Ok(Json(OfferRepository::new(state.pool()).list().await?))
}

/// Active offers whose window contains now.
#[instrument(skip(state))]
pub async fn active(State(state): State<AppState>) -> Result<Json<Vec<Offer>>, AppError> {
    Ok(Json(
        OfferRepository::new(state.pool())
            .list_current(Utc::now())
            .await?,
    ))
}

/// Create an offer, uploading its image when one is attached.
#[instrument(skip(_admin, state, multipart))]
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<OfferResponse>), AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let mut offer = new_offer(&form)?;

    if let Some(image) = form.take_image() {
        let uploaded = state.media().upload(MediaFolder::Offers, image).await?;
        offer.image_path = Some(uploaded.url);
    }

    let offer = match OfferRepository::new(state.pool()).create(&offer).await {
        Ok(created) => created,
        Err(e) => {
            if let Some(url) = offer.image_path {
                state.media().release_in_background(url);
            }
            return Err(e.into());
        }
    };

    tracing::info!(offer_id = %offer.id, "Offer created");

    Ok((
        StatusCode::CREATED,
        Json(OfferResponse {
            message: "Offer created",
            offer,
        }),
    ))
}

/// Toggle an offer. A missing flag deactivates it.
#[instrument(skip(_admin, state, req))]
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id, _): OfferIdPath,
    ApiJson(req): ApiJson<OfferStatusRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    let offer = OfferRepository::new(state.pool())
        .set_active(id, req.is_active.unwrap_or(false))
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    Ok(Json(OfferResponse {
        message: "Offer status updated",
        offer,
    }))
}

/// Delete an offer and release its image.
#[instrument(skip(_admin, state))]
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    IdPath(id, _): OfferIdPath,
) -> Result<Json<MessageResponse>, AppError> {
    let offer = OfferRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(or_not_found(NOT_FOUND))?;

    if let Some(url) = offer.image_path {
        state.media().release_best_effort(&url).await;
    }

    tracing::info!(offer_id = %id, "Offer deleted");

    Ok(Json(MessageResponse::new("Offer deleted")))
}
