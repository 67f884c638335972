//! Request extractors that reject with the API's JSON error shape.
//!
//! Axum's own `Json` and `Path` rejections answer with plain text; these
//! wrappers convert them into [`AppError`] so every 400 carries `{"message"}`.

use std::marker::PhantomData;
use std::str::FromStr;

use axum::extract::{FromRequest, FromRequestParts, Json, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON body extractor with JSON rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Names the resource in an id rejection, e.g. `Invalid order ID`.
pub trait IdKind {
    const NAME: &'static str;
}

/// Path extractor for a single numeric id.
///
/// A non-numeric segment becomes `400 Invalid <kind> ID`.
#[derive(Debug, Clone, Copy)]
pub struct IdPath<T, K>(pub T, pub PhantomData<K>);

impl<S, T, K> FromRequestParts<S> for IdPath<T, K>
where
    T: FromStr + Send,
    K: IdKind + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let invalid = || AppError::BadRequest(format!("Invalid {} ID", K::NAME));

        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| invalid())?;

        raw.trim()
            .parse::<T>()
            .map(|id| Self(id, PhantomData))
            .map_err(|_| invalid())
    }
}

macro_rules! id_kind {
    ($kind:ident, $name:literal) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $kind;

        impl IdKind for $kind {
            const NAME: &'static str = $name;
        }
    };
}

id_kind!(CustomerKind, "customer");
id_kind!(ProductKind, "product");
id_kind!(OrderKind, "order");
id_kind!(OfferKind, "offer");

/// `/customers/{id}`
pub type CustomerIdPath = IdPath<agfood_core::CustomerId, CustomerKind>;
/// `/products/{id}`
pub type ProductIdPath = IdPath<agfood_core::ProductId, ProductKind>;
/// `/orders/{id}`
pub type OrderIdPath = IdPath<agfood_core::OrderId, OrderKind>;
/// `/offers/{id}`
pub type OfferIdPath = IdPath<agfood_core::OfferId, OfferKind>;
