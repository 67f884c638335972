//! Cloudinary client for product and offer images.
//!
//! Uploads and deletions are signed requests: the signature is the SHA-256
//! hex digest of the alphabetically sorted parameters (`k=v` joined by `&`)
//! followed by the API secret.
//!
//! # API Reference
//!
//! - Base URL: `https://api.cloudinary.com/v1_1/<cloud_name>`
//! - Upload: `POST /image/upload` (multipart)
//! - Delete: `POST /image/destroy`

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::MediaConfig;

/// Cloudinary API base URL.
const BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Errors that can occur when interacting with the media host.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Stored URL does not point at an uploaded asset.
    #[error("not a Cloudinary asset URL: {0}")]
    UnrecognizedUrl(String),
}

/// Folder an image is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFolder {
    Products,
    Offers,
}

impl MediaFolder {
    /// Folder path on the media host.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "ag/products",
            Self::Offers => "ag/offers",
        }
    }
}

/// An image received from a multipart form, ready to upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedImage {
    /// HTTPS URL stored on the product or offer.
    #[serde(rename = "secure_url")]
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Cloudinary API client.
#[derive(Clone)]
pub struct MediaClient {
    inner: Arc<MediaClientInner>,
}

struct MediaClientInner {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

impl MediaClient {
    /// Create a new Cloudinary client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(MediaClientInner {
                client,
                cloud_name: config.cloud_name.clone(),
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
            }),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{BASE_URL}/{}/image/{action}", self.inner.cloud_name)
    }

    /// Upload an image into `folder`.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Api` if Cloudinary rejects the upload.
    #[tracing::instrument(skip(self, image), fields(file_name = %image.file_name, size = image.bytes.len()))]
    pub async fn upload(
        &self,
        folder: MediaFolder,
        image: ImageUpload,
    ) -> Result<UploadedImage, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let mut params = BTreeMap::new();
        params.insert("folder", folder.as_str().to_string());
        params.insert("timestamp", timestamp);
        let signature = sign(&params, &self.inner.api_secret);

        let mut file = Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(content_type) = image.content_type.as_deref() {
            file = file.mime_str(content_type)?;
        }

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.inner.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .inner
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let uploaded: UploadedImage = self.handle_response(response).await?;
        tracing::info!(public_id = %uploaded.public_id, "Image uploaded");
        Ok(uploaded)
    }

    /// Delete the asset behind a stored URL.
    ///
    /// A `not found` result counts as success.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnrecognizedUrl` if no public id can be derived,
    /// or `MediaError::Api` if Cloudinary rejects the request.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, url: &str) -> Result<(), MediaError> {
        let public_id =
            public_id_from_url(url).ok_or_else(|| MediaError::UnrecognizedUrl(url.to_string()))?;

        let mut params = BTreeMap::new();
        params.insert("public_id", public_id);
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = sign(&params, &self.inner.api_secret);

        let mut form: Vec<(&str, String)> = params.into_iter().collect();
        form.push(("api_key", self.inner.api_key.clone()));
        form.push(("signature", signature));
        form.push(("signature_algorithm", "sha256".to_string()));

        let response = self
            .inner
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await?;

        let result: DestroyResponse = self.handle_response(response).await?;
        match result.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Api {
                status: 200,
                message: format!("destroy returned '{other}'"),
            }),
        }
    }

    /// Release an image, logging instead of failing.
    pub async fn release_best_effort(&self, url: &str) {
        if let Err(e) = self.release(url).await {
            tracing::warn!(error = %e, url = %url, "Failed to release image");
        }
    }

    /// Release an image on a background task.
    pub fn release_in_background(&self, url: String) {
        let client = self.clone();
        tokio::spawn(async move {
            client.release_best_effort(&url).await;
        });
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, MediaError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| MediaError::Parse(format!("Failed to parse response: {e}")));
        }

        let status = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map_or(body, |envelope| envelope.error.message);

        Err(MediaError::Api { status, message })
    }
}

/// Sign request parameters.
fn sign(params: &BTreeMap<&str, String>, secret: &SecretString) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.expose_secret().as_bytes());
    hex::encode(hasher.finalize())
}

/// Derive the public id from a delivery URL.
///
/// `https://res.cloudinary.com/demo/image/upload/v1712/ag/products/bowl.jpg`
/// becomes `ag/products/bowl`.
#[must_use]
pub fn public_id_from_url(url: &str) -> Option<String> {
    let (_, after) = url.split_once("/upload/")?;
    let after = after.split(['?', '#']).next().unwrap_or(after);

    // Drop a leading version segment such as `v1712345678/`
    let path = match after.split_once('/') {
        Some((first, rest))
            if first.len() > 1
                && first.starts_with('v')
                && first.chars().skip(1).all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => after,
    };

    let id = match path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem,
        _ => path,
    };

    (!id.is_empty()).then(|| id.to_string())
}
