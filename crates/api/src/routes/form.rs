//! Multipart form parsing for product and offer uploads.
//!
//! List fields (`availableDay`, `ingredients`, `discounts`) accept exactly one
//! wire format: a JSON array of strings. Anything else is rejected rather
//! than silently stored as an empty list.

use std::collections::HashMap;

use axum::extract::Multipart;
use chrono::{DateTime, NaiveDate, Utc};

use agfood_core::{parse_weekday, weekday_name};

use crate::error::AppError;
use crate::services::ImageUpload;

/// Name of the file part carrying the image.
const IMAGE_FIELD: &str = "image";

/// Text fields and the optional image from a multipart body.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    image: Option<ImageUpload>,
}

impl UploadForm {
    /// Drain a multipart body.
    ///
    /// An `image` part without bytes (an empty file input) is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;

                if !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Build a form from literal fields.
    #[cfg(test)]
    pub(crate) fn from_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            image: None,
        }
    }

    /// Take the uploaded image, if any.
    pub fn take_image(&mut self) -> Option<ImageUpload> {
        self.image.take()
    }

    /// A trimmed text field, `None` when absent or blank.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// A non-negative integer price field.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` when the value is not a non-negative integer.
    pub fn price(&self, name: &str) -> Result<Option<i32>, AppError> {
        self.text(name).map(|raw| parse_price(name, &raw)).transpose()
    }

    /// A JSON array of strings.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` unless the value is a JSON array of strings.
    pub fn list(&self, name: &str) -> Result<Option<Vec<String>>, AppError> {
        self.text(name).map(|raw| parse_string_list(name, &raw)).transpose()
    }

    /// A JSON array of weekday names, normalized.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a malformed list or an unknown weekday.
    pub fn weekdays(&self, name: &str) -> Result<Option<Vec<String>>, AppError> {
        self.list(name)?.map(|days| normalize_weekdays(&days)).transpose()
    }

    /// An RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC).
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for any other format.
    pub fn date(&self, name: &str) -> Result<Option<DateTime<Utc>>, AppError> {
        self.text(name).map(|raw| parse_date(name, &raw)).transpose()
    }

    /// A boolean flag (`true`/`false`, `1`/`0`, `on`).
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for any other value.
    pub fn flag(&self, name: &str) -> Result<Option<bool>, AppError> {
        self.text(name)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Ok(true),
                "false" | "0" | "off" | "no" => Ok(false),
                _ => Err(AppError::BadRequest(format!("{name} must be true or false"))),
            })
            .transpose()
    }
}

fn parse_price(name: &str, raw: &str) -> Result<i32, AppError> {
    raw.parse::<i32>()
        .ok()
        .filter(|p| *p >= 0)
        .ok_or_else(|| AppError::BadRequest(format!("{name} must be a non-negative integer")))
}

fn parse_string_list(name: &str, raw: &str) -> Result<Vec<String>, AppError> {
    let items: Vec<String> = serde_json::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("{name} must be a JSON array of strings")))?;

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

/// Capitalise weekday names and drop duplicates, keeping first-seen order.
fn normalize_weekdays(days: &[String]) -> Result<Vec<String>, AppError> {
    let mut normalized: Vec<String> = Vec::with_capacity(days.len());

    for day in days {
        let weekday = parse_weekday(day)
            .map_err(|_| AppError::BadRequest(format!("Invalid weekday: {day}")))?;
        let name = weekday_name(weekday).to_string();
        if !normalized.contains(&name) {
            normalized.push(name);
        }
    }

    Ok(normalized)
}

fn parse_date(name: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            AppError::BadRequest(format!("{name} must be an RFC 3339 timestamp or YYYY-MM-DD"))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(m) => m,
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_list_requires_json_array() {
        let form = UploadForm::from_fields(&[
            ("ingredients", r#"["Millet", " Curd ", ""]"#),
            ("discounts", "10% off"),
            ("availableDay", r#"{"day":"Monday"}"#),
        ]);

        assert_eq!(
            form.list("ingredients").unwrap(),
            Some(vec!["Millet".to_string(), "Curd".to_string()])
        );
        assert_eq!(
            message(form.list("discounts").unwrap_err()),
            "discounts must be a JSON array of strings"
        );
        assert_eq!(
            message(form.list("availableDay").unwrap_err()),
            "availableDay must be a JSON array of strings"
        );
    }

    #[test]
    fn test_list_rejects_non_string_items() {
        let form = UploadForm::from_fields(&[("ingredients", "[1, 2]")]);
        assert!(form.list("ingredients").is_err());
    }

    #[test]
    fn test_absent_list_is_none() {
        let form = UploadForm::from_fields(&[("ingredients", "  ")]);
        assert_eq!(form.list("ingredients").unwrap(), None);
        assert_eq!(form.list("discounts").unwrap(), None);
    }

    #[test]
    fn test_weekdays_are_capitalised_and_deduplicated() {
        let form = UploadForm::from_fields(&[(
            "availableDay",
            r#"["monday", "FRIDAY", "Monday", "fri"]"#,
        )]);
        assert_eq!(
            form.weekdays("availableDay").unwrap(),
            Some(vec!["Monday".to_string(), "Friday".to_string()])
        );

        let form = UploadForm::from_fields(&[("availableDay", r#"["Funday"]"#)]);
        assert_eq!(
            message(form.weekdays("availableDay").unwrap_err()),
            "Invalid weekday: Funday"
        );
    }

    #[test]
    fn test_price_must_be_non_negative_integer() {
        let form = UploadForm::from_fields(&[
            ("singleOrder", "150"),
            ("weeklySubscription", "-5"),
            ("monthlySubscription", "12.5"),
        ]);
        assert_eq!(form.price("singleOrder").unwrap(), Some(150));
        assert!(form.price("weeklySubscription").is_err());
        assert!(form.price("monthlySubscription").is_err());
    }

    #[test]
    fn test_dates_accept_rfc3339_and_plain_dates() {
        let form = UploadForm::from_fields(&[
            ("startsAt", "2026-03-01"),
            ("endsAt", "2026-03-31T18:30:00+05:30"),
            ("bad", "next week"),
        ]);
        assert_eq!(
            form.date("startsAt").unwrap().unwrap().to_rfc3339(),
            "2026-03-01T00:00:00+00:00"
        );
        assert_eq!(
            form.date("endsAt").unwrap().unwrap().to_rfc3339(),
            "2026-03-31T13:00:00+00:00"
        );
        assert!(form.date("bad").is_err());
    }

    #[test]
    fn test_flag_values() {
        let form = UploadForm::from_fields(&[("a", "true"), ("b", "0"), ("c", "maybe")]);
        assert_eq!(form.flag("a").unwrap(), Some(true));
        assert_eq!(form.flag("b").unwrap(), Some(false));
        assert!(form.flag("c").is_err());
        assert_eq!(form.flag("missing").unwrap(), None);
    }
}
