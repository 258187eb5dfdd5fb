//! HTML form payloads
//!
//! URL-encoded forms deserialize straight into these types. The post form is
//! `multipart/form-data` because of its image field and is read by hand.

use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ImageChange, Post, PostInput};
use crate::services::{FieldErrors, MediaError};
use crate::web::middleware::WebError;

/// Format of `<input type="datetime-local">`
const DATETIME_LOCAL: &str = "%Y-%m-%dT%H:%M";

const DATETIME_FORMATS: &[&str] = &[DATETIME_LOCAL, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"];

/// Format a timestamp for a `datetime-local` input
pub fn format_datetime_local(value: DateTime<Utc>) -> String {
    value.format(DATETIME_LOCAL).to_string()
}

/// Parse a `datetime-local` value as UTC
pub fn parse_datetime_local(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// ============================================================================
// Post form
// ============================================================================

/// Submitted post form, as typed
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub category: Option<i64>,
    pub location: Option<i64>,
    pub is_published: bool,
}

impl PostForm {
    /// Empty form for a new post, published now
    pub fn blank() -> Self {
        Self {
            pub_date: format_datetime_local(Utc::now()),
            is_published: true,
            ..Self::default()
        }
    }

    /// Convert to service input.
    ///
    /// Fields that could not be parsed are reported in the returned errors; the
    /// input then carries a placeholder so the rest can still be validated.
    pub fn to_input(&self) -> (PostInput, FieldErrors) {
        let mut errors = FieldErrors::new();

        let pub_date = if self.pub_date.trim().is_empty() {
            errors.add("pub_date", "This field is required.");
            Utc::now()
        } else {
            parse_datetime_local(&self.pub_date).unwrap_or_else(|| {
                errors.add("pub_date", "Enter a valid date/time.");
                Utc::now()
            })
        };

        let input = PostInput {
            title: self.title.trim().to_string(),
            text: self.text.clone(),
            pub_date,
            category_id: self.category,
            location_id: self.location,
            is_published: self.is_published,
        };
        (input, errors)
    }

    /// Read the multipart body of the post form.
    ///
    /// A body cut off by the size limit keeps the fields read so far and
    /// reports an `image` error, so the form can be shown again.
    pub async fn from_multipart(
        mut multipart: Multipart,
        max_file_size: u64,
    ) -> Result<(Self, ImageChange, FieldErrors), WebError> {
        let mut form = PostForm::default();
        let mut upload: Option<(String, Vec<u8>)> = None;
        let mut clear_image = false;
        let mut errors = FieldErrors::new();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => {
                    read_failure(e, max_file_size, &mut errors)?;
                    break;
                }
            };
            let name = field.name().unwrap_or("").to_string();

            if name == "image" {
                let has_file = field.file_name().is_some_and(|f| !f.is_empty());
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                match field.bytes().await {
                    Ok(data) if has_file && !data.is_empty() => {
                        upload = Some((content_type, data.to_vec()));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        read_failure(e, max_file_size, &mut errors)?;
                        break;
                    }
                }
                continue;
            }

            let value = match field.text().await {
                Ok(value) => value,
                Err(e) => {
                    read_failure(e, max_file_size, &mut errors)?;
                    break;
                }
            };

            match name.as_str() {
                "title" => form.title = value,
                "text" => form.text = value,
                "pub_date" => form.pub_date = value,
                "category" => form.category = value.trim().parse().ok(),
                "location" => form.location = value.trim().parse().ok(),
                "is_published" => form.is_published = is_checked(&value),
                "clear_image" => clear_image = is_checked(&value),
                _ => {}
            }
        }

        let image = match (upload, clear_image) {
            (Some(_), true) => {
                errors.add(
                    "image",
                    "Please either submit a file or check the clear checkbox, not both.",
                );
                ImageChange::Keep
            }
            (Some((content_type, data)), false) => ImageChange::Upload { content_type, data },
            (None, true) => ImageChange::Clear,
            (None, false) => ImageChange::Keep,
        };

        Ok((form, image, errors))
    }
}

/// An oversized body becomes an `image` error; any other failure is a bad request
fn read_failure(e: MultipartError, max_file_size: u64, errors: &mut FieldErrors) -> Result<(), WebError> {
    if e.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return Err(WebError::BadRequest(format!("Failed to read multipart: {}", e)));
    }
    let too_large = MediaError::TooLarge {
        max_mb: (max_file_size / 1024 / 1024).max(1),
    };
    errors.add("image", too_large.to_string());
    Ok(())
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_datetime_local(post.pub_date),
            category: post.category_id,
            location: post.location_id,
            is_published: post.is_published,
        }
    }
}

fn is_checked(value: &str) -> bool {
    matches!(value.trim(), "on" | "true" | "1")
}

// ============================================================================
// URL-encoded forms
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

/// `?next=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_local_round_trip() {
        let parsed = parse_datetime_local("2024-06-01T12:30").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-06-01T12:30:00+00:00");
        assert_eq!(format_datetime_local(parsed), "2024-06-01T12:30");

        assert!(parse_datetime_local("2024-06-01 12:30:15").is_some());
        assert!(parse_datetime_local("yesterday").is_none());
    }

    #[test]
    fn test_to_input_reports_bad_date() {
        let form = PostForm {
            title: "  Title  ".into(),
            text: "Body".into(),
            pub_date: "not a date".into(),
            category: Some(1),
            ..PostForm::default()
        };
        let (input, errors) = form.to_input();

        assert_eq!(input.title, "Title");
        assert_eq!(input.category_id, Some(1));
        assert_eq!(errors.get("pub_date"), ["Enter a valid date/time.".to_string()]);

        let (_, errors) = PostForm::default().to_input();
        assert_eq!(errors.get("pub_date"), ["This field is required.".to_string()]);
    }

    #[test]
    fn test_blank_form_is_published() {
        let form = PostForm::blank();
        assert!(form.is_published);
        assert!(parse_datetime_local(&form.pub_date).is_some());
    }

    #[test]
    fn test_passwords_are_not_serialized() {
        let form = RegistrationForm {
            username: "ann".into(),
            password1: "secret".into(),
            ..RegistrationForm::default()
        };
        let json = serde_json::to_string(&form).unwrap();
        assert!(!json.contains("secret"));
    }
}
