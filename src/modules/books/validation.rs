//! Payload validation for create and partial update.

use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::models::{BookPayload, BookPatch, NewBook};

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

/// Every problem found in a payload, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} invalid field(s)", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

#[derive(Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn reject(&mut self, field: &'static str, error: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            error: error.into(),
        });
    }

    /// Present and non-blank. The value is kept as submitted.
    fn required(&mut self, field: &'static str, value: Option<String>) -> String {
        match value {
            Some(value) if !value.trim().is_empty() => value,
            Some(_) => {
                self.reject(field, "must not be empty");
                String::new()
            }
            None => {
                self.reject(field, "required");
                String::new()
            }
        }
    }

    /// Non-blank when supplied.
    fn non_empty(&mut self, field: &'static str, value: Option<String>) -> Option<String> {
        match value {
            Some(value) if value.trim().is_empty() => {
                self.reject(field, "must not be empty");
                None
            }
            other => other,
        }
    }

    /// An absolute http(s) URL when supplied.
    fn url(&mut self, field: &'static str, value: Option<String>) -> Option<String> {
        let value = value?;
        match check_url(&value) {
            Ok(()) => Some(value),
            Err(reason) => {
                self.reject(field, reason);
                None
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

fn check_url(value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| format!("invalid URL: {}", e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("URL scheme '{}' is not http or https", url.scheme()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err("URL has no host".to_string());
    }

    Ok(())
}

/// Validate a creation payload.
pub fn validate_create(payload: BookPayload) -> Result<NewBook, ValidationErrors> {
    let mut check = Collector::default();

    let book = NewBook {
        title: check.required("title", payload.title),
        author: check.required("author", payload.author),
        genre: check.required("genre", payload.genre),
        description: payload.description,
        cover_url: check.url("cover_url", payload.cover_url),
        content: payload.content,
        audio_summary_url: check.url("audio_summary_url", payload.audio_summary_url),
        tags: payload.tags,
    };

    check.finish(book)
}

/// Validate a partial update payload. Absent and `null` fields stay unset.
pub fn validate_update(payload: BookPayload) -> Result<BookPatch, ValidationErrors> {
    let mut check = Collector::default();

    let patch = BookPatch {
        title: check.non_empty("title", payload.title),
        author: check.non_empty("author", payload.author),
        genre: check.non_empty("genre", payload.genre),
        description: payload.description,
        cover_url: check.url("cover_url", payload.cover_url),
        content: payload.content,
        audio_summary_url: check.url("audio_summary_url", payload.audio_summary_url),
        tags: payload.tags,
    };

    check.finish(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> BookPayload {
        serde_json::from_value(json).unwrap()
    }

    fn fields(errors: &ValidationErrors) -> Vec<&'static str> {
        errors.0.iter().map(|e| e.field).collect()
    }

    #[test]
    fn accepts_minimal_book() {
        let book = validate_create(payload(serde_json::json!({
            "title": "Dune",
            "author": "Herbert",
            "genre": "SciFi",
        })))
        .unwrap();

        assert_eq!(book.title, "Dune");
        assert_eq!(book.tags, None);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let book = validate_create(payload(serde_json::json!({
            "title": "Dune",
            "author": "Herbert",
            "genre": "SciFi",
            "rating": 5,
            "_id": "forged",
        })))
        .unwrap();

        assert_eq!(book.genre, "SciFi");
    }

    #[test]
    fn reports_every_missing_required_field() {
        let errors = validate_create(payload(serde_json::json!({ "title": "   " }))).unwrap_err();

        assert_eq!(fields(&errors), vec!["title", "author", "genre"]);
        assert_eq!(errors.0[0].error, "must not be empty");
        assert_eq!(errors.0[1].error, "required");
    }

    #[test]
    fn urls_must_be_absolute_http() {
        for bad in ["not a url", "/covers/dune.jpg", "ftp://covers.example/dune.jpg", "mailto:a@b.c"] {
            let errors = validate_create(payload(serde_json::json!({
                "title": "Dune",
                "author": "Herbert",
                "genre": "SciFi",
                "cover_url": bad,
            })))
            .unwrap_err();
            assert_eq!(fields(&errors), vec!["cover_url"], "{bad} should be rejected");
        }

        let book = validate_create(payload(serde_json::json!({
            "title": "Dune",
            "author": "Herbert",
            "genre": "SciFi",
            "cover_url": "https://covers.example/dune.jpg",
            "audio_summary_url": "http://audio.example/dune.mp3",
        })))
        .unwrap();
        assert_eq!(
            book.audio_summary_url.as_deref(),
            Some("http://audio.example/dune.mp3")
        );
    }

    #[test]
    fn update_with_nulls_is_empty() {
        let patch = validate_update(payload(serde_json::json!({
            "title": null,
            "tags": null,
            "unknown": "ignored",
        })))
        .unwrap();

        assert!(patch.is_empty());
    }

    #[test]
    fn update_rejects_blank_required_and_bad_urls() {
        let errors = validate_update(payload(serde_json::json!({
            "genre": "",
            "audio_summary_url": "summary.mp3",
        })))
        .unwrap_err();

        assert_eq!(fields(&errors), vec!["genre", "audio_summary_url"]);
    }

    #[test]
    fn update_keeps_supplied_fields_only() {
        let patch = validate_update(payload(serde_json::json!({ "genre": "Fantasy" }))).unwrap();

        assert_eq!(patch.genre.as_deref(), Some("Fantasy"));
        assert_eq!(patch.title, None);
    }
}
