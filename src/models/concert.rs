use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    error::AppError,
    utils::{date::parse_date, require_text, validate_optional_url},
};

/// Represents the 'concerts' table in the database.
///
/// `is_active` is not a column: it is derived from the single-row
/// `active_concert` pointer when the concert is read.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Concert {
    pub id: Uuid,
    pub title: String,
    pub venue: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub poster_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated concert fields, shared by create and update.
#[derive(Debug, Clone)]
pub struct ConcertInput {
    pub title: String,
    pub venue: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub poster_url: Option<String>,
}

/// DTO for creating or replacing a concert.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcertRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    pub poster_url: Option<String>,
}

impl ConcertRequest {
    pub fn into_input(self) -> Result<ConcertInput, AppError> {
        let title = require_text(&self.title, "title", 200)?;
        let venue = require_text(&self.venue, "venue", 200)?;
        let start_date = parse_date(&self.start_date, "startDate")?;
        let end_date = parse_date(&self.end_date, "endDate")?;

        if end_date < start_date {
            return Err(AppError::BadRequest(
                "endDate must not be before startDate".to_string(),
            ));
        }

        let poster_url = validate_optional_url(self.poster_url, "posterUrl")?;

        Ok(ConcertInput {
            title,
            venue,
            start_date,
            end_date,
            poster_url,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcertDeleted {
    pub message: String,
    pub id: Uuid,
    pub deleted_setlists: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: &str, end: &str) -> ConcertRequest {
        ConcertRequest {
            title: " Spring Tour ".into(),
            venue: "Dome".into(),
            start_date: start.into(),
            end_date: end.into(),
            poster_url: None,
        }
    }

    #[test]
    fn valid_request_is_normalized() {
        let input = request("2025-05-01", "2025-05-02").into_input().unwrap();
        assert_eq!(input.title, "Spring Tour");
        assert_eq!(input.start_date.to_rfc3339(), "2025-05-01T00:00:00+00:00");
    }

    #[test]
    fn missing_fields_are_rejected() {
        let mut r = request("2025-05-01", "2025-05-02");
        r.venue = "  ".into();
        assert!(matches!(r.into_input(), Err(AppError::BadRequest(_))));
        assert!(matches!(
            request("", "2025-05-02").into_input(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn end_before_start_is_rejected() {
        assert!(matches!(
            request("2025-05-02", "2025-05-01").into_input(),
            Err(AppError::BadRequest(_))
        ));
    }
}
