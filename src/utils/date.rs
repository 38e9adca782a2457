use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AppError;

/// Normalizes a client-supplied date. Accepts RFC 3339 timestamps and plain
/// `YYYY-MM-DD` dates (taken as midnight UTC).
pub fn parse_date(raw: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::BadRequest(format!("{} is not a valid date", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_only_is_midnight_utc() {
        let d = parse_date("2025-05-01", "date").unwrap();
        assert_eq!(d.to_rfc3339(), "2025-05-01T00:00:00+00:00");
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let d = parse_date("2025-05-01T18:00:00+09:00", "date").unwrap();
        assert_eq!(d.to_rfc3339(), "2025-05-01T09:00:00+00:00");
    }

    #[test]
    fn blank_and_garbage_are_rejected() {
        assert!(matches!(parse_date(" ", "date"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_date("May 1st", "date"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_date("2025-02-30", "date"), Err(AppError::BadRequest(_))));
    }
}
