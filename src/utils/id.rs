use uuid::Uuid;

use crate::error::AppError;

/// Parses an id taken from a path or body. Malformed ids are a 400, not a 404.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {} id", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hyphenated_ids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "post").unwrap(), id);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_id("42", "post"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_id("", "post"), Err(AppError::BadRequest(_))));
    }
}
