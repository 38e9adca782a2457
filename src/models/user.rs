// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'users' table in the database.
/// Rows are upserted on every external sign-in, keyed by `google_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Stable identity from the sign-in provider.
    pub google_id: String,

    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,

    /// Unique when set.
    pub nickname: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.name)
    }
}

/// Profile data reported by the sign-in provider.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub google_id: String,
    pub name: String,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// DTO for syncing the signed-in user's profile.
#[derive(Debug, Deserialize, Validate)]
pub struct SyncUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."))]
    pub name: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,
    #[validate(url(message = "Invalid image URL."))]
    pub image: Option<String>,
}

/// DTO for setting a nickname.
#[derive(Debug, Deserialize, Validate)]
pub struct NicknameRequest {
    #[serde(default)]
    #[validate(length(
        min = 2,
        max = 20,
        message = "Nickname length must be between 2 and 20 characters."
    ))]
    pub nickname: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_nickname() {
        let now = Utc::now();
        let mut user = User {
            id: Uuid::new_v4(),
            google_id: "g-1".into(),
            name: "Jamie Doe".into(),
            email: None,
            image: None,
            nickname: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(user.display_name(), "Jamie Doe");
        user.nickname = Some("jd".into());
        assert_eq!(user.display_name(), "jd");
    }
}
