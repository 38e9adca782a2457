use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'board_posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPost {
    pub id: Uuid,
    pub title: String,
    pub content: String,

    /// Display name of the author at the time of posting.
    pub author: String,

    /// Owning user. Legacy posts may not have one and are then read-only.
    pub user_id: Option<String>,

    pub image_urls: Vec<String>,

    pub views: i64,
    pub likes: i64,

    /// Users who currently like the post. Kept server-side only.
    #[serde(skip)]
    pub liked_by: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardPost {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

/// Values the store needs to insert a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub user_id: String,
    pub image_urls: Vec<String>,
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title length must be between 1 and 100 chars"
    ))]
    pub title: String,

    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content length must be between 1 and 10000 chars"
    ))]
    pub content: String,

    #[serde(default)]
    #[validate(
        length(max = 10, message = "At most 10 images can be attached"),
        custom(function = crate::utils::validate_image_urls)
    )]
    pub image_urls: Vec<String>,
}

impl CreatePostRequest {
    /// Trims title and content; length rules apply to the trimmed text.
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            image_urls: self.image_urls,
        }
    }
}

/// DTO for editing a post. Both fields are required on every edit.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 100,
        message = "Title length must be between 1 and 100 chars"
    ))]
    pub title: String,

    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 10000,
        message = "Content length must be between 1 and 10000 chars"
    ))]
    pub content: String,
}

impl UpdatePostRequest {
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
        }
    }
}

/// Query parameters for listing posts.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListParams {
    /// Cursor for pagination: the created_at timestamp of the last post in the previous page.
    pub cursor: Option<DateTime<Utc>>,

    /// Id of the last post in the previous page. Breaks ties between posts
    /// created at the same instant.
    pub cursor_id: Option<Uuid>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}

impl PostListParams {
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    /// Keyset position to continue from. A bare timestamp pairs with the
    /// nil id, which skips every post created at that instant.
    pub fn cursor(&self) -> Option<(DateTime<Utc>, Uuid)> {
        self.cursor
            .map(|at| (at, self.cursor_id.unwrap_or_else(Uuid::nil)))
    }
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub likes: i64,
    pub liked: bool,
}
