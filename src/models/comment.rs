use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::config::DELETED_COMMENT_PLACEHOLDER;

/// Represents the 'comments' table in the database.
///
/// Comments form a flat list; `parent_id` plus `depth` describe the tree.
/// Depth is capped at 1, so a reply never has replies of its own.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub board_id: Uuid,
    pub content: String,
    pub author: String,
    pub user_id: Option<String>,
    pub parent_id: Option<Uuid>,
    pub depth: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Comment {
    /// Hides content, author and owner of a deleted comment while keeping
    /// the fields replies are grouped by.
    pub fn redacted(mut self) -> Self {
        if self.deleted {
            self.content = DELETED_COMMENT_PLACEHOLDER.to_string();
            self.author = String::new();
            self.user_id = None;
        }
        self
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}

/// Values the store needs to insert a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub board_id: Uuid,
    pub content: String,
    pub author: String,
    pub user_id: Option<String>,
    pub parent_id: Option<Uuid>,
    pub depth: i32,
}

/// A top-level comment with its direct replies.
#[derive(Debug, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentNode>,
    pub total: usize,
}

/// Groups a chronologically ordered flat list into top-level comments and
/// their replies. Replies whose parent is not a top-level comment in the
/// list are dropped.
pub fn build_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    let (roots, replies): (Vec<Comment>, Vec<Comment>) =
        comments.into_iter().partition(|c| c.parent_id.is_none());

    let mut by_parent: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id {
            by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    roots
        .into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.id).unwrap_or_default();
            CommentNode { comment, replies }
        })
        .collect()
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 500,
        message = "Comment must be between 1 and 500 characters"
    ))]
    pub content: String,

    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 50,
        message = "Author must be between 1 and 50 characters"
    ))]
    pub author: String,

    /// Optional: the ID of the comment being replied to.
    pub parent_id: Option<String>,
}

impl CreateCommentRequest {
    /// Trims user text; length rules apply to what gets stored.
    pub fn trimmed(self) -> Self {
        Self {
            content: self.content.trim().to_string(),
            author: self.author.trim().to_string(),
            parent_id: self
                .parent_id
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        }
    }
}

/// DTO for editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 500,
        message = "Comment must be between 1 and 500 characters"
    ))]
    pub content: String,
}

impl UpdateCommentRequest {
    pub fn trimmed(self) -> Self {
        Self {
            content: self.content.trim().to_string(),
        }
    }
}
