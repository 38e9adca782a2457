//! # Document store contract
//!
//! Every handler reaches persistence through [`Store`]. `PgStore` backs it
//! with PostgreSQL; `MemoryStore` keeps everything in process and is used
//! when no database is configured and by the test suite. Both enforce the
//! same uniqueness rules and report them as [`StoreError::Conflict`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    admin::{Admin, NewAdmin},
    comment::{Comment, NewComment},
    concert::{Concert, ConcertInput},
    event::{Event, EventInput},
    post::{BoardPost, LikeState, NewPost},
    setlist::{SetList, SetListInput},
    user::{User, UserProfile},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const DUPLICATE_SETLIST_DAY: &str = "A setlist for this day already exists";
pub const DUPLICATE_ADMIN_EMAIL: &str = "An admin with this email already exists";
pub const DUPLICATE_NICKNAME: &str = "Nickname is already taken";

/// Keyset position in the board listing: posts strictly before
/// `(created_at, id)` in newest-first order.
pub type PostCursor = (DateTime<Utc>, Uuid);

#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Anything else the backend reported.
    #[error("store failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Which flavour of event listing to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventListing {
    /// Everything, pinned first, then newest date first.
    Admin,
    /// Events dated at or after `now` plus pinned ones, pinned first, then soonest first.
    Upcoming { now: DateTime<Utc> },
}

/// Persistence contract for the community backend.
///
/// Methods returning `Option`/`bool` report a missing target document
/// through that value rather than an error.
#[async_trait]
pub trait Store: Send + Sync {
    // Board posts
    async fn create_post(&self, post: NewPost) -> StoreResult<BoardPost>;
    async fn list_posts(&self, before: Option<PostCursor>, limit: i64) -> StoreResult<Vec<BoardPost>>;
    async fn get_post(&self, id: Uuid) -> StoreResult<Option<BoardPost>>;
    /// Atomically adds one view and returns the updated post.
    async fn increment_views(&self, id: Uuid) -> StoreResult<Option<BoardPost>>;
    /// Atomically removes `user_id` from the likers if present, adds it
    /// otherwise, and keeps `likes` equal to the number of likers.
    async fn toggle_like(&self, id: Uuid, user_id: &str) -> StoreResult<Option<LikeState>>;
    async fn update_post(&self, id: Uuid, title: &str, content: &str) -> StoreResult<Option<BoardPost>>;
    /// Hard-deletes the post together with its comments.
    async fn delete_post(&self, id: Uuid) -> StoreResult<bool>;

    // Comments
    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment>;
    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>>;
    /// All comments of a post, oldest first.
    async fn list_comments(&self, board_id: Uuid) -> StoreResult<Vec<Comment>>;
    /// Updates content only while the comment is not deleted.
    async fn update_comment_content(&self, id: Uuid, content: &str) -> StoreResult<Option<Comment>>;
    /// Marks a live comment deleted. `false` if it is missing or already deleted.
    async fn soft_delete_comment(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;

    // Concerts
    async fn create_concert(&self, input: ConcertInput) -> StoreResult<Concert>;
    async fn list_concerts(&self) -> StoreResult<Vec<Concert>>;
    async fn get_concert(&self, id: Uuid) -> StoreResult<Option<Concert>>;
    async fn update_concert(&self, id: Uuid, input: ConcertInput) -> StoreResult<Option<Concert>>;
    /// Deletes the concert's setlists, then the concert. Returns the number
    /// of setlists removed, or `None` if the concert did not exist.
    async fn delete_concert(&self, id: Uuid) -> StoreResult<Option<u64>>;
    /// Points the single active-concert record at `id` (or clears it when
    /// `active` is false and it currently names `id`).
    async fn set_active_concert(&self, id: Uuid, active: bool) -> StoreResult<Option<Concert>>;
    async fn active_concert(&self) -> StoreResult<Option<Concert>>;

    // Setlists
    async fn create_setlist(&self, input: SetListInput) -> StoreResult<SetList>;
    async fn list_setlists(&self, concert_id: Option<Uuid>) -> StoreResult<Vec<SetList>>;
    async fn get_setlist(&self, id: Uuid) -> StoreResult<Option<SetList>>;
    async fn update_setlist(&self, id: Uuid, input: SetListInput) -> StoreResult<Option<SetList>>;
    async fn delete_setlist(&self, id: Uuid) -> StoreResult<bool>;

    // Events
    async fn create_event(&self, input: EventInput) -> StoreResult<Event>;
    async fn list_events(&self, listing: EventListing) -> StoreResult<Vec<Event>>;
    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>>;
    async fn update_event(&self, id: Uuid, input: EventInput) -> StoreResult<Option<Event>>;
    async fn set_event_pinned(&self, id: Uuid, pinned: bool) -> StoreResult<Option<Event>>;
    async fn delete_event(&self, id: Uuid) -> StoreResult<bool>;

    // Admins
    async fn insert_admin(&self, admin: NewAdmin) -> StoreResult<Admin>;
    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<Admin>>;
    async fn get_admin(&self, id: Uuid) -> StoreResult<Option<Admin>>;
    async fn record_admin_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;
    async fn update_admin_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;

    // Users
    async fn upsert_user(&self, profile: UserProfile) -> StoreResult<User>;
    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>>;
    async fn set_nickname(&self, google_id: &str, nickname: &str) -> StoreResult<Option<User>>;
}
