//! PostgreSQL implementation of [`Store`].
//!
//! Uniqueness is enforced by indexes declared in `migrations/`; their
//! violations come back as [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow, types::Json};
use uuid::Uuid;

use super::{
    DUPLICATE_ADMIN_EMAIL, DUPLICATE_NICKNAME, DUPLICATE_SETLIST_DAY, EventListing, PostCursor,
    Store, StoreError, StoreResult,
};
use crate::models::{
    admin::{Admin, AdminRole, NewAdmin},
    comment::{Comment, NewComment},
    concert::{Concert, ConcertInput},
    event::{Event, EventInput, EventKind},
    post::{BoardPost, LikeState, NewPost},
    setlist::{SetList, SetListInput},
    user::{User, UserProfile},
};

const POST_COLUMNS: &str = "id, title, content, author, user_id, image_urls, views, likes, liked_by, created_at, updated_at";

const COMMENT_COLUMNS: &str = "id, board_id, content, author, user_id, parent_id, depth, created_at, updated_at, deleted, deleted_at";

/// `is_active` is derived from the singleton pointer row.
const CONCERT_COLUMNS: &str = "id, title, venue, start_date, end_date, poster_url, \
     EXISTS (SELECT 1 FROM active_concert a WHERE a.concert_id = concerts.id) AS is_active, \
     created_at, updated_at";

const SETLIST_COLUMNS: &str = "id, concert_id, day, date, songs, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, title, date, time, place, poster_url, kind, is_pinned, created_at, updated_at";

const ADMIN_COLUMNS: &str = "id, email, password_hash, name, role, last_login, created_at";

const USER_COLUMNS: &str = "id, google_id, name, email, image, nickname, created_at, updated_at";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let msg = match db_err.constraint() {
                    Some("setlists_concert_day_key") => DUPLICATE_SETLIST_DAY,
                    Some("admins_email_key") => DUPLICATE_ADMIN_EMAIL,
                    Some("users_nickname_key") => DUPLICATE_NICKNAME,
                    _ => "Duplicate value",
                };
                return StoreError::Conflict(msg.to_string());
            }
        }
        StoreError::Backend(err.to_string())
    }
}

fn event_from_row(row: &PgRow) -> StoreResult<Event> {
    let kind: String = row.try_get("kind")?;
    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        place: row.try_get("place")?,
        poster_url: row.try_get("poster_url")?,
        kind: kind
            .parse::<EventKind>()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        is_pinned: row.try_get("is_pinned")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn admin_from_row(row: &PgRow) -> StoreResult<Admin> {
    let role: String = row.try_get("role")?;
    Ok(Admin {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        name: row.try_get("name")?,
        role: role
            .parse::<AdminRole>()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        last_login: row.try_get("last_login")?,
        created_at: row.try_get("created_at")?,
    })
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_post(&self, post: NewPost) -> StoreResult<BoardPost> {
        let sql = format!(
            "INSERT INTO board_posts (id, title, content, author, user_id, image_urls) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {POST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, BoardPost>(&sql)
            .bind(Uuid::new_v4())
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.author)
            .bind(&post.user_id)
            .bind(&post.image_urls)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_posts(&self, before: Option<PostCursor>, limit: i64) -> StoreResult<Vec<BoardPost>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM board_posts \
             WHERE ($1::TIMESTAMPTZ IS NULL OR (created_at, id) < ($1, $2::UUID)) \
             ORDER BY created_at DESC, id DESC LIMIT $3"
        );
        Ok(sqlx::query_as::<_, BoardPost>(&sql)
            .bind(before.map(|(at, _)| at))
            .bind(before.map(|(_, id)| id))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Option<BoardPost>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM board_posts WHERE id = $1");
        Ok(sqlx::query_as::<_, BoardPost>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn increment_views(&self, id: Uuid) -> StoreResult<Option<BoardPost>> {
        let sql = format!(
            "UPDATE board_posts SET views = views + 1 WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, BoardPost>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn toggle_like(&self, id: Uuid, user_id: &str) -> StoreResult<Option<LikeState>> {
        // Membership test and both writes happen in one statement under the
        // row lock. RETURNING sees the new array.
        let row: Option<(i64, bool)> = sqlx::query_as(
            r#"
            UPDATE board_posts
            SET liked_by = CASE WHEN $2 = ANY(liked_by)
                                THEN array_remove(liked_by, $2)
                                ELSE array_append(liked_by, $2) END,
                likes = cardinality(CASE WHEN $2 = ANY(liked_by)
                                         THEN array_remove(liked_by, $2)
                                         ELSE array_append(liked_by, $2) END)
            WHERE id = $1
            RETURNING likes, ($2 = ANY(liked_by)) AS liked
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(likes, liked)| LikeState { likes, liked }))
    }

    async fn update_post(&self, id: Uuid, title: &str, content: &str) -> StoreResult<Option<BoardPost>> {
        let sql = format!(
            "UPDATE board_posts SET title = $2, content = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, BoardPost>(&sql)
            .bind(id)
            .bind(title)
            .bind(content)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        // comments.board_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM board_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let sql = format!(
            "INSERT INTO comments (id, board_id, content, author, user_id, parent_id, depth) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COMMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(comment.board_id)
            .bind(&comment.content)
            .bind(&comment.author)
            .bind(&comment.user_id)
            .bind(comment.parent_id)
            .bind(comment.depth)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_comments(&self, board_id: Uuid) -> StoreResult<Vec<Comment>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE board_id = $1 ORDER BY created_at ASC, id ASC"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(board_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update_comment_content(&self, id: Uuid, content: &str) -> StoreResult<Option<Comment>> {
        let sql = format!(
            "UPDATE comments SET content = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted = FALSE RETURNING {COMMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .bind(content)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn soft_delete_comment(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE comments SET deleted = TRUE, deleted_at = $2 WHERE id = $1 AND deleted = FALSE",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_concert(&self, input: ConcertInput) -> StoreResult<Concert> {
        let sql = format!(
            "INSERT INTO concerts (id, title, venue, start_date, end_date, poster_url) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CONCERT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Concert>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(&input.venue)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.poster_url)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_concerts(&self) -> StoreResult<Vec<Concert>> {
        let sql = format!("SELECT {CONCERT_COLUMNS} FROM concerts ORDER BY start_date DESC");
        Ok(sqlx::query_as::<_, Concert>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_concert(&self, id: Uuid) -> StoreResult<Option<Concert>> {
        let sql = format!("SELECT {CONCERT_COLUMNS} FROM concerts WHERE id = $1");
        Ok(sqlx::query_as::<_, Concert>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_concert(&self, id: Uuid, input: ConcertInput) -> StoreResult<Option<Concert>> {
        let sql = format!(
            "UPDATE concerts SET title = $2, venue = $3, start_date = $4, end_date = $5, \
             poster_url = $6, updated_at = NOW() WHERE id = $1 RETURNING {CONCERT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Concert>(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(&input.venue)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(&input.poster_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_concert(&self, id: Uuid) -> StoreResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM concerts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        // Setlists go first: no setlist may outlive its concert.
        let removed = sqlx::query("DELETE FROM setlists WHERE concert_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // active_concert.concert_id is ON DELETE SET NULL
        sqlx::query("DELETE FROM concerts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(removed))
    }

    async fn set_active_concert(&self, id: Uuid, active: bool) -> StoreResult<Option<Concert>> {
        if self.get_concert(id).await?.is_none() {
            return Ok(None);
        }

        if active {
            sqlx::query(
                "INSERT INTO active_concert (singleton, concert_id) VALUES (TRUE, $1) \
                 ON CONFLICT (singleton) DO UPDATE SET concert_id = EXCLUDED.concert_id",
            )
            .bind(id)
            .execute(&self.pool)
            .await?;
        } else {
            sqlx::query("UPDATE active_concert SET concert_id = NULL WHERE concert_id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        self.get_concert(id).await
    }

    async fn active_concert(&self) -> StoreResult<Option<Concert>> {
        let sql = format!(
            "SELECT {CONCERT_COLUMNS} FROM concerts \
             WHERE id = (SELECT concert_id FROM active_concert WHERE singleton)"
        );
        Ok(sqlx::query_as::<_, Concert>(&sql)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_setlist(&self, input: SetListInput) -> StoreResult<SetList> {
        let sql = format!(
            "INSERT INTO setlists (id, concert_id, day, date, songs) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SETLIST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, SetList>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.concert_id)
            .bind(input.day)
            .bind(input.date)
            .bind(Json(&input.songs))
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_setlists(&self, concert_id: Option<Uuid>) -> StoreResult<Vec<SetList>> {
        let sql = format!(
            "SELECT {SETLIST_COLUMNS} FROM setlists \
             WHERE ($1::UUID IS NULL OR concert_id = $1) ORDER BY concert_id, day"
        );
        Ok(sqlx::query_as::<_, SetList>(&sql)
            .bind(concert_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_setlist(&self, id: Uuid) -> StoreResult<Option<SetList>> {
        let sql = format!("SELECT {SETLIST_COLUMNS} FROM setlists WHERE id = $1");
        Ok(sqlx::query_as::<_, SetList>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_setlist(&self, id: Uuid, input: SetListInput) -> StoreResult<Option<SetList>> {
        let sql = format!(
            "UPDATE setlists SET concert_id = $2, day = $3, date = $4, songs = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING {SETLIST_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, SetList>(&sql)
            .bind(id)
            .bind(input.concert_id)
            .bind(input.day)
            .bind(input.date)
            .bind(Json(&input.songs))
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_setlist(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM setlists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_event(&self, input: EventInput) -> StoreResult<Event> {
        let sql = format!(
            "INSERT INTO events (id, title, date, time, place, poster_url, kind) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.title)
            .bind(input.date)
            .bind(&input.time)
            .bind(&input.place)
            .bind(&input.poster_url)
            .bind(input.kind.as_str())
            .fetch_one(&self.pool)
            .await?;
        event_from_row(&row)
    }

    async fn list_events(&self, listing: EventListing) -> StoreResult<Vec<Event>> {
        let rows = match listing {
            EventListing::Admin => {
                let sql = format!(
                    "SELECT {EVENT_COLUMNS} FROM events ORDER BY is_pinned DESC, date DESC"
                );
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
            EventListing::Upcoming { now } => {
                let sql = format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE date >= $1 OR is_pinned \
                     ORDER BY is_pinned DESC, date ASC"
                );
                sqlx::query(&sql).bind(now).fetch_all(&self.pool).await?
            }
        };
        rows.iter().map(event_from_row).collect()
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn update_event(&self, id: Uuid, input: EventInput) -> StoreResult<Option<Event>> {
        let sql = format!(
            "UPDATE events SET title = $2, date = $3, time = $4, place = $5, poster_url = $6, \
             kind = $7, updated_at = NOW() WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&input.title)
            .bind(input.date)
            .bind(&input.time)
            .bind(&input.place)
            .bind(&input.poster_url)
            .bind(input.kind.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn set_event_pinned(&self, id: Uuid, pinned: bool) -> StoreResult<Option<Event>> {
        let sql = format!(
            "UPDATE events SET is_pinned = $2, updated_at = NOW() WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(pinned)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_admin(&self, admin: NewAdmin) -> StoreResult<Admin> {
        let sql = format!(
            "INSERT INTO admins (id, email, password_hash, name, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ADMIN_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(admin.email.to_lowercase())
            .bind(&admin.password_hash)
            .bind(&admin.name)
            .bind(admin.role.as_str())
            .fetch_one(&self.pool)
            .await?;
        admin_from_row(&row)
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(admin_from_row).transpose()
    }

    async fn get_admin(&self, id: Uuid) -> StoreResult<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(admin_from_row).transpose()
    }

    async fn record_admin_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE admins SET last_login = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_admin_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE admins SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_user(&self, profile: UserProfile) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, google_id, name, email, image) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (google_id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email, \
             image = EXCLUDED.image, updated_at = NOW() RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&profile.google_id)
            .bind(&profile.name)
            .bind(&profile.email)
            .bind(&profile.image)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE google_id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_nickname(&self, google_id: &str, nickname: &str) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET nickname = $2, updated_at = NOW() WHERE google_id = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(google_id)
            .bind(nickname)
            .fetch_optional(&self.pool)
            .await?)
    }
}
