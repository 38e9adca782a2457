//! In-process implementation of [`Store`].
//!
//! A single `RwLock` guards all collections, so every method observes and
//! mutates them atomically, like a single-document update in the database.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    DUPLICATE_ADMIN_EMAIL, DUPLICATE_NICKNAME, DUPLICATE_SETLIST_DAY, EventListing, PostCursor,
    Store, StoreError, StoreResult,
};
use crate::models::{
    admin::{Admin, NewAdmin},
    comment::{Comment, NewComment},
    concert::{Concert, ConcertInput},
    event::{Event, EventInput, admin_order, upcoming_order},
    post::{BoardPost, LikeState, NewPost},
    setlist::{SetList, SetListInput},
    user::{User, UserProfile},
};

#[derive(Default)]
struct Collections {
    posts: HashMap<Uuid, BoardPost>,
    /// Insertion order is creation order.
    comments: Vec<Comment>,
    concerts: HashMap<Uuid, Concert>,
    active_concert: Option<Uuid>,
    setlists: HashMap<Uuid, SetList>,
    events: HashMap<Uuid, Event>,
    admins: HashMap<Uuid, Admin>,
    /// Keyed by google id.
    users: HashMap<String, User>,
}

impl Collections {
    fn concert_view(&self, concert: &Concert) -> Concert {
        let mut concert = concert.clone();
        concert.is_active = self.active_concert == Some(concert.id);
        concert
    }

    fn setlist_day_taken(&self, concert_id: Uuid, day: i32, except: Option<Uuid>) -> bool {
        self.setlists
            .values()
            .any(|s| s.concert_id == concert_id && s.day == day && Some(s.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_post(&self, post: NewPost) -> StoreResult<BoardPost> {
        let now = Utc::now();
        let post = BoardPost {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            author: post.author,
            user_id: Some(post.user_id),
            image_urls: post.image_urls,
            views: 0,
            likes: 0,
            liked_by: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn list_posts(&self, before: Option<PostCursor>, limit: i64) -> StoreResult<Vec<BoardPost>> {
        let db = self.inner.read().await;
        let mut posts: Vec<BoardPost> = db
            .posts
            .values()
            .filter(|p| before.is_none_or(|cursor| (p.created_at, p.id) < cursor))
            .cloned()
            .collect();
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Option<BoardPost>> {
        Ok(self.inner.read().await.posts.get(&id).cloned())
    }

    async fn increment_views(&self, id: Uuid) -> StoreResult<Option<BoardPost>> {
        let mut db = self.inner.write().await;
        Ok(db.posts.get_mut(&id).map(|post| {
            post.views += 1;
            post.clone()
        }))
    }

    async fn toggle_like(&self, id: Uuid, user_id: &str) -> StoreResult<Option<LikeState>> {
        let mut db = self.inner.write().await;
        let Some(post) = db.posts.get_mut(&id) else {
            return Ok(None);
        };

        let liked = if let Some(pos) = post.liked_by.iter().position(|u| u == user_id) {
            post.liked_by.remove(pos);
            false
        } else {
            post.liked_by.push(user_id.to_string());
            true
        };
        post.likes = post.liked_by.len() as i64;

        Ok(Some(LikeState {
            likes: post.likes,
            liked,
        }))
    }

    async fn update_post(&self, id: Uuid, title: &str, content: &str) -> StoreResult<Option<BoardPost>> {
        let mut db = self.inner.write().await;
        Ok(db.posts.get_mut(&id).map(|post| {
            post.title = title.to_string();
            post.content = content.to_string();
            post.updated_at = Utc::now();
            post.clone()
        }))
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        if db.posts.remove(&id).is_none() {
            return Ok(false);
        }
        db.comments.retain(|c| c.board_id != id);
        Ok(true)
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            board_id: comment.board_id,
            content: comment.content,
            author: comment.author,
            user_id: comment.user_id,
            parent_id: comment.parent_id,
            depth: comment.depth,
            created_at: now,
            updated_at: now,
            deleted: false,
            deleted_at: None,
        };
        self.inner.write().await.comments.push(comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        let db = self.inner.read().await;
        Ok(db.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(&self, board_id: Uuid) -> StoreResult<Vec<Comment>> {
        let db = self.inner.read().await;
        let mut comments: Vec<Comment> = db
            .comments
            .iter()
            .filter(|c| c.board_id == board_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn update_comment_content(&self, id: Uuid, content: &str) -> StoreResult<Option<Comment>> {
        let mut db = self.inner.write().await;
        Ok(db
            .comments
            .iter_mut()
            .find(|c| c.id == id && !c.deleted)
            .map(|c| {
                c.content = content.to_string();
                c.updated_at = Utc::now();
                c.clone()
            }))
    }

    async fn soft_delete_comment(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.comments.iter_mut().find(|c| c.id == id && !c.deleted) {
            Some(c) => {
                c.deleted = true;
                c.deleted_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_concert(&self, input: ConcertInput) -> StoreResult<Concert> {
        let now = Utc::now();
        let concert = Concert {
            id: Uuid::new_v4(),
            title: input.title,
            venue: input.venue,
            start_date: input.start_date,
            end_date: input.end_date,
            poster_url: input.poster_url,
            is_active: false,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.concerts.insert(concert.id, concert.clone());
        Ok(concert)
    }

    async fn list_concerts(&self) -> StoreResult<Vec<Concert>> {
        let db = self.inner.read().await;
        let mut concerts: Vec<Concert> = db.concerts.values().map(|c| db.concert_view(c)).collect();
        concerts.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(concerts)
    }

    async fn get_concert(&self, id: Uuid) -> StoreResult<Option<Concert>> {
        let db = self.inner.read().await;
        Ok(db.concerts.get(&id).map(|c| db.concert_view(c)))
    }

    async fn update_concert(&self, id: Uuid, input: ConcertInput) -> StoreResult<Option<Concert>> {
        let mut db = self.inner.write().await;
        let Some(concert) = db.concerts.get_mut(&id) else {
            return Ok(None);
        };
        concert.title = input.title;
        concert.venue = input.venue;
        concert.start_date = input.start_date;
        concert.end_date = input.end_date;
        concert.poster_url = input.poster_url;
        concert.updated_at = Utc::now();
        let concert = concert.clone();
        Ok(Some(db.concert_view(&concert)))
    }

    async fn delete_concert(&self, id: Uuid) -> StoreResult<Option<u64>> {
        let mut db = self.inner.write().await;
        if !db.concerts.contains_key(&id) {
            return Ok(None);
        }

        let before = db.setlists.len();
        db.setlists.retain(|_, s| s.concert_id != id);
        let removed = (before - db.setlists.len()) as u64;

        db.concerts.remove(&id);
        if db.active_concert == Some(id) {
            db.active_concert = None;
        }
        Ok(Some(removed))
    }

    async fn set_active_concert(&self, id: Uuid, active: bool) -> StoreResult<Option<Concert>> {
        let mut db = self.inner.write().await;
        if !db.concerts.contains_key(&id) {
            return Ok(None);
        }

        if active {
            db.active_concert = Some(id);
        } else if db.active_concert == Some(id) {
            db.active_concert = None;
        }
        Ok(db.concerts.get(&id).map(|c| db.concert_view(c)))
    }

    async fn active_concert(&self) -> StoreResult<Option<Concert>> {
        let db = self.inner.read().await;
        Ok(db
            .active_concert
            .and_then(|id| db.concerts.get(&id))
            .map(|c| db.concert_view(c)))
    }

    async fn create_setlist(&self, input: SetListInput) -> StoreResult<SetList> {
        let mut db = self.inner.write().await;
        if db.setlist_day_taken(input.concert_id, input.day, None) {
            return Err(StoreError::Conflict(DUPLICATE_SETLIST_DAY.to_string()));
        }

        let now = Utc::now();
        let setlist = SetList {
            id: Uuid::new_v4(),
            concert_id: input.concert_id,
            day: input.day,
            date: input.date,
            songs: Json(input.songs),
            created_at: now,
            updated_at: now,
        };
        db.setlists.insert(setlist.id, setlist.clone());
        Ok(setlist)
    }

    async fn list_setlists(&self, concert_id: Option<Uuid>) -> StoreResult<Vec<SetList>> {
        let db = self.inner.read().await;
        let mut setlists: Vec<SetList> = db
            .setlists
            .values()
            .filter(|s| concert_id.is_none_or(|id| s.concert_id == id))
            .cloned()
            .collect();
        setlists.sort_by_key(|s| (s.concert_id, s.day));
        Ok(setlists)
    }

    async fn get_setlist(&self, id: Uuid) -> StoreResult<Option<SetList>> {
        Ok(self.inner.read().await.setlists.get(&id).cloned())
    }

    async fn update_setlist(&self, id: Uuid, input: SetListInput) -> StoreResult<Option<SetList>> {
        let mut db = self.inner.write().await;
        if !db.setlists.contains_key(&id) {
            return Ok(None);
        }
        if db.setlist_day_taken(input.concert_id, input.day, Some(id)) {
            return Err(StoreError::Conflict(DUPLICATE_SETLIST_DAY.to_string()));
        }

        Ok(db.setlists.get_mut(&id).map(|s| {
            s.concert_id = input.concert_id;
            s.day = input.day;
            s.date = input.date;
            s.songs = Json(input.songs);
            s.updated_at = Utc::now();
            s.clone()
        }))
    }

    async fn delete_setlist(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.setlists.remove(&id).is_some())
    }

    async fn create_event(&self, input: EventInput) -> StoreResult<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: input.title,
            date: input.date,
            time: input.time,
            place: input.place,
            poster_url: input.poster_url,
            kind: input.kind,
            is_pinned: false,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn list_events(&self, listing: EventListing) -> StoreResult<Vec<Event>> {
        let db = self.inner.read().await;
        let mut events: Vec<Event> = db.events.values().cloned().collect();
        match listing {
            EventListing::Admin => events.sort_by(admin_order),
            EventListing::Upcoming { now } => {
                events.retain(|e| e.is_upcoming(now));
                events.sort_by(upcoming_order);
            }
        }
        Ok(events)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<Event>> {
        Ok(self.inner.read().await.events.get(&id).cloned())
    }

    async fn update_event(&self, id: Uuid, input: EventInput) -> StoreResult<Option<Event>> {
        let mut db = self.inner.write().await;
        Ok(db.events.get_mut(&id).map(|e| {
            e.title = input.title;
            e.date = input.date;
            e.time = input.time;
            e.place = input.place;
            e.poster_url = input.poster_url;
            e.kind = input.kind;
            e.updated_at = Utc::now();
            e.clone()
        }))
    }

    async fn set_event_pinned(&self, id: Uuid, pinned: bool) -> StoreResult<Option<Event>> {
        let mut db = self.inner.write().await;
        Ok(db.events.get_mut(&id).map(|e| {
            e.is_pinned = pinned;
            e.updated_at = Utc::now();
            e.clone()
        }))
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.inner.write().await.events.remove(&id).is_some())
    }

    async fn insert_admin(&self, admin: NewAdmin) -> StoreResult<Admin> {
        let mut db = self.inner.write().await;
        let email = admin.email.to_lowercase();
        if db.admins.values().any(|a| a.email == email) {
            return Err(StoreError::Conflict(DUPLICATE_ADMIN_EMAIL.to_string()));
        }

        let admin = Admin {
            id: Uuid::new_v4(),
            email,
            password_hash: admin.password_hash,
            name: admin.name,
            role: admin.role,
            last_login: None,
            created_at: Utc::now(),
        };
        db.admins.insert(admin.id, admin.clone());
        Ok(admin)
    }

    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<Admin>> {
        let email = email.to_lowercase();
        let db = self.inner.read().await;
        Ok(db.admins.values().find(|a| a.email == email).cloned())
    }

    async fn get_admin(&self, id: Uuid) -> StoreResult<Option<Admin>> {
        Ok(self.inner.read().await.admins.get(&id).cloned())
    }

    async fn record_admin_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(admin) = self.inner.write().await.admins.get_mut(&id) {
            admin.last_login = Some(at);
        }
        Ok(())
    }

    async fn update_admin_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(db
            .admins
            .get_mut(&id)
            .map(|a| a.password_hash = password_hash.to_string())
            .is_some())
    }

    async fn upsert_user(&self, profile: UserProfile) -> StoreResult<User> {
        let mut db = self.inner.write().await;
        let now = Utc::now();
        let user = db
            .users
            .entry(profile.google_id.clone())
            .and_modify(|u| {
                u.name = profile.name.clone();
                u.email = profile.email.clone();
                u.image = profile.image.clone();
                u.updated_at = now;
            })
            .or_insert_with(|| User {
                id: Uuid::new_v4(),
                google_id: profile.google_id.clone(),
                name: profile.name.clone(),
                email: profile.email.clone(),
                image: profile.image.clone(),
                nickname: None,
                created_at: now,
                updated_at: now,
            });
        Ok(user.clone())
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(google_id).cloned())
    }

    async fn set_nickname(&self, google_id: &str, nickname: &str) -> StoreResult<Option<User>> {
        let mut db = self.inner.write().await;
        let taken = db
            .users
            .values()
            .any(|u| u.google_id != google_id && u.nickname.as_deref() == Some(nickname));
        if taken {
            return Err(StoreError::Conflict(DUPLICATE_NICKNAME.to_string()));
        }

        Ok(db.users.get_mut(google_id).map(|u| {
            u.nickname = Some(nickname.to_string());
            u.updated_at = Utc::now();
            u.clone()
        }))
    }
}
