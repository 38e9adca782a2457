// tests/postgres_tests.rs
//
// The same router over PgStore. Needs a running database:
//   DATABASE_URL=postgres://... cargo test --test postgres_tests
// Without DATABASE_URL every test returns early. The database is shared
// between tests and runs, so each test works on its own fresh rows.

mod common;

use chrono::{DateTime, TimeZone, Utc};
use common::{ADMIN_PASSWORD, TestApp, spawn_postgres_app, user_token};
use fanboard::{
    models::admin::{AdminRole, NewAdmin},
    store::{DUPLICATE_ADMIN_EMAIL, DUPLICATE_NICKNAME, DUPLICATE_SETLIST_DAY, StoreError},
    utils::hash::hash_password,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

macro_rules! postgres_app {
    () => {
        match spawn_postgres_app().await {
            Some(pair) => pair,
            None => {
                eprintln!("DATABASE_URL not set, skipping");
                return;
            }
        }
    };
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

async fn like(app: &TestApp, token: &str, post_id: &str) -> Value {
    let response = app
        .client
        .post(app.url(&format!("/api/board/{}/like", post_id)))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

async fn like_columns(pool: &PgPool, post_id: &str) -> (i64, i64) {
    sqlx::query_as("SELECT likes, cardinality(liked_by)::BIGINT FROM board_posts WHERE id = $1")
        .bind(Uuid::parse_str(post_id).unwrap())
        .fetch_one(pool)
        .await
        .expect("Failed to read like columns")
}

#[tokio::test]
async fn toggle_like_holds_count_under_concurrency() {
    let (app, pool) = postgres_app!();
    let owner = user_token(&unique("owner"), "Owner");
    let post = app.create_post(&owner, "Likeable").await;
    let post_id = post["id"].as_str().unwrap().to_string();

    let fan = user_token(&unique("fan"), "Fan");
    assert_eq!(like(&app, &fan, &post_id).await, json!({ "likes": 1, "liked": true }));
    assert_eq!(like(&app, &fan, &post_id).await, json!({ "likes": 0, "liked": false }));

    let fans: Vec<String> = (0..8).map(|_| user_token(&unique("fan"), "Fan")).collect();
    let mut handles = Vec::new();
    for token in fans.clone() {
        let client = app.client.clone();
        let url = app.url(&format!("/api/board/{}/like", post_id));
        handles.push(tokio::spawn(async move {
            client.post(url).bearer_auth(token).send().await.unwrap().status().as_u16()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }
    assert_eq!(like_columns(&pool, &post_id).await, (8, 8));

    let mut handles = Vec::new();
    for token in fans.into_iter().take(3) {
        let client = app.client.clone();
        let url = app.url(&format!("/api/board/{}/like", post_id));
        handles.push(tokio::spawn(async move {
            client.post(url).bearer_auth(token).send().await.unwrap().status().as_u16()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }
    assert_eq!(like_columns(&pool, &post_id).await, (5, 5));
}

#[tokio::test]
async fn likes_column_cannot_drift_from_likers() {
    let (app, pool) = postgres_app!();
    let owner = user_token(&unique("owner"), "Owner");
    let post = app.create_post(&owner, "Guarded").await;
    let id = Uuid::parse_str(post["id"].as_str().unwrap()).unwrap();

    let err = sqlx::query("UPDATE board_posts SET likes = likes + 1 WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .unwrap_err();
    let constraint = err.as_database_error().and_then(|e| e.constraint());
    assert_eq!(constraint, Some("board_posts_likes_match"));
}

#[tokio::test]
async fn posts_sharing_a_timestamp_page_without_gaps() {
    let (app, pool) = postgres_app!();
    // A second in the past no other test or earlier run writes to.
    let offset = (Uuid::new_v4().as_u128() % 300_000_000) as i64;
    let instant: DateTime<Utc> = Utc.timestamp_opt(946_684_800 + offset, 0).single().unwrap();

    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO board_posts (id, title, content, author, user_id, created_at, updated_at) \
             VALUES ($1, $2, 'body', 'author', 'owner', $3, $3)",
        )
        .bind(id)
        .bind(title)
        .bind(instant)
        .execute(&pool)
        .await
        .expect("Failed to insert post");
        ids.push(id);
    }

    // Start just after the instant: the largest id at that timestamp.
    let mut cursor = (instant.to_rfc3339(), Uuid::from_u128(u128::MAX).to_string());
    let mut seen = Vec::new();
    for _ in 0..3 {
        let page: Vec<Value> = app
            .client
            .get(app.url("/api/board"))
            .query(&[
                ("cursor", cursor.0.as_str()),
                ("cursorId", cursor.1.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        let post = &page[0];
        seen.push(Uuid::parse_str(post["id"].as_str().unwrap()).unwrap());
        cursor = (
            post["createdAt"].as_str().unwrap().to_string(),
            post["id"].as_str().unwrap().to_string(),
        );
    }

    ids.sort_by(|a, b| b.cmp(a));
    assert_eq!(seen, ids);
}

#[tokio::test]
async fn only_one_concert_is_active_after_racing_activations() {
    let (app, pool) = postgres_app!();
    let token = app.admin_token_as(&format!("{}@example.com", unique("admin"))).await;

    let mut ids = Vec::new();
    for n in 0..4 {
        let concert = app.create_concert(&token, &format!("Tour {}", n)).await;
        ids.push(concert["id"].as_str().unwrap().to_string());
    }

    let mut handles = Vec::new();
    for id in ids.clone() {
        let client = app.client.clone();
        let url = app.url(&format!("/api/admin/concerts/{}/activate", id));
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            client
                .patch(url)
                .bearer_auth(token)
                .json(&json!({ "isActive": true }))
                .send()
                .await
                .unwrap()
                .status()
                .as_u16()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM active_concert")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let mut active = Vec::new();
    for id in &ids {
        let concert: Value = app
            .client
            .get(app.url(&format!("/api/admin/concerts/{}", id)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if concert["isActive"] == true {
            active.push(id.clone());
        }
    }
    assert_eq!(active.len(), 1);

    let current: Value = app
        .client
        .get(app.url("/api/concerts/active"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current["id"], active[0].as_str());
}

#[tokio::test]
async fn duplicate_setlist_day_hits_unique_constraint() {
    let (app, _pool) = postgres_app!();
    let token = app.admin_token_as(&format!("{}@example.com", unique("admin"))).await;
    let concert = app.create_concert(&token, "Tour").await;
    let concert_id = concert["id"].as_str().unwrap();

    let first: Value = app.create_setlist(&token, concert_id, 1).await.json().await.unwrap();

    let response = app
        .client
        .post(app.url("/api/admin/setlists"))
        .bearer_auth(&token)
        .json(&json!({
            "concertId": concert_id,
            "day": 1,
            "date": "2025-05-02",
            "songs": [{ "title": "Other", "order": 1 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], DUPLICATE_SETLIST_DAY);

    let stored: Value = app
        .client
        .get(app.url(&format!("/api/admin/setlists/{}", first["id"].as_str().unwrap())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["songs"], first["songs"]);

    // Two racing creates for a fresh day: one wins, one conflicts.
    let (a, b) = tokio::join!(
        app.create_setlist(&token, concert_id, 2),
        app.create_setlist(&token, concert_id, 2)
    );
    let mut statuses = [a.status().as_u16(), b.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [201, 409]);
}

#[tokio::test]
async fn deleting_concert_removes_its_setlists() {
    let (app, pool) = postgres_app!();
    let token = app.admin_token_as(&format!("{}@example.com", unique("admin"))).await;
    let concert = app.create_concert(&token, "Farewell").await;
    let other = app.create_concert(&token, "Encore Tour").await;
    let concert_id = concert["id"].as_str().unwrap();
    let other_id = other["id"].as_str().unwrap();

    for day in 1..=3 {
        assert_eq!(app.create_setlist(&token, concert_id, day).await.status().as_u16(), 201);
    }
    assert_eq!(app.create_setlist(&token, other_id, 1).await.status().as_u16(), 201);

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/concerts/{}", concert_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deletedSetlists"], 3);

    let count = |id: &str| {
        sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM setlists WHERE concert_id = $1")
            .bind(Uuid::parse_str(id).unwrap())
            .fetch_one(&pool)
    };
    assert_eq!(count(concert_id).await.unwrap().0, 0);
    assert_eq!(count(other_id).await.unwrap().0, 1);
}

#[tokio::test]
async fn conflict_messages_match_memory_store() {
    let (app, _pool) = postgres_app!();

    let alice = user_token(&unique("google"), "Alice");
    let bob = user_token(&unique("google"), "Bob");
    for token in [&alice, &bob] {
        let response = app
            .client
            .post(app.url("/api/users/sync"))
            .bearer_auth(token)
            .json(&json!({ "name": "Fan" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let nickname = format!("n{}", &Uuid::new_v4().simple().to_string()[..12]);
    let set = |token: &String| {
        app.client
            .put(app.url("/api/users/me/nickname"))
            .bearer_auth(token)
            .json(&json!({ "nickname": nickname }))
            .send()
    };
    assert_eq!(set(&alice).await.unwrap().status().as_u16(), 200);
    let response = set(&bob).await.unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], DUPLICATE_NICKNAME);

    let email = format!("{}@example.com", unique("admin"));
    let admin = |email: String| NewAdmin {
        email,
        password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
        name: "Admin".to_string(),
        role: AdminRole::Manager,
    };
    app.store.insert_admin(admin(email.clone())).await.unwrap();
    let err = app
        .store
        .insert_admin(admin(email.to_uppercase()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(msg) if msg == DUPLICATE_ADMIN_EMAIL));
}
