// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use fanboard::{
    config::Config,
    models::admin::{AdminRole, NewAdmin},
    routes,
    state::{AppState, DynStore},
    store::{MemoryStore, PgStore},
    utils::{hash::hash_password, jwt::sign_session_token},
};
use serde_json::{Value, json};
use sqlx::{PgPool, postgres::PgPoolOptions};

pub const ADMIN_SECRET: &str = "admin_secret_for_integration_tests";
pub const SESSION_SECRET: &str = "session_secret_for_integration_tests";
pub const ADMIN_EMAIL: &str = "root@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub address: String,
    pub store: DynStore,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(MemoryStore::new())).await
}

/// Connects to `DATABASE_URL` and applies migrations. Returns `None` when
/// the variable is unset so Postgres tests can be skipped locally.
pub async fn postgres_pool() -> Option<PgPool> {
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(pool)
}

/// Spawns the app over `PgStore`. The database is shared between tests, so
/// callers must use unique data.
pub async fn spawn_postgres_app() -> Option<(TestApp, PgPool)> {
    let pool = postgres_pool().await?;
    let app = spawn_app_with(Arc::new(PgStore::new(pool.clone()))).await;
    Some((app, pool))
}

/// Spawns the app on a random port over the given store.
pub async fn spawn_app_with(store: DynStore) -> TestApp {
    let config = Config {
        database_url: None,
        admin_jwt_secret: ADMIN_SECRET.to_string(),
        session_secret: SESSION_SECRET.to_string(),
        rust_log: "error".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        admin_email: None,
        admin_password: None,
        admin_name: "Admin".to_string(),
    };

    let state = AppState {
        store: store.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

/// A user session token as the sign-in layer would issue it.
pub fn user_token(user_id: &str, name: &str) -> String {
    sign_session_token(user_id, name, SESSION_SECRET, 600).expect("Failed to sign session token")
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn seed_admin(&self) {
        self.seed_admin_as(ADMIN_EMAIL).await;
    }

    pub async fn seed_admin_as(&self, email: &str) {
        self.store
            .insert_admin(NewAdmin {
                email: email.to_string(),
                password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
                name: "Root".to_string(),
                role: AdminRole::Super,
            })
            .await
            .expect("Failed to seed admin");
    }

    /// Seeds the admin and logs in, returning the bearer token.
    pub async fn admin_token(&self) -> String {
        self.admin_token_as(ADMIN_EMAIL).await
    }

    pub async fn admin_token_as(&self, email: &str) -> String {
        self.seed_admin_as(email).await;

        let body: Value = self
            .client
            .post(self.url("/api/admin/auth/login"))
            .json(&json!({ "email": email, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        body["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn create_post(&self, token: &str, title: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/board"))
            .bearer_auth(token)
            .json(&json!({ "title": title, "content": "Post body" }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn create_comment(
        &self,
        token: Option<&str>,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> reqwest::Response {
        let mut request = self
            .client
            .post(self.url(&format!("/api/board/{}/comments", post_id)))
            .json(&json!({ "content": content, "author": "Fan", "parentId": parent_id }));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }

    pub async fn create_concert(&self, token: &str, title: &str) -> Value {
        let response = self
            .client
            .post(self.url("/api/admin/concerts"))
            .bearer_auth(token)
            .json(&json!({
                "title": title,
                "venue": "Olympic Hall",
                "startDate": "2025-05-01",
                "endDate": "2025-05-03"
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn create_setlist(&self, token: &str, concert_id: &str, day: i32) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/admin/concerts/{}/setlists", concert_id)))
            .bearer_auth(token)
            .json(&json!({
                "day": day,
                "date": "2025-05-01",
                "songs": [
                    { "title": "Intro", "order": 2 },
                    { "title": "Encore", "order": 1 }
                ]
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
