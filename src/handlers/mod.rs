// src/handlers/mod.rs

pub mod auth;
pub mod board;
pub mod comments;
pub mod concerts;
pub mod events;
pub mod setlists;
pub mod users;

use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
