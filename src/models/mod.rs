// src/models/mod.rs

pub mod admin;
pub mod comment;
pub mod concert;
pub mod event;
pub mod post;
pub mod setlist;
pub mod user;
