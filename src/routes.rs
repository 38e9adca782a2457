// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{self, auth, board, comments, concerts, events, setlists, users},
    state::AppState,
    utils::jwt::{require_admin, require_user},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public reads: board listing and detail, comment threads, concerts, events.
/// * User session routes: posting, editing, liking, profile sync.
/// * Admin routes under `/api/admin`, all behind the bearer gate except login.
/// * Applies global middleware (Trace, CORS) and injects the shared state.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let user_gate = middleware::from_fn_with_state(state.clone(), require_user);
    let admin_gate = middleware::from_fn_with_state(state.clone(), require_admin);

    let board_routes = Router::new()
        .route("/", get(board::list_posts))
        .route("/{id}", get(board::get_post))
        // Comment creation decides on its own whether a session is present.
        .route(
            "/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .merge(
            Router::new()
                .route("/", post(board::create_post))
                .route("/{id}", put(board::update_post).delete(board::delete_post))
                .route("/{id}/like", post(board::toggle_like))
                .route_layer(user_gate.clone()),
        );

    let comment_routes = Router::new()
        .route(
            "/{id}",
            put(comments::update_comment).delete(comments::delete_comment),
        )
        .route_layer(user_gate.clone());

    let user_routes = Router::new()
        .route("/sync", post(users::sync_user))
        .route("/me", get(users::me))
        .route("/me/nickname", put(users::set_nickname))
        .route_layer(user_gate);

    let concert_routes = Router::new()
        .route("/", get(concerts::list_concerts))
        .route("/active", get(concerts::get_active_concert))
        .route("/{id}/setlists", get(setlists::list_concert_setlists));

    let event_routes = Router::new().route("/upcoming", get(events::list_upcoming_events));

    let admin_routes = Router::new()
        .route(
            "/concerts",
            get(concerts::list_concerts).post(concerts::create_concert),
        )
        .route(
            "/concerts/{id}",
            get(concerts::get_concert)
                .put(concerts::update_concert)
                .delete(concerts::delete_concert),
        )
        .route("/concerts/{id}/activate", patch(concerts::activate_concert))
        .route(
            "/concerts/{id}/setlists",
            get(setlists::list_concert_setlists).post(setlists::create_concert_setlist),
        )
        .route(
            "/setlists",
            get(setlists::list_setlists).post(setlists::create_setlist),
        )
        .route(
            "/setlists/{id}",
            get(setlists::get_setlist)
                .put(setlists::update_setlist)
                .delete(setlists::delete_setlist),
        )
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/{id}/pin", patch(events::pin_event))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        .route_layer(admin_gate)
        // Added after the gate so login stays reachable without a token.
        .route("/auth/login", post(auth::login));

    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/board", board_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/users", user_routes)
        .nest("/api/concerts", concert_routes)
        .nest("/api/events", event_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (top to bottom: trace wraps CORS)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
