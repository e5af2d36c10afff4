pub mod access;
pub mod auth;
pub mod convert;
pub mod error;
pub mod extract;
pub mod feed;
pub mod middleware;
pub mod reports;
pub mod state;
pub mod validation;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;

/// All HTTP routes. Cross-cutting layers (CORS, tracing, body limits) are
/// added by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/feed", get(feed::get_feed))
        .route("/reports", post(reports::create_report))
        .route("/reports/public", get(reports::public_reports))
        .route("/reports/{ticket}", get(reports::get_report))
        .route("/reports/{ticket}/messages", post(reports::post_message));

    let protected_routes = Router::new()
        .route("/posts", post(feed::create_post))
        .route("/posts/{post_id}/like", post(feed::like_post))
        .route("/posts/{post_id}/save", post(feed::save_post))
        .route("/posts/{post_id}/comments", post(feed::add_comment))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
