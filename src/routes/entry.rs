use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use tower_http::services::ServeDir;

use super::{api, views};
use crate::{
    middleware::{catch_panic_layer, payload_too_large_redirect},
    session::session_middleware,
    state::AppState,
};

pub const API_PREFIX: &str = "/api";

/// Full application router. Layers run outermost first: panic capture, session, the 413
/// redirect, then the body limit.
pub fn router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.general.public_dir);
    let uploaded_files = ServeDir::new(state.uploads.dir());

    Router::new()
        .nest(API_PREFIX, api::router(state.clone()))
        .merge(views::router(state.clone()))
        .nest_service("/static", static_files)
        .nest_service("/uploads", uploaded_files)
        .layer(DefaultBodyLimit::max(state.config.uploads.max_bytes))
        .layer(middleware::from_fn(payload_too_large_redirect))
        .layer(middleware::from_fn_with_state(state, session_middleware))
        .layer(catch_panic_layer())
}
