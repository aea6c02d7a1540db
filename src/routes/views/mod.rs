mod account;
mod auth;
pub mod page;
mod profile;
mod register;
mod social;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router(state.clone()))
        .merge(register::router(state.clone()))
        .merge(profile::router(state.clone()))
        .merge(social::router(state.clone()))
        .merge(account::router(state))
}
