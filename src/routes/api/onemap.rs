use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{middleware::CurrentUser, state::AppState};

#[derive(Debug, Default, Deserialize)]
pub struct AddressQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
pub struct AddressResults {
    results: Vec<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/onemap/search", get(search))
        .with_state(state)
}

async fn search(
    State(state): State<Arc<AppState>>,
    CurrentUser(_): CurrentUser,
    Query(query): Query<AddressQuery>,
) -> Json<AddressResults> {
    Json(AddressResults {
        results: state.address_lookup.search(&query.q).await,
    })
}
