use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use axum::Router;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    config::{AppConfig, configs::SessionStoreKind},
    db::{connection, entities::user},
    routes::router,
    state::AppState,
};

/// Fixed instant used by DAO fixtures.
pub fn ts() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("valid fixture timestamp")
        .fixed_offset()
}

pub fn user_fixture(id: Uuid, username: &str) -> user::Model {
    user::Model {
        id,
        created_at: ts(),
        updated_at: ts(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: String::new(),
        display_name: None,
        bio: None,
        location: None,
        phone: None,
        website: None,
        profile_picture_url: None,
        privacy: user::PRIVACY_PUBLIC.to_string(),
        gender: None,
        age_group: None,
        date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1),
        is_admin: false,
        is_active: true,
    }
}

/// Row shape returned by `PaginatorTrait::count` against a mock connection.
pub fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
    BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
}

/// In-memory database, in-memory sessions, a scratch upload dir and an unreachable
/// address lookup upstream.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.url = "sqlite::memory:".to_string();
    cfg.session.store = SessionStoreKind::Memory;
    cfg.uploads.dir = scratch_dir();
    cfg.general.public_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public");
    cfg.address_lookup.base_url = "http://127.0.0.1:9/search".to_string();
    cfg.address_lookup.timeout_secs = 1;
    cfg
}

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("kampong-konek-test-{}", Uuid::new_v4().simple()))
}

pub async fn test_state() -> Arc<AppState> {
    let cfg = test_config();
    let db = connection::connect(&cfg.database)
        .await
        .expect("connect test database");
    AppState::new(cfg, db)
}

pub async fn test_app() -> (Router, Arc<AppState>) {
    let state = test_state().await;
    (router(Arc::clone(&state)), state)
}
