use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    services::address_lookup::AddressLookup,
    session::{SessionStore, build_store},
    storage::UploadStorage,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub sessions: Arc<dyn SessionStore>,
    pub uploads: UploadStorage,
    pub address_lookup: AddressLookup,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Arc<Self> {
        let sessions = build_store(config.session.store, &db);
        let uploads = UploadStorage::new(config.uploads.dir.clone());
        let address_lookup = AddressLookup::new(&config.address_lookup);
        Arc::new(Self {
            config,
            db,
            sessions,
            uploads,
            address_lookup,
        })
    }
}
