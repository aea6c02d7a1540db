use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio::sync::RwLock;

use super::SessionData;
use crate::config::configs::SessionStoreKind;
use crate::db::dao::{DaoBase, DaoLayerError, SessionDao};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage failed: {0}")]
    Storage(#[from] DaoLayerError),
    #[error("session payload is unreadable: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Expired records must read as absent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<SessionData>, SessionError>;
    async fn save(&self, key: &str, data: &SessionData, ttl: Duration) -> Result<(), SessionError>;
    async fn delete(&self, key: &str) -> Result<(), SessionError>;
}

pub fn build_store(kind: SessionStoreKind, db: &DatabaseConnection) -> Arc<dyn SessionStore> {
    match kind {
        SessionStoreKind::Database => Arc::new(DatabaseSessionStore::new(db)),
        SessionStoreKind::Memory => Arc::new(MemorySessionStore::default()),
    }
}

#[derive(Clone)]
pub struct DatabaseSessionStore {
    dao: SessionDao,
}

impl DatabaseSessionStore {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            dao: SessionDao::new(db),
        }
    }
}

#[async_trait]
impl SessionStore for DatabaseSessionStore {
    async fn load(&self, key: &str) -> Result<Option<SessionData>, SessionError> {
        let Some(record) = self.dao.find_by_key(key).await? else {
            return Ok(None);
        };
        if record.expires_at <= Utc::now().fixed_offset() {
            self.dao.delete_by_key(key).await?;
            return Ok(None);
        }
        match serde_json::from_str(&record.data) {
            Ok(data) => Ok(Some(data)),
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable session record");
                self.dao.delete_by_key(key).await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, key: &str, data: &SessionData, ttl: Duration) -> Result<(), SessionError> {
        let payload = serde_json::to_string(data)?;
        let expires_at = (Utc::now() + ttl).fixed_offset();
        self.dao.upsert(key, payload, expires_at).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.dao.delete_by_key(key).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    records: RwLock<HashMap<String, (SessionData, DateTime<Utc>)>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, key: &str) -> Result<Option<SessionData>, SessionError> {
        let now = Utc::now();
        {
            let records = self.records.read().await;
            match records.get(key) {
                Some((data, expires_at)) if *expires_at > now => return Ok(Some(data.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        self.records.write().await.remove(key);
        Ok(None)
    }

    async fn save(&self, key: &str, data: &SessionData, ttl: Duration) -> Result<(), SessionError> {
        self.records
            .write()
            .await
            .insert(key.to_string(), (data.clone(), Utc::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.records.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{DatabaseSessionStore, MemorySessionStore, SessionStore};
    use crate::db::entities::session;
    use crate::session::SessionData;
    use crate::test_helpers::ts;

    fn data() -> SessionData {
        SessionData {
            user_id: Some(Uuid::new_v4()),
            csrf_token: "csrf".to_string(),
            ..SessionData::default()
        }
    }

    #[tokio::test]
    async fn memory_store_round_trips_and_deletes() {
        let store = MemorySessionStore::default();
        let payload = data();

        store
            .save("k", &payload, Duration::minutes(5))
            .await
            .expect("save");
        assert_eq!(store.load("k").await.expect("load"), Some(payload));

        store.delete("k").await.expect("delete");
        assert_eq!(store.load("k").await.expect("load"), None);
    }

    #[tokio::test]
    async fn memory_store_hides_expired_records() {
        let store = MemorySessionStore::default();
        store
            .save("k", &data(), Duration::seconds(-1))
            .await
            .expect("save");
        assert_eq!(store.load("k").await.expect("load"), None);
    }

    #[tokio::test]
    async fn database_store_drops_expired_records() {
        let expired = session::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            session_key: "k".to_string(),
            data: serde_json::to_string(&data()).expect("encode"),
            expires_at: (Utc::now() - Duration::minutes(1)).fixed_offset(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[expired]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let store = DatabaseSessionStore::new(&db);

        assert_eq!(store.load("k").await.expect("load"), None);
    }
}
