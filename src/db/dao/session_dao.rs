use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::{DaoBase, DaoResult};
use crate::db::entities::{prelude::Session, session};

#[derive(Clone)]
pub struct SessionDao {
    db: DatabaseConnection,
}

impl DaoBase for SessionDao {
    type Entity = Session;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl SessionDao {
    pub async fn find_by_key(&self, session_key: &str) -> DaoResult<Option<session::Model>> {
        let session_key = session_key.to_string();
        self.find_one(move |query| query.filter(session::Column::SessionKey.eq(session_key)))
            .await
    }

    pub async fn upsert(
        &self,
        session_key: &str,
        data: String,
        expires_at: DateTimeWithTimeZone,
    ) -> DaoResult<()> {
        match self.find_by_key(session_key).await? {
            Some(existing) => {
                self.update(existing.id, move |active| {
                    active.data = Set(data);
                    active.expires_at = Set(expires_at);
                })
                .await?;
            }
            None => {
                let model = session::ActiveModel {
                    session_key: Set(session_key.to_string()),
                    data: Set(data),
                    expires_at: Set(expires_at),
                    ..Default::default()
                };
                self.create(model).await?;
            }
        }
        Ok(())
    }

    pub async fn delete_by_key(&self, session_key: &str) -> DaoResult<u64> {
        let result = Session::delete_many()
            .filter(session::Column::SessionKey.eq(session_key))
            .exec(self.db())
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn purge_expired(&self, now: DateTimeWithTimeZone) -> DaoResult<u64> {
        let result = Session::delete_many()
            .filter(session::Column::ExpiresAt.lt(now))
            .exec(self.db())
            .await?;
        Ok(result.rows_affected)
    }
}
