use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{notification, prelude::Notification};

#[derive(Clone)]
pub struct NotificationDao {
    db: DatabaseConnection,
}

impl DaoBase for NotificationDao {
    type Entity = Notification;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl NotificationDao {
    pub async fn push_on<C>(
        conn: &C,
        user_id: Uuid,
        kind: &str,
        text: &str,
    ) -> DaoResult<notification::Model>
    where
        C: ConnectionTrait + Sync,
    {
        let model = notification::ActiveModel {
            user_id: Set(user_id),
            kind: Set(kind.to_string()),
            message: Set(text.to_string()),
            read_at: Set(None),
            ..Default::default()
        };
        Self::create_on(conn, model).await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> DaoResult<Vec<notification::Model>> {
        self.find_all(None, None, move |query| {
            query.filter(notification::Column::UserId.eq(user_id))
        })
        .await
    }

    pub async fn count_unread(&self, user_id: Uuid) -> DaoResult<u64> {
        self.count(move |query| {
            query
                .filter(notification::Column::UserId.eq(user_id))
                .filter(notification::Column::ReadAt.is_null())
        })
        .await
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> DaoResult<u64> {
        let result = Notification::update_many()
            .col_expr(
                notification::Column::ReadAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::ReadAt.is_null())
            .exec(self.db())
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_for_user_on<C>(conn: &C, user_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        let result = Notification::delete_many()
            .filter(notification::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
