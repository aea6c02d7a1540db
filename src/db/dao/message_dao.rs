use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{message, prelude::Message};

#[derive(Clone)]
pub struct MessageDao {
    db: DatabaseConnection,
}

impl DaoBase for MessageDao {
    type Entity = Message;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl MessageDao {
    pub async fn send(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        body: &str,
    ) -> DaoResult<message::Model> {
        let model = message::ActiveModel {
            sender_id: Set(sender_id),
            receiver_id: Set(receiver_id),
            body: Set(body.to_string()),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn delete_for_user_on<C>(conn: &C, user_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        let result = Message::delete_many()
            .filter(
                Condition::any()
                    .add(message::Column::SenderId.eq(user_id))
                    .add(message::Column::ReceiverId.eq(user_id)),
            )
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
