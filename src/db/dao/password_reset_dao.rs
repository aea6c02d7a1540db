use sea_orm::entity::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{password_reset_token, prelude::PasswordResetToken};

#[derive(Clone)]
pub struct PasswordResetDao {
    db: DatabaseConnection,
}

impl DaoBase for PasswordResetDao {
    type Entity = PasswordResetToken;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PasswordResetDao {
    pub async fn store(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTimeWithTimeZone,
    ) -> DaoResult<password_reset_token::Model> {
        let model = password_reset_token::ActiveModel {
            user_id: Set(user_id),
            token_hash: Set(token_hash.to_string()),
            expires_at: Set(expires_at),
            used_at: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> DaoResult<Option<password_reset_token::Model>> {
        let token_hash = token_hash.to_string();
        self.find_one(move |query| {
            query.filter(password_reset_token::Column::TokenHash.eq(token_hash))
        })
        .await
    }

    /// Marks the token used only if it is still unused and unexpired at `at`. Returns the
    /// number of rows claimed, so concurrent resets with the same token see 1 and 0.
    pub async fn claim_on<C>(conn: &C, id: Uuid, at: DateTimeWithTimeZone) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        let result = PasswordResetToken::update_many()
            .col_expr(password_reset_token::Column::UsedAt, Expr::value(at))
            .filter(password_reset_token::Column::Id.eq(id))
            .filter(password_reset_token::Column::UsedAt.is_null())
            .filter(password_reset_token::Column::ExpiresAt.gte(at))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn delete_for_user_on<C>(conn: &C, user_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        let result = PasswordResetToken::delete_many()
            .filter(password_reset_token::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
