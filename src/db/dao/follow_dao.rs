use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{follow, prelude::Follow};

#[derive(Clone)]
pub struct FollowDao {
    db: DatabaseConnection,
}

impl DaoBase for FollowDao {
    type Entity = Follow;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl FollowDao {
    pub async fn exists(&self, follower_id: Uuid, followed_id: Uuid) -> DaoResult<bool> {
        let count = self
            .count(move |query| {
                query
                    .filter(follow::Column::FollowerId.eq(follower_id))
                    .filter(follow::Column::FollowedId.eq(followed_id))
            })
            .await?;
        Ok(count > 0)
    }

    pub async fn insert_on<C>(
        conn: &C,
        follower_id: Uuid,
        followed_id: Uuid,
    ) -> DaoResult<follow::Model>
    where
        C: ConnectionTrait + Sync,
    {
        let edge = follow::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            ..Default::default()
        };
        Self::create_on(conn, edge).await
    }

    /// Returns how many edges were removed (0 or 1).
    pub async fn remove_on<C>(conn: &C, follower_id: Uuid, followed_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        let result = Follow::delete_many()
            .filter(follow::Column::FollowerId.eq(follower_id))
            .filter(follow::Column::FollowedId.eq(followed_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_followers(&self, user_id: Uuid) -> DaoResult<u64> {
        self.count(move |query| query.filter(follow::Column::FollowedId.eq(user_id)))
            .await
    }

    pub async fn count_following(&self, user_id: Uuid) -> DaoResult<u64> {
        self.count(move |query| query.filter(follow::Column::FollowerId.eq(user_id)))
            .await
    }

    /// Ids of users following `user_id`.
    pub async fn follower_ids(&self, user_id: Uuid) -> DaoResult<Vec<Uuid>> {
        let ids = Follow::find()
            .select_only()
            .column(follow::Column::FollowerId)
            .filter(follow::Column::FollowedId.eq(user_id))
            .into_tuple::<Uuid>()
            .all(self.db())
            .await?;
        Ok(ids)
    }

    /// Ids of users that `user_id` follows.
    pub async fn followed_ids(&self, user_id: Uuid) -> DaoResult<Vec<Uuid>> {
        let ids = Follow::find()
            .select_only()
            .column(follow::Column::FollowedId)
            .filter(follow::Column::FollowerId.eq(user_id))
            .into_tuple::<Uuid>()
            .all(self.db())
            .await?;
        Ok(ids)
    }

    pub async fn delete_for_user_on<C>(conn: &C, user_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        let result = Follow::delete_many()
            .filter(
                Condition::any()
                    .add(follow::Column::FollowerId.eq(user_id))
                    .add(follow::Column::FollowedId.eq(user_id)),
            )
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::FollowDao;
    use crate::db::dao::DaoBase;
    use crate::test_helpers::count_row;

    #[tokio::test]
    async fn exists_is_true_when_edge_counted() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)]])
            .into_connection();
        let dao = FollowDao::new(&db);

        assert!(
            dao.exists(Uuid::new_v4(), Uuid::new_v4())
                .await
                .expect("count should succeed")
        );
    }

    #[tokio::test]
    async fn remove_reports_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let removed = FollowDao::remove_on(&db, Uuid::new_v4(), Uuid::new_v4())
            .await
            .expect("delete should succeed");
        assert_eq!(removed, 0);

        assert_eq!(db.into_transaction_log().len(), 1);
    }
}
