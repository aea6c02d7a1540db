use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{
    hobby,
    prelude::{Hobby, UserHobby},
    user_hobby,
};

pub const DEFAULT_HOBBIES: [&str; 18] = [
    "Gardening",
    "Cooking",
    "Reading",
    "Music",
    "Sports",
    "Art",
    "Travel",
    "Technology",
    "Photography",
    "History",
    "Movies",
    "Gaming",
    "Crafts",
    "Yoga",
    "Walking",
    "Baking",
    "Fishing",
    "Pets",
];

#[derive(Clone)]
pub struct HobbyDao {
    db: DatabaseConnection,
}

impl DaoBase for HobbyDao {
    type Entity = Hobby;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl HobbyDao {
    /// Inserts the default catalogue when no hobby exists yet. Returns how many were added.
    pub async fn seed_defaults(&self) -> DaoResult<usize> {
        if self.count(|query| query).await? > 0 {
            return Ok(0);
        }
        for name in DEFAULT_HOBBIES {
            let model = hobby::ActiveModel {
                name: Set(name.to_string()),
                ..Default::default()
            };
            self.create(model).await?;
        }
        Ok(DEFAULT_HOBBIES.len())
    }

    pub async fn list(&self) -> DaoResult<Vec<hobby::Model>> {
        self.find_all(Some((hobby::Column::Name, Order::Asc)), None, |query| query)
            .await
    }

    pub async fn ids_for_user(&self, user_id: Uuid) -> DaoResult<Vec<Uuid>> {
        let ids = UserHobby::find()
            .select_only()
            .column(user_hobby::Column::HobbyId)
            .filter(user_hobby::Column::UserId.eq(user_id))
            .into_tuple::<Uuid>()
            .all(self.db())
            .await?;
        Ok(ids)
    }

    pub async fn for_user(&self, user_id: Uuid) -> DaoResult<Vec<hobby::Model>> {
        let ids = self.ids_for_user(user_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_all(Some((hobby::Column::Name, Order::Asc)), None, move |query| {
            query.filter(hobby::Column::Id.is_in(ids))
        })
        .await
    }

    /// Replaces the user's hobby set. Unknown hobby ids are dropped.
    pub async fn replace_for_user_on<C>(
        conn: &C,
        user_id: Uuid,
        hobby_ids: &[Uuid],
    ) -> DaoResult<()>
    where
        C: ConnectionTrait + Sync,
    {
        Self::delete_for_user_on(conn, user_id).await?;
        if hobby_ids.is_empty() {
            return Ok(());
        }

        let known: Vec<Uuid> = Hobby::find()
            .select_only()
            .column(hobby::Column::Id)
            .filter(hobby::Column::Id.is_in(hobby_ids.to_vec()))
            .into_tuple::<Uuid>()
            .all(conn)
            .await?;

        let now = Utc::now().fixed_offset();
        for hobby_id in known {
            user_hobby::ActiveModel {
                id: Set(Uuid::new_v4()),
                created_at: Set(now),
                user_id: Set(user_id),
                hobby_id: Set(hobby_id),
            }
            .insert(conn)
            .await?;
        }
        Ok(())
    }

    pub async fn delete_for_user_on<C>(conn: &C, user_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        let result = UserHobby::delete_many()
            .filter(user_hobby::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }
}
