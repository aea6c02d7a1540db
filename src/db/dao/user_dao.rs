use sea_orm::sea_query::{Expr, ExprTrait, Func, LikeExpr};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{prelude::User, user};

const LIKE_ESCAPE: char = '\\';

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Columns fixed at the end of the registration wizard.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub date_of_birth: chrono::NaiveDate,
    pub profile_picture_url: String,
    pub is_admin: bool,
}

impl UserDao {
    pub async fn find_by_username(&self, username: &str) -> DaoResult<Option<user::Model>> {
        let username = username.to_string();
        self.find_one(move |query| query.filter(user::Column::Username.eq(username)))
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        let email = email.to_string();
        self.find_one(move |query| query.filter(user::Column::Email.eq(email)))
            .await
    }

    /// Usernames match exactly; emails are stored lower-cased.
    pub async fn find_by_identifier(&self, identifier: &str) -> DaoResult<Option<user::Model>> {
        let username = identifier.to_string();
        let email = identifier.to_lowercase();
        self.find_one(move |query| {
            query.filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
        })
        .await
    }

    pub async fn username_taken(&self, username: &str, except: Option<Uuid>) -> DaoResult<bool> {
        let username = username.to_string();
        let count = self
            .count(move |query| {
                let query = query.filter(user::Column::Username.eq(username));
                match except {
                    Some(id) => query.filter(user::Column::Id.ne(id)),
                    None => query,
                }
            })
            .await?;
        Ok(count > 0)
    }

    pub async fn email_taken(&self, email: &str) -> DaoResult<bool> {
        let email = email.to_string();
        let count = self
            .count(move |query| query.filter(user::Column::Email.eq(email)))
            .await?;
        Ok(count > 0)
    }

    pub async fn count_users(&self) -> DaoResult<u64> {
        self.count(|query| query).await
    }

    pub async fn create_user(&self, new_user: NewUser) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            display_name: Set(Some(new_user.display_name)),
            bio: Set(None),
            location: Set(None),
            phone: Set(None),
            website: Set(None),
            profile_picture_url: Set(Some(new_user.profile_picture_url)),
            privacy: Set(user::PRIVACY_PUBLIC.to_string()),
            gender: Set(None),
            age_group: Set(None),
            date_of_birth: Set(Some(new_user.date_of_birth)),
            is_admin: Set(new_user.is_admin),
            is_active: Set(true),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn set_password_hash_on<C>(conn: &C, id: Uuid, hash: &str) -> DaoResult<()>
    where
        C: ConnectionTrait + Sync,
    {
        let hash = hash.to_string();
        Self::update_on(conn, id, move |active| {
            active.password_hash = Set(hash);
        })
        .await
        .map(|_| ())
    }

    /// Case-insensitive substring match on username or display name, ordered by username.
    pub async fn search(&self, term: &str, limit: u64) -> DaoResult<Vec<user::Model>> {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        self.find_all(
            Some((user::Column::Username, Order::Asc)),
            Some(limit),
            move |query| {
                query.filter(
                    Condition::any()
                        .add(
                            Func::lower(Expr::col(user::Column::Username))
                                .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
                        )
                        .add(
                            Func::lower(Expr::col(user::Column::DisplayName))
                                .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
                        ),
                )
            },
        )
        .await
    }

    pub async fn find_many(&self, ids: Vec<Uuid>) -> DaoResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_all(
            Some((user::Column::Username, Order::Asc)),
            None,
            move |query| query.filter(user::Column::Id.is_in(ids)),
        )
        .await
    }

    pub async fn delete_on<C>(conn: &C, id: Uuid) -> DaoResult<()>
    where
        C: ConnectionTrait + Sync,
    {
        User::delete_by_id(id).exec(conn).await?;
        Ok(())
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use uuid::Uuid;

    use crate::db::entities::user;
    use crate::test_helpers::{count_row, user_fixture as user_model};

    use super::{UserDao, escape_like};
    use crate::db::dao::{DaoBase, DaoLayerError};

    #[tokio::test]
    async fn find_by_identifier_returns_match() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_model(id, "alice01")]])
            .into_connection();
        let dao = UserDao::new(&db);

        let found = dao
            .find_by_identifier("ALICE01@example.com")
            .await
            .expect("query should succeed");
        assert_eq!(found.map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn username_taken_reads_count() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)]])
            .append_query_results([[count_row(0)]])
            .into_connection();
        let dao = UserDao::new(&db);

        assert!(dao.username_taken("alice01", None).await.expect("count"));
        assert!(
            !dao.username_taken("alice01", Some(Uuid::new_v4()))
                .await
                .expect("count")
        );
    }

    #[tokio::test]
    async fn find_by_id_reports_missing_row() {
        let missing = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao.find_by_id(missing).await.expect_err("row is missing");
        assert!(matches!(err, DaoLayerError::NotFound { id, .. } if id == missing));
    }

    #[tokio::test]
    async fn query_errors_surface_as_db_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("boom".to_string())])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .find_by_username("alice01")
            .await
            .expect_err("query should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }

    #[tokio::test]
    async fn find_many_skips_query_for_empty_input() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = UserDao::new(&db);

        let users = dao.find_many(Vec::new()).await.expect("no query needed");
        assert!(users.is_empty());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("a_b%c\\"), "a\\_b\\%c\\\\");
        assert_eq!(escape_like("alice"), "alice");
    }
}
