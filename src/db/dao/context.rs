use sea_orm::DatabaseConnection;

use super::{
    DaoBase, FollowDao, HobbyDao, MessageDao, NotificationDao, PasswordResetDao, SessionDao,
    UserDao,
};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn hobby(&self) -> HobbyDao {
        DaoBase::new(&self.db)
    }

    pub fn follow(&self) -> FollowDao {
        DaoBase::new(&self.db)
    }

    pub fn message(&self) -> MessageDao {
        DaoBase::new(&self.db)
    }

    pub fn notification(&self) -> NotificationDao {
        DaoBase::new(&self.db)
    }

    pub fn password_reset(&self) -> PasswordResetDao {
        DaoBase::new(&self.db)
    }

    pub fn session(&self) -> SessionDao {
        DaoBase::new(&self.db)
    }
}
