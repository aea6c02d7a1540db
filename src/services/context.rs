use sea_orm::DatabaseConnection;

use crate::{
    db::dao::DaoContext,
    services::{
        notification_service::NotificationService, password_reset_service::PasswordResetService,
        registration_service::RegistrationService, social_service::SocialService,
        user_service::UserService,
    },
    state::AppState,
    storage::UploadStorage,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user(), self.daos.hobby())
    }

    pub fn registration<'a>(&self, uploads: &'a UploadStorage) -> RegistrationService<'a> {
        RegistrationService::new(self.daos.user(), uploads)
    }

    pub fn social(&self) -> SocialService {
        SocialService::new(
            self.daos.user(),
            self.daos.follow(),
            self.daos.message(),
            self.daos.hobby(),
        )
    }

    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.daos.notification())
    }

    pub fn password_reset(&self) -> PasswordResetService {
        PasswordResetService::new(self.daos.password_reset(), self.daos.user())
    }
}
