use chrono::NaiveDate;
use sea_orm::{Set, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::password::{hash_password, verify_password},
    db::dao::{
        DaoBase, DaoLayerError, FollowDao, HobbyDao, MessageDao, NotificationDao,
        PasswordResetDao, UserDao,
    },
    db::entities::{hobby, user},
    error::AppError,
    forms::{
        ProfileInput, UploadedFile,
        validators::{
            self, validate_change_password, validate_delete_account, validate_profile_update,
        },
    },
    services::FormOutcome,
    storage::{UploadError, UploadStorage},
};

const USERNAME_TAKEN_MSG: &str = "Username is already taken.";

#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated(user::Model),
    InvalidCredentials,
    Inactive,
}

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
    hobby_dao: HobbyDao,
}

impl UserService {
    pub fn new(user_dao: UserDao, hobby_dao: HobbyDao) -> Self {
        Self {
            user_dao,
            hobby_dao,
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_optional(id).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_by_username(username).await?)
    }

    pub async fn require_by_username(&self, username: &str) -> Result<user::Model, AppError> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))
    }

    /// Unknown users and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<LoginOutcome, AppError> {
        let Some(user) = self.user_dao.find_by_identifier(identifier.trim()).await? else {
            return Ok(LoginOutcome::InvalidCredentials);
        };
        if !verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "rejected login with wrong password");
            return Ok(LoginOutcome::InvalidCredentials);
        }
        if !user.is_active {
            return Ok(LoginOutcome::Inactive);
        }
        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome::Authenticated(user))
    }

    pub async fn hobby_catalogue(&self) -> Result<Vec<hobby::Model>, AppError> {
        Ok(self.hobby_dao.list().await?)
    }

    pub async fn selected_hobby_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(self.hobby_dao.ids_for_user(user_id).await?)
    }

    pub async fn hobbies_of(&self, user_id: Uuid) -> Result<Vec<hobby::Model>, AppError> {
        Ok(self.hobby_dao.for_user(user_id).await?)
    }

    /// Applies the profile form. Only a non-empty new username triggers a rename, and the
    /// hobby set is replaced by whatever was selected.
    pub async fn update_profile(
        &self,
        current: &user::Model,
        input: &ProfileInput,
        upload: Option<&UploadedFile>,
        uploads: &UploadStorage,
        today: NaiveDate,
    ) -> Result<FormOutcome<user::Model>, AppError> {
        let errors = validate_profile_update(input, today);
        if !errors.is_empty() {
            return Ok(FormOutcome::Invalid(errors));
        }

        let new_username = input.username.trim();
        let rename = (!new_username.is_empty() && new_username != current.username)
            .then(|| new_username.to_string());
        if let Some(username) = rename.as_deref()
            && self
                .user_dao
                .username_taken(username, Some(current.id))
                .await?
        {
            return Ok(FormOutcome::invalid("username", USERNAME_TAKEN_MSG));
        }

        let picture = match store_picture(input, upload, uploads).await {
            Ok(picture) => picture,
            Err(UploadError::Rejected(message)) => {
                return Ok(FormOutcome::invalid("profile_picture", message));
            }
            Err(err) => return Err(AppError::internal_with_source("failed to store picture", err)),
        };

        let date_of_birth = validators::parse_date(input.date_of_birth.trim());
        let hobby_ids: Vec<Uuid> = input
            .hobby_ids
            .iter()
            .filter_map(|raw| Uuid::parse_str(raw.trim()).ok())
            .collect();
        let fields = ProfileFields::from_input(input);

        let txn = self.user_dao.db().begin().await?;
        let updated = UserDao::update_on(&txn, current.id, move |active| {
            if let Some(username) = rename {
                active.username = Set(username);
            }
            fields.apply(active);
            if let Some(dob) = date_of_birth {
                active.date_of_birth = Set(Some(dob));
            }
            if let Some(picture) = picture {
                active.profile_picture_url = Set(Some(picture));
            }
        })
        .await;
        let updated = match updated {
            Ok(updated) => updated,
            Err(DaoLayerError::UniqueViolation(_)) => {
                txn.rollback().await?;
                return Ok(FormOutcome::invalid("username", USERNAME_TAKEN_MSG));
            }
            Err(err) => return Err(err.into()),
        };
        HobbyDao::replace_for_user_on(&txn, current.id, &hobby_ids).await?;
        txn.commit().await?;

        info!(user_id = %updated.id, "profile updated");
        Ok(FormOutcome::Done(updated))
    }

    pub async fn change_password(
        &self,
        current: &user::Model,
        old_password: &str,
        new_password: &str,
        confirm: &str,
    ) -> Result<FormOutcome<()>, AppError> {
        let errors = validate_change_password(old_password, new_password, confirm);
        if !errors.is_empty() {
            return Ok(FormOutcome::Invalid(errors));
        }
        if !verify_password(old_password, &current.password_hash) {
            warn!(user_id = %current.id, "rejected password change with wrong current password");
            return Ok(FormOutcome::invalid(
                "old_password",
                "Current password is incorrect.",
            ));
        }

        let hash = hash_password(new_password)?;
        UserDao::set_password_hash_on(self.user_dao.db(), current.id, &hash).await?;
        info!(user_id = %current.id, "password changed");
        Ok(FormOutcome::Done(()))
    }

    /// Removes the user with every row that points at it.
    pub async fn delete_account(
        &self,
        current: &user::Model,
        confirm_username: &str,
        password: &str,
    ) -> Result<FormOutcome<()>, AppError> {
        let errors = validate_delete_account(confirm_username, password, &current.username);
        if !errors.is_empty() {
            return Ok(FormOutcome::Invalid(errors));
        }
        if !verify_password(password, &current.password_hash) {
            warn!(user_id = %current.id, "rejected account deletion with wrong password");
            return Ok(FormOutcome::invalid("password", "Password is incorrect."));
        }

        let id = current.id;
        let txn = self.user_dao.db().begin().await?;
        PasswordResetDao::delete_for_user_on(&txn, id).await?;
        FollowDao::delete_for_user_on(&txn, id).await?;
        MessageDao::delete_for_user_on(&txn, id).await?;
        NotificationDao::delete_for_user_on(&txn, id).await?;
        HobbyDao::delete_for_user_on(&txn, id).await?;
        UserDao::delete_on(&txn, id).await?;
        txn.commit().await?;

        info!(user_id = %id, "account deleted");
        Ok(FormOutcome::Done(()))
    }
}

/// Free-text profile columns; blank values are stored as NULL.
struct ProfileFields {
    display_name: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    gender: Option<String>,
    age_group: Option<String>,
    privacy: Option<String>,
}

impl ProfileFields {
    fn from_input(input: &ProfileInput) -> Self {
        fn blank_to_none(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        Self {
            display_name: blank_to_none(&input.display_name),
            bio: blank_to_none(&input.bio),
            location: blank_to_none(&input.location),
            phone: blank_to_none(&input.phone),
            website: blank_to_none(&input.website),
            gender: blank_to_none(&input.gender),
            age_group: blank_to_none(&input.age_group),
            privacy: blank_to_none(&input.privacy),
        }
    }

    fn apply(self, active: &mut user::ActiveModel) {
        active.display_name = Set(self.display_name);
        active.bio = Set(self.bio);
        active.location = Set(self.location);
        active.phone = Set(self.phone);
        active.website = Set(self.website);
        active.gender = Set(self.gender);
        active.age_group = Set(self.age_group);
        // an omitted privacy field keeps the current setting
        if let Some(privacy) = self.privacy {
            active.privacy = Set(privacy);
        }
    }
}

/// A cropped data URL wins over an uploaded file.
async fn store_picture(
    input: &ProfileInput,
    upload: Option<&UploadedFile>,
    uploads: &UploadStorage,
) -> Result<Option<String>, UploadError> {
    let cropped = input.cropped_avatar.trim();
    if !cropped.is_empty() {
        return uploads.save_data_url(cropped).await.map(Some);
    }
    match upload {
        Some(file) => uploads.save_file(&file.filename, &file.bytes).await,
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{LoginOutcome, UserService};
    use crate::{
        auth::password::hash_password,
        db::dao::{DaoBase, HobbyDao, UserDao},
        services::FormOutcome,
        test_helpers::user_fixture,
    };

    fn service(db: &sea_orm::DatabaseConnection) -> UserService {
        UserService::new(UserDao::new(db), HobbyDao::new(db))
    }

    #[tokio::test]
    async fn unknown_identifier_is_invalid_credentials() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<crate::db::entities::user::Model>::new()])
            .into_connection();

        let outcome = service(&db)
            .authenticate("ghost", "Passw0rd")
            .await
            .expect("authenticate");
        assert!(matches!(outcome, LoginOutcome::InvalidCredentials));
    }

    #[tokio::test]
    async fn inactive_account_is_reported_after_password_check() {
        let mut user = user_fixture(Uuid::new_v4(), "alice01");
        user.password_hash = hash_password("Passw0rd").expect("hash");
        user.is_active = false;
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![user.clone()], vec![user]])
            .into_connection();
        let service = service(&db);

        let wrong = service
            .authenticate("alice01", "nope")
            .await
            .expect("authenticate");
        assert!(matches!(wrong, LoginOutcome::InvalidCredentials));

        let right = service
            .authenticate("alice01", "Passw0rd")
            .await
            .expect("authenticate");
        assert!(matches!(right, LoginOutcome::Inactive));
    }

    #[tokio::test]
    async fn delete_account_requires_exact_username_and_password() {
        let mut user = user_fixture(Uuid::new_v4(), "alice01");
        user.password_hash = hash_password("Passw0rd").expect("hash");
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let service = service(&db);

        let FormOutcome::Invalid(errors) = service
            .delete_account(&user, "Alice01", "Passw0rd")
            .await
            .expect("delete")
        else {
            panic!("mismatched username must not delete");
        };
        assert_eq!(errors.get("confirm_username"), "Please type your username exactly.");

        let FormOutcome::Invalid(errors) = service
            .delete_account(&user, "alice01", "wrong")
            .await
            .expect("delete")
        else {
            panic!("wrong password must not delete");
        };
        assert_eq!(errors.get("password"), "Password is incorrect.");
    }

    #[tokio::test]
    async fn change_password_checks_current_password() {
        let mut user = user_fixture(Uuid::new_v4(), "alice01");
        user.password_hash = hash_password("Passw0rd").expect("hash");
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let FormOutcome::Invalid(errors) = service(&db)
            .change_password(&user, "Wrong123", "NewPassw0rd", "NewPassw0rd")
            .await
            .expect("change")
        else {
            panic!("wrong current password must be rejected");
        };
        assert_eq!(errors.get("old_password"), "Current password is incorrect.");
    }
}
