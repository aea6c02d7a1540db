//! Drives the five-step sign-up wizard. The wizard state itself lives in the session; this
//! service validates a submitted step against it and performs the final insert.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    auth::password::hash_password,
    db::dao::{DaoLayerError, UserDao, user_dao::NewUser},
    db::entities::user,
    domain::wizard::{StepData, WizardAction, WizardState},
    error::AppError,
    forms::{
        RegisterStepInput, UploadedFile,
        validators::{FieldErrors, normalize_email, parse_date, validate_register_step},
    },
    storage::{DEFAULT_AVATAR, UploadStorage},
};

pub const EXPIRED_MSG: &str = "Registration session expired. Please start again.";
pub const BAD_BIRTH_DATE_MSG: &str = "Please provide a valid date of birth.";

/// What the handler should do after a submission. Every variant except `Completed`
/// carries the wizard state to store back into the session.
#[derive(Debug)]
pub enum StepOutcome {
    /// Moved to another step, or stayed on the same step with field errors.
    Render {
        state: WizardState,
        errors: FieldErrors,
    },
    /// Draft was incomplete at commit; the wizard restarts.
    Expired(WizardState),
    /// Stored birth date no longer parses; the wizard rewinds to step 4.
    InvalidBirthDate(WizardState),
    /// The insert lost a uniqueness race; the wizard restarts.
    Conflict(WizardState),
    Completed(user::Model),
}

pub struct RegistrationService<'a> {
    user_dao: UserDao,
    uploads: &'a UploadStorage,
}

impl<'a> RegistrationService<'a> {
    pub fn new(user_dao: UserDao, uploads: &'a UploadStorage) -> Self {
        Self { user_dao, uploads }
    }

    pub async fn submit_step(
        &self,
        mut state: WizardState,
        raw_step: &str,
        action: WizardAction,
        input: &RegisterStepInput,
        picture: Option<&UploadedFile>,
        today: NaiveDate,
    ) -> Result<StepOutcome, AppError> {
        let step = state.submitted_step(raw_step);

        if action == WizardAction::Back {
            state.back(step);
            return Ok(StepOutcome::Render {
                state,
                errors: FieldErrors::new(),
            });
        }

        let mut errors = validate_register_step(step, input, today);
        if errors.is_empty() {
            self.check_uniqueness(step, input, &mut errors).await?;
        }
        if !errors.is_empty() {
            state.stay(step);
            return Ok(StepOutcome::Render { state, errors });
        }

        let data = match step {
            1 => StepData::Identity {
                username: input.username.trim().to_string(),
                display_name: input.display_name.trim().to_string(),
            },
            2 => StepData::Email(normalize_email(&input.email)),
            3 => StepData::Password {
                hash: hash_password(&input.password)?,
            },
            4 => StepData::Birth {
                age: input.age.trim().to_string(),
                date_of_birth: input.date_of_birth.trim().to_string(),
            },
            _ => return self.commit(state, picture).await,
        };

        state.advance(step, data);
        Ok(StepOutcome::Render {
            state,
            errors: FieldErrors::new(),
        })
    }

    async fn check_uniqueness(
        &self,
        step: u8,
        input: &RegisterStepInput,
        errors: &mut FieldErrors,
    ) -> Result<(), AppError> {
        if step == 1
            && self
                .user_dao
                .username_taken(input.username.trim(), None)
                .await?
        {
            errors.insert("username", "Username is already taken.");
        }
        if step == 2
            && self
                .user_dao
                .email_taken(&normalize_email(&input.email))
                .await?
        {
            errors.insert("email", "Email is already registered.");
        }
        Ok(())
    }

    async fn commit(
        &self,
        mut state: WizardState,
        picture: Option<&UploadedFile>,
    ) -> Result<StepOutcome, AppError> {
        let Some(draft) = state.complete() else {
            return Ok(StepOutcome::Expired(WizardState::default()));
        };

        let Some(date_of_birth) = parse_date(&draft.date_of_birth) else {
            state.stay(4);
            return Ok(StepOutcome::InvalidBirthDate(state));
        };

        let stored_picture = match picture {
            Some(file) => self
                .uploads
                .save_file(&file.filename, &file.bytes)
                .await
                .map_err(|err| AppError::internal_with_source("failed to store picture", err))?,
            None => None,
        };

        let is_admin = self.user_dao.count_users().await? == 0;
        let created = self
            .user_dao
            .create_user(NewUser {
                username: draft.username,
                email: draft.email,
                password_hash: draft.password_hash,
                display_name: draft.display_name,
                date_of_birth,
                profile_picture_url: stored_picture.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
                is_admin,
            })
            .await;

        match created {
            Ok(user) => {
                info!(user_id = %user.id, is_admin, "registered new user");
                Ok(StepOutcome::Completed(user))
            }
            Err(DaoLayerError::UniqueViolation(detail)) => {
                warn!(%detail, "registration lost a uniqueness race");
                Ok(StepOutcome::Conflict(WizardState::default()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::{RegistrationService, StepOutcome};
    use crate::{
        db::dao::{DaoBase, UserDao},
        domain::wizard::{WizardAction, WizardDraft, WizardState},
        forms::RegisterStepInput,
        storage::UploadStorage,
        test_helpers::count_row,
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).expect("date")
    }

    fn uploads() -> UploadStorage {
        UploadStorage::new(std::env::temp_dir().join(format!("kk-reg-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn back_moves_one_step_without_validation() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let uploads = uploads();
        let service = RegistrationService::new(UserDao::new(&db), &uploads);
        let state = WizardState {
            step: 3,
            ..WizardState::default()
        };

        let outcome = service
            .submit_step(
                state,
                "3",
                WizardAction::Back,
                &RegisterStepInput::default(),
                None,
                today(),
            )
            .await
            .expect("submit");

        let StepOutcome::Render { state, errors } = outcome else {
            panic!("back must re-render");
        };
        assert_eq!(state.step, 2);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn taken_username_keeps_wizard_on_step_one() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([[count_row(1)]])
            .into_connection();
        let uploads = uploads();
        let service = RegistrationService::new(UserDao::new(&db), &uploads);
        let input = RegisterStepInput {
            username: "alice01".to_string(),
            display_name: "Alice".to_string(),
            ..RegisterStepInput::default()
        };

        let outcome = service
            .submit_step(
                WizardState::default(),
                "1",
                WizardAction::Next,
                &input,
                None,
                today(),
            )
            .await
            .expect("submit");

        let StepOutcome::Render { state, errors } = outcome else {
            panic!("taken username must re-render");
        };
        assert_eq!(state.step, 1);
        assert_eq!(errors.get("username"), "Username is already taken.");
        assert!(state.draft.username.is_none());
    }

    #[tokio::test]
    async fn password_step_stores_only_a_hash() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let uploads = uploads();
        let service = RegistrationService::new(UserDao::new(&db), &uploads);
        let input = RegisterStepInput {
            password: "Passw0rd".to_string(),
            ..RegisterStepInput::default()
        };
        let state = WizardState {
            step: 3,
            ..WizardState::default()
        };

        let outcome = service
            .submit_step(state, "3", WizardAction::Next, &input, None, today())
            .await
            .expect("submit");

        let StepOutcome::Render { state, errors } = outcome else {
            panic!("valid password must advance");
        };
        assert!(errors.is_empty());
        assert_eq!(state.step, 4);
        let hash = state.draft.password_hash.expect("hash stored");
        assert_ne!(hash, "Passw0rd");
        assert!(hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn commit_with_incomplete_draft_restarts_wizard() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let uploads = uploads();
        let service = RegistrationService::new(UserDao::new(&db), &uploads);
        let state = WizardState {
            step: 5,
            ..WizardState::default()
        };

        let outcome = service
            .submit_step(
                state,
                "5",
                WizardAction::Next,
                &RegisterStepInput::default(),
                None,
                today(),
            )
            .await
            .expect("submit");

        let StepOutcome::Expired(state) = outcome else {
            panic!("incomplete draft must expire");
        };
        assert_eq!(state, WizardState::default());
    }

    #[tokio::test]
    async fn unparseable_stored_birth_date_rewinds_to_age_step() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let uploads = uploads();
        let service = RegistrationService::new(UserDao::new(&db), &uploads);
        let state = WizardState {
            step: 5,
            draft: WizardDraft {
                username: Some("alice01".to_string()),
                display_name: Some("Alice".to_string()),
                email: Some("alice@example.com".to_string()),
                password_hash: Some("$argon2id$stub".to_string()),
                age: Some("25".to_string()),
                date_of_birth: Some("31/02/2000".to_string()),
            },
        };

        let outcome = service
            .submit_step(
                state,
                "5",
                WizardAction::Next,
                &RegisterStepInput::default(),
                None,
                today(),
            )
            .await
            .expect("submit");

        let StepOutcome::InvalidBirthDate(state) = outcome else {
            panic!("bad stored birth date must rewind");
        };
        assert_eq!(state.step, 4);
        assert_eq!(state.draft.username.as_deref(), Some("alice01"));
        assert!(db.into_transaction_log().is_empty());
    }
}
