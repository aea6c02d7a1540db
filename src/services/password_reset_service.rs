use chrono::{Duration, Utc};
use sea_orm::TransactionTrait;
use tracing::{info, warn};

use crate::{
    auth::{
        password::hash_password,
        tokens::{generate_token, hash_token},
    },
    db::dao::{DaoBase, PasswordResetDao, UserDao},
    db::entities::password_reset_token,
    error::AppError,
    forms::validators::{normalize_email, validate_forgot_password, validate_reset_password},
    services::FormOutcome,
};

pub const TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Clone)]
pub struct PasswordResetService {
    reset_dao: PasswordResetDao,
    user_dao: UserDao,
}

impl PasswordResetService {
    pub fn new(reset_dao: PasswordResetDao, user_dao: UserDao) -> Self {
        Self {
            reset_dao,
            user_dao,
        }
    }

    /// Returns a raw token whether or not the email is known; only known emails get a
    /// stored digest, so a token for an unknown address never validates.
    pub async fn request(&self, raw_email: &str) -> Result<FormOutcome<String>, AppError> {
        let errors = validate_forgot_password(raw_email);
        if !errors.is_empty() {
            return Ok(FormOutcome::Invalid(errors));
        }

        let token = generate_token();
        let email = normalize_email(raw_email);
        if let Some(user) = self.user_dao.find_by_email(&email).await? {
            let expires_at = (Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES)).fixed_offset();
            self.reset_dao
                .store(user.id, &hash_token(&token), expires_at)
                .await?;
            info!(user_id = %user.id, "password reset token issued");
        }
        Ok(FormOutcome::Done(token))
    }

    pub async fn find_valid(
        &self,
        raw_token: &str,
    ) -> Result<Option<password_reset_token::Model>, AppError> {
        let record = self.reset_dao.find_by_hash(&hash_token(raw_token)).await?;
        Ok(record.filter(|record| record.is_valid_at(Utc::now().fixed_offset())))
    }

    /// `Ok(None)` when the token is unknown, used or expired.
    pub async fn reset(
        &self,
        raw_token: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Option<FormOutcome<()>>, AppError> {
        let Some(record) = self.find_valid(raw_token).await? else {
            warn!("rejected invalid or expired reset token");
            return Ok(None);
        };

        let errors = validate_reset_password(password, confirm);
        if !errors.is_empty() {
            return Ok(Some(FormOutcome::Invalid(errors)));
        }

        let hash = hash_password(password)?;
        let txn = self.user_dao.db().begin().await?;
        let now = Utc::now().fixed_offset();
        let claimed = PasswordResetDao::claim_on(&txn, record.id, now).await?;
        if claimed == 0 {
            txn.rollback().await?;
            warn!(user_id = %record.user_id, "reset token was used by a concurrent request");
            return Ok(None);
        }
        UserDao::set_password_hash_on(&txn, record.user_id, &hash).await?;
        txn.commit().await?;

        info!(user_id = %record.user_id, "password reset completed");
        Ok(Some(FormOutcome::Done(())))
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::PasswordResetService;
    use crate::{
        db::dao::{DaoBase, PasswordResetDao, UserDao},
        db::entities::user,
        services::FormOutcome,
    };

    #[tokio::test]
    async fn unknown_email_still_yields_a_token_shape() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let service = PasswordResetService::new(PasswordResetDao::new(&db), UserDao::new(&db));

        let FormOutcome::Done(token) = service
            .request("Nobody@Example.com")
            .await
            .expect("request")
        else {
            panic!("valid email must produce a token");
        };
        assert_eq!(token.len(), 43);
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn malformed_email_is_a_field_error() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let service = PasswordResetService::new(PasswordResetDao::new(&db), UserDao::new(&db));

        let outcome = service.request("not-an-email").await.expect("request");
        assert!(matches!(outcome, FormOutcome::Invalid(errors) if errors.contains("email")));
    }
}
