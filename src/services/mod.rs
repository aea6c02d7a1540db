pub mod address_lookup;
pub mod context;
pub mod notification_service;
pub mod password_reset_service;
pub mod registration_service;
pub mod social_service;
pub mod user_service;

pub use context::ServiceContext;

use crate::forms::validators::FieldErrors;

/// Result of a form-driven operation: either it went through, or the form is shown again
/// with field errors.
#[derive(Debug)]
pub enum FormOutcome<T> {
    Done(T),
    Invalid(FieldErrors),
}

impl<T> FormOutcome<T> {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field, message);
        Self::Invalid(errors)
    }
}
