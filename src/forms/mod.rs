//! Request bodies of every HTML form, plus a body extractor that accepts either
//! urlencoded or multipart submissions.

pub mod validators;

use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::{StatusCode, header},
};
use serde::Deserialize;

use crate::error::AppError;

/// Forms that carry the per-session anti-forgery token.
pub trait CarriesCsrf {
    fn csrf_token(&self) -> &str;
}

impl<T: CarriesCsrf> CarriesCsrf for Form<T> {
    fn csrf_token(&self) -> &str {
        self.0.csrf_token()
    }
}

macro_rules! csrf_form {
    ($($name:ident { $($field:ident),* $(,)? })*) => {
        $(
            #[derive(Debug, Clone, Default, Deserialize)]
            #[serde(default)]
            pub struct $name {
                $(pub $field: String,)*
                pub csrf_token: String,
            }

            impl CarriesCsrf for $name {
                fn csrf_token(&self) -> &str {
                    &self.csrf_token
                }
            }
        )*
    };
}

csrf_form! {
    LoginForm { identifier, password }
    LogoutForm {}
    ForgotPasswordForm { email }
    ResetPasswordForm { password, confirm_password }
    ChangePasswordForm { old_password, new_password, confirm_password }
    DeleteAccountForm { confirm_username, password }
    FollowForm { next }
    MessageForm { message }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Ordered field list of a submitted form. Multipart file parts with a filename and a
/// non-empty body are kept separately.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, String)>,
    files: Vec<(String, UploadedFile)>,
}

impl FormData {
    pub fn from_pairs(fields: Vec<(String, String)>) -> Self {
        Self {
            fields,
            files: Vec::new(),
        }
    }

    /// First value of `name`, or "".
    pub fn text(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, file)| file)
    }
}

impl CarriesCsrf for FormData {
    fn csrf_token(&self) -> &str {
        self.text("csrf_token")
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large(err.body_text())
    } else {
        AppError::bad_request(err.body_text())
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| match rejection.status() {
                    StatusCode::PAYLOAD_TOO_LARGE => {
                        AppError::payload_too_large(rejection.body_text())
                    }
                    _ => AppError::bad_request(rejection.body_text()),
                })?;
            return Ok(Self::from_pairs(fields));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    if !filename.is_empty() && !bytes.is_empty() {
                        form.files.push((name, UploadedFile { filename, bytes }));
                    }
                }
                None => {
                    let value = field.text().await.map_err(multipart_error)?;
                    form.fields.push((name, value));
                }
            }
        }
        Ok(form)
    }
}

/// Fields of one registration wizard step.
#[derive(Debug, Clone, Default)]
pub struct RegisterStepInput {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub age: String,
    pub date_of_birth: String,
    pub picture_filename: Option<String>,
}

impl From<&FormData> for RegisterStepInput {
    fn from(form: &FormData) -> Self {
        Self {
            username: form.text("username").to_string(),
            display_name: form.text("display_name").to_string(),
            email: form.text("email").to_string(),
            password: form.text("password").to_string(),
            age: form.text("age").to_string(),
            date_of_birth: form.text("date_of_birth").to_string(),
            picture_filename: form
                .file("profile_picture")
                .map(|file| file.filename.clone()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    pub username: String,
    pub display_name: String,
    pub location: String,
    pub phone: String,
    pub bio: String,
    pub website: String,
    pub privacy: String,
    pub gender: String,
    pub age_group: String,
    pub date_of_birth: String,
    pub cropped_avatar: String,
    pub picture_filename: Option<String>,
    pub hobby_ids: Vec<String>,
}

impl From<&FormData> for ProfileInput {
    fn from(form: &FormData) -> Self {
        Self {
            username: form.text("username").to_string(),
            display_name: form.text("display_name").to_string(),
            location: form.text("location").to_string(),
            phone: form.text("phone").to_string(),
            bio: form.text("bio").to_string(),
            website: form.text("website").to_string(),
            privacy: form.text("privacy").to_string(),
            gender: form.text("gender").to_string(),
            age_group: form.text("age_group").to_string(),
            date_of_birth: form.text("date_of_birth").to_string(),
            cropped_avatar: form.text("cropped_avatar").to_string(),
            picture_filename: form
                .file("profile_picture")
                .map(|file| file.filename.clone()),
            hobby_ids: form
                .all("hobbies")
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
