use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Redirect, Response},
};

use super::redirect::referer_path;
use crate::{
    error::AppError,
    forms::CarriesCsrf,
    session::{FlashLevel, Session},
};

const CSRF_HEADER: &str = "x-csrf-token";

/// Wraps a body extractor and rejects the request unless it carries the session's
/// anti-forgery token, in the `csrf_token` field or the `X-CSRF-Token` header.
#[derive(Debug, Clone)]
pub struct Csrf<T>(pub T);

impl<S, T> FromRequest<S> for Csrf<T>
where
    S: Send + Sync,
    T: FromRequest<S> + CarriesCsrf,
    T::Rejection: IntoResponse,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let session = req
            .extensions()
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::internal("session layer is not installed").into_response())?;
        let header_token = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let back = referer_path(req.headers()).unwrap_or_else(|| "/".to_string());

        let inner = T::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let submitted = match inner.csrf_token() {
            "" => header_token.unwrap_or_default(),
            token => token.to_string(),
        };
        if !session.verify_csrf(&submitted) {
            tracing::warn!("rejected request with invalid csrf token");
            session.flash(FlashLevel::Error, "Invalid CSRF token. Please try again.");
            return Err(Redirect::to(&back).into_response());
        }

        Ok(Self(inner))
    }
}
