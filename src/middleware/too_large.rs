use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::redirect::referer_path;
use crate::session::{FlashLevel, Session};

const TOO_LARGE_MSG: &str = "File too large. Please upload an image under 2MB.";

/// Turns a 413 from the body limit into a flash and a redirect back to the form.
/// Must run inside the session layer.
pub async fn payload_too_large_redirect(req: Request, next: Next) -> Response {
    let session = req.extensions().get::<Session>().cloned();
    let back = referer_path(req.headers()).unwrap_or_else(|| "/profile/edit".to_string());

    let response = next.run(req).await;
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }

    tracing::warn!(redirect = %back, "rejected oversized request body");
    if let Some(session) = session {
        session.flash(FlashLevel::Error, TOO_LARGE_MSG);
    }
    Redirect::to(&back).into_response()
}
