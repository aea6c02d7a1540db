use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    db::entities::user,
    error::AppError,
    services::ServiceContext,
    session::{FlashLevel, Session},
    state::AppState,
};

/// Signed-in user, resolved once per request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

/// Like `CurrentUser`, but anonymous visitors are allowed through.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<user::Model>);

#[derive(Clone)]
struct ResolvedUser(Option<user::Model>);

async fn resolve(
    parts: &mut Parts,
    state: &Arc<AppState>,
) -> Result<Option<user::Model>, AppError> {
    if let Some(ResolvedUser(user)) = parts.extensions.get::<ResolvedUser>() {
        return Ok(user.clone());
    }

    let session = Session::from_request_parts(parts, state).await?;
    let user = match session.user_id() {
        Some(id) => ServiceContext::from_state(state).user().find_by_id(id).await?,
        None => None,
    };
    parts.extensions.insert(ResolvedUser(user.clone()));
    Ok(user)
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts, state).await?))
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match resolve(parts, state).await {
            Ok(Some(user)) => Ok(Self(user)),
            Ok(None) => {
                if let Some(session) = parts.extensions.get::<Session>() {
                    session.flash(FlashLevel::Warning, "Please log in to continue.");
                }
                Err(Redirect::to("/login").into_response())
            }
            Err(err) => Err(err.into_response()),
        }
    }
}
