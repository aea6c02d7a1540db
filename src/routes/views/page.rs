use std::sync::Arc;

use askama::Template;
use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::Html,
};

use crate::{
    db::entities::user,
    error::AppError,
    middleware::MaybeUser,
    services::ServiceContext,
    session::{Flash, Session},
    state::AppState,
};

/// Navigation data shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub signed_in: bool,
    pub username: String,
    pub avatar_url: String,
    pub is_admin: bool,
    pub notification_count: u64,
    pub csrf_token: String,
    pub flashes: Vec<Flash>,
    pub hide_nav: bool,
}

/// Request context needed to build a `Layout`. Flashes are taken only when the layout
/// is built, so notices raised earlier in the same request are shown.
pub struct Page {
    state: Arc<AppState>,
    session: Session,
    user: Option<user::Model>,
}

impl FromRequestParts<Arc<AppState>> for Page {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        Ok(Self {
            state: Arc::clone(state),
            session,
            user,
        })
    }
}

impl Page {
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn avatar_url(&self, user: &user::Model) -> String {
        self.state
            .uploads
            .avatar_url(user.profile_picture_url.as_deref())
    }

    pub async fn layout(&self) -> Result<Layout, AppError> {
        let mut layout = Layout {
            csrf_token: self.session.csrf_token(),
            flashes: self.session.take_flashes(),
            ..Layout::default()
        };
        if let Some(user) = &self.user {
            layout.signed_in = true;
            layout.username = user.username.clone();
            layout.avatar_url = self.avatar_url(user);
            layout.is_admin = user.is_admin;
            layout.notification_count = ServiceContext::from_state(&self.state)
                .notifications()
                .unread_count(user.id)
                .await?;
        }
        Ok(layout)
    }

    /// Layout for the signed-out screens (login, register, password reset).
    pub async fn bare_layout(&self) -> Result<Layout, AppError> {
        Ok(Layout {
            hide_nav: true,
            ..self.layout().await?
        })
    }
}

pub fn render(template: &impl Template) -> Result<Html<String>, AppError> {
    template
        .render()
        .map(Html)
        .map_err(|err| AppError::internal_with_source("failed to render page", err))
}

/// Display-ready view of a user row.
#[derive(Debug, Clone)]
pub struct UserCard {
    pub username: String,
    pub display_name: String,
    pub public_name: String,
    pub avatar_url: String,
    pub bio: String,
    pub location: String,
    pub phone: String,
    pub website: String,
    pub gender: String,
    pub age_group: String,
    pub privacy: String,
    pub date_of_birth: String,
}

impl UserCard {
    pub fn new(page: &Page, user: &user::Model) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            username: user.username.clone(),
            display_name: text(&user.display_name),
            public_name: user.public_name().to_string(),
            avatar_url: page.avatar_url(user),
            bio: text(&user.bio),
            location: text(&user.location),
            phone: text(&user.phone),
            website: text(&user.website),
            gender: text(&user.gender),
            age_group: text(&user.age_group),
            privacy: user.privacy.clone(),
            date_of_birth: user
                .date_of_birth
                .map(|dob| dob.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }

    pub fn many(page: &Page, users: &[user::Model]) -> Vec<Self> {
        users.iter().map(|user| Self::new(page, user)).collect()
    }
}
