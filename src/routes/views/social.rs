use std::sync::Arc;

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use super::page::{Layout, Page, UserCard, render};
use crate::{
    error::AppError,
    forms::{FollowForm, MessageForm},
    middleware::{CurrentUser, Csrf, redirect::is_safe_next},
    services::{
        ServiceContext,
        social_service::{FollowOutcome, MessageOutcome},
    },
    session::FlashLevel,
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

pub struct SearchRow {
    pub user: UserCard,
    pub is_self: bool,
    pub is_following: bool,
    pub can_message: bool,
}

#[derive(Template)]
#[template(path = "search.html")]
struct SearchTemplate {
    layout: Layout,
    query: String,
    results: Vec<SearchRow>,
}

pub struct NotificationRow {
    pub kind: String,
    pub message: String,
    pub created_at: String,
    pub unread: bool,
}

#[derive(Template)]
#[template(path = "notifications.html")]
struct NotificationsTemplate {
    layout: Layout,
    items: Vec<NotificationRow>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users/{username}/follow", post(follow))
        .route("/users/{username}/unfollow", post(unfollow))
        .route("/users/{username}/message", post(message))
        .route("/search", get(search))
        .route("/notifications", get(notifications))
        .with_state(state)
}

/// The posted `next` when it is a local path, else the target's profile.
fn back_to(next: &str, username: &str) -> Redirect {
    let next = next.trim();
    if is_safe_next(next) {
        Redirect::to(next)
    } else {
        Redirect::to(&format!("/users/{username}"))
    }
}

async fn follow(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    CurrentUser(me): CurrentUser,
    page: Page,
    Csrf(Form(form)): Csrf<Form<FollowForm>>,
) -> Result<Response, AppError> {
    let services = ServiceContext::from_state(&state);
    let target = services.user().require_by_username(&username).await?;
    let session = page.session();

    match services.social().follow(&me, &target).await? {
        FollowOutcome::SelfFollow => {
            session.flash(FlashLevel::Warning, "You cannot follow yourself.");
            return Ok(Redirect::to(&format!("/users/{}", target.username)).into_response());
        }
        FollowOutcome::Followed => {
            session.flash(FlashLevel::Success, "You are now following this user.");
        }
        FollowOutcome::AlreadyFollowing => {}
    }
    Ok(back_to(&form.next, &target.username).into_response())
}

async fn unfollow(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    CurrentUser(me): CurrentUser,
    page: Page,
    Csrf(Form(form)): Csrf<Form<FollowForm>>,
) -> Result<Response, AppError> {
    let services = ServiceContext::from_state(&state);
    let target = services.user().require_by_username(&username).await?;

    services.social().unfollow(&me, &target).await?;
    page.session()
        .flash(FlashLevel::Success, "You have unfollowed this user.");
    Ok(back_to(&form.next, &target.username).into_response())
}

async fn message(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    CurrentUser(me): CurrentUser,
    page: Page,
    Csrf(Form(form)): Csrf<Form<MessageForm>>,
) -> Result<Response, AppError> {
    let services = ServiceContext::from_state(&state);
    let target = services.user().require_by_username(&username).await?;

    let (level, notice) = match services
        .social()
        .send_message(&me, &target, &form.message)
        .await?
    {
        MessageOutcome::Sent => (FlashLevel::Success, "Message sent."),
        MessageOutcome::SelfMessage => (FlashLevel::Warning, "You cannot message yourself."),
        MessageOutcome::NotAllowed => (
            FlashLevel::Warning,
            "You can only message mutual followers for private profiles.",
        ),
        MessageOutcome::InvalidBody(reason) => (FlashLevel::Warning, reason),
    };
    page.session().flash(level, notice);
    Ok(Redirect::to(&format!("/users/{}", target.username)).into_response())
}

async fn search(
    State(state): State<Arc<AppState>>,
    CurrentUser(me): CurrentUser,
    Query(query): Query<SearchQuery>,
    page: Page,
) -> Result<Response, AppError> {
    let hits = ServiceContext::from_state(&state)
        .social()
        .search(&me, &query.q)
        .await?;
    let results = hits
        .into_iter()
        .map(|hit| SearchRow {
            user: UserCard::new(&page, &hit.user),
            is_self: hit.is_self,
            is_following: hit.is_following,
            can_message: hit.can_message,
        })
        .collect();

    let layout = page.layout().await?;
    Ok(render(&SearchTemplate {
        layout,
        query: query.q.trim().to_string(),
        results,
    })?
    .into_response())
}

async fn notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(me): CurrentUser,
    page: Page,
) -> Result<Response, AppError> {
    let items = ServiceContext::from_state(&state)
        .notifications()
        .open_inbox(me.id)
        .await?
        .into_iter()
        .map(|item| NotificationRow {
            unread: item.read_at.is_none(),
            created_at: item.created_at.format("%Y-%m-%d %H:%M").to_string(),
            kind: item.kind,
            message: item.message,
        })
        .collect();

    let layout = page.layout().await?;
    Ok(render(&NotificationsTemplate { layout, items })?.into_response())
}
