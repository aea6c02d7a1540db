use std::sync::Arc;

use askama::Template;
use axum::{
    Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Utc;
use uuid::Uuid;

use super::page::{Layout, Page, UserCard, render};
use crate::{
    db::entities::user,
    domain::visibility::Visibility,
    error::AppError,
    forms::{FormData, ProfileInput, validators::FieldErrors},
    middleware::{CurrentUser, Csrf, MaybeUser},
    services::{FormOutcome, ServiceContext},
    session::FlashLevel,
    state::AppState,
};

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    layout: Layout,
    user: UserCard,
    followers_count: u64,
    following_count: u64,
    hobbies: Vec<String>,
}

pub struct HobbyOption {
    pub id: Uuid,
    pub name: String,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "profile_edit.html")]
struct ProfileEditTemplate {
    layout: Layout,
    setup_mode: bool,
    action: &'static str,
    user: UserCard,
    hobbies: Vec<HobbyOption>,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "profile_public.html")]
struct PublicProfileTemplate {
    layout: Layout,
    user: UserCard,
    visibility: Visibility,
    mutual_followers: Vec<UserCard>,
    followers_count: u64,
    following_count: u64,
    hobbies: Vec<String>,
}

#[derive(Template)]
#[template(path = "connections.html")]
struct ConnectionsTemplate {
    layout: Layout,
    user: UserCard,
    title: &'static str,
    people: Vec<UserCard>,
}

#[derive(Clone, Copy)]
enum Connections {
    Followers,
    Following,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(own_profile))
        .route("/profile/edit", get(edit_form).post(edit_submit))
        .route("/profile/setup", get(setup_form).post(setup_submit))
        .route("/users/{username}", get(public_profile))
        .route("/users/{username}/followers", get(followers))
        .route("/users/{username}/following", get(following))
        .with_state(state)
}

async fn own_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(me): CurrentUser,
    page: Page,
) -> Result<Response, AppError> {
    let services = ServiceContext::from_state(&state);
    let (followers_count, following_count) = services.social().counts(me.id).await?;
    let hobbies = services.user().hobbies_of(me.id).await?;

    let layout = page.layout().await?;
    Ok(render(&ProfileTemplate {
        layout,
        user: UserCard::new(&page, &me),
        followers_count,
        following_count,
        hobbies: hobbies.into_iter().map(|hobby| hobby.name).collect(),
    })?
    .into_response())
}

async fn render_edit(
    state: &AppState,
    page: &Page,
    me: &user::Model,
    setup_mode: bool,
    errors: FieldErrors,
) -> Result<Response, AppError> {
    let users = ServiceContext::from_state(state).user();
    let selected = users.selected_hobby_ids(me.id).await?;
    let hobbies = users
        .hobby_catalogue()
        .await?
        .into_iter()
        .map(|hobby| HobbyOption {
            selected: selected.contains(&hobby.id),
            id: hobby.id,
            name: hobby.name,
        })
        .collect();

    let layout = page.layout().await?;
    Ok(render(&ProfileEditTemplate {
        layout,
        setup_mode,
        action: if setup_mode { "/profile/setup" } else { "/profile/edit" },
        user: UserCard::new(page, me),
        hobbies,
        errors,
    })?
    .into_response())
}

async fn submit(
    state: &AppState,
    page: &Page,
    me: &user::Model,
    form: &FormData,
    setup_mode: bool,
) -> Result<Response, AppError> {
    let input = ProfileInput::from(form);
    let outcome = ServiceContext::from_state(state)
        .user()
        .update_profile(
            me,
            &input,
            form.file("profile_picture"),
            &state.uploads,
            Utc::now().date_naive(),
        )
        .await?;

    match outcome {
        FormOutcome::Done(_) => {
            page.session().flash(FlashLevel::Success, "Profile updated.");
            Ok(Redirect::to("/profile").into_response())
        }
        FormOutcome::Invalid(errors) => render_edit(state, page, me, setup_mode, errors).await,
    }
}

async fn edit_form(
    State(state): State<Arc<AppState>>,
    CurrentUser(me): CurrentUser,
    page: Page,
) -> Result<Response, AppError> {
    render_edit(&state, &page, &me, false, FieldErrors::new()).await
}

async fn edit_submit(
    State(state): State<Arc<AppState>>,
    CurrentUser(me): CurrentUser,
    page: Page,
    Csrf(form): Csrf<FormData>,
) -> Result<Response, AppError> {
    submit(&state, &page, &me, &form, false).await
}

async fn setup_form(
    State(state): State<Arc<AppState>>,
    CurrentUser(me): CurrentUser,
    page: Page,
) -> Result<Response, AppError> {
    render_edit(&state, &page, &me, true, FieldErrors::new()).await
}

async fn setup_submit(
    State(state): State<Arc<AppState>>,
    CurrentUser(me): CurrentUser,
    page: Page,
    Csrf(form): Csrf<FormData>,
) -> Result<Response, AppError> {
    submit(&state, &page, &me, &form, true).await
}

async fn public_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    MaybeUser(viewer): MaybeUser,
    page: Page,
) -> Result<Response, AppError> {
    let services = ServiceContext::from_state(&state);
    let target = services.user().require_by_username(&username).await?;
    let view = services.social().profile_view(viewer.as_ref(), &target).await?;

    let layout = page.layout().await?;
    Ok(render(&PublicProfileTemplate {
        layout,
        user: UserCard::new(&page, &target),
        visibility: view.visibility,
        mutual_followers: UserCard::many(&page, &view.mutual_followers),
        followers_count: view.followers_count,
        following_count: view.following_count,
        hobbies: view.hobbies.into_iter().map(|hobby| hobby.name).collect(),
    })?
    .into_response())
}

async fn connections(
    state: &AppState,
    username: &str,
    viewer: &user::Model,
    page: &Page,
    which: Connections,
) -> Result<Response, AppError> {
    let services = ServiceContext::from_state(state);
    let social = services.social();
    let target = services.user().require_by_username(username).await?;

    let visibility = social.visibility(Some(viewer), &target).await?;
    let (title, private_msg) = match which {
        Connections::Followers => ("Followers", "Followers list is private."),
        Connections::Following => ("Following", "Following list is private."),
    };
    if !visibility.can_view_connections {
        page.session().flash(FlashLevel::Warning, private_msg);
        return Ok(Redirect::to(&format!("/users/{}", target.username)).into_response());
    }

    let people = match which {
        Connections::Followers => social.followers(&target).await?,
        Connections::Following => social.following(&target).await?,
    };

    let layout = page.layout().await?;
    Ok(render(&ConnectionsTemplate {
        layout,
        user: UserCard::new(page, &target),
        title,
        people: UserCard::many(page, &people),
    })?
    .into_response())
}

async fn followers(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    CurrentUser(me): CurrentUser,
    page: Page,
) -> Result<Response, AppError> {
    connections(&state, &username, &me, &page, Connections::Followers).await
}

async fn following(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    CurrentUser(me): CurrentUser,
    page: Page,
) -> Result<Response, AppError> {
    connections(&state, &username, &me, &page, Connections::Following).await
}
