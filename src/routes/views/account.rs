use std::sync::Arc;

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

use super::page::{Layout, Page, render};
use crate::{
    error::AppError,
    forms::{ChangePasswordForm, DeleteAccountForm, validators::FieldErrors},
    middleware::{CurrentUser, Csrf},
    services::{FormOutcome, ServiceContext},
    session::FlashLevel,
    state::AppState,
};

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    layout: Layout,
    public_name: String,
}

#[derive(Template)]
#[template(path = "settings.html")]
struct SettingsTemplate {
    layout: Layout,
}

#[derive(Template)]
#[template(path = "placeholder.html")]
struct PlaceholderTemplate {
    layout: Layout,
    title: &'static str,
}

#[derive(Template)]
#[template(path = "change_password.html")]
struct ChangePasswordTemplate {
    layout: Layout,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "delete_account.html")]
struct DeleteAccountTemplate {
    layout: Layout,
    errors: FieldErrors,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/home", get(home))
        .route("/settings", get(settings))
        .route("/forums", get(forums))
        .route("/events", get(events))
        .route("/games", get(games))
        .route("/messages", get(messages))
        .route(
            "/change-password",
            get(change_password_form).post(change_password_submit),
        )
        .route(
            "/delete-account",
            get(delete_account_form).post(delete_account_submit),
        )
        .with_state(state)
}

async fn home(CurrentUser(me): CurrentUser, page: Page) -> Result<Response, AppError> {
    let layout = page.layout().await?;
    Ok(render(&HomeTemplate {
        layout,
        public_name: me.public_name().to_string(),
    })?
    .into_response())
}

async fn settings(CurrentUser(_): CurrentUser, page: Page) -> Result<Response, AppError> {
    let layout = page.layout().await?;
    Ok(render(&SettingsTemplate { layout })?.into_response())
}

async fn placeholder(page: &Page, title: &'static str) -> Result<Response, AppError> {
    let layout = page.layout().await?;
    Ok(render(&PlaceholderTemplate { layout, title })?.into_response())
}

async fn forums(CurrentUser(_): CurrentUser, page: Page) -> Result<Response, AppError> {
    placeholder(&page, "Forums").await
}

async fn events(CurrentUser(_): CurrentUser, page: Page) -> Result<Response, AppError> {
    placeholder(&page, "Events").await
}

async fn games(CurrentUser(_): CurrentUser, page: Page) -> Result<Response, AppError> {
    placeholder(&page, "Games").await
}

async fn messages(CurrentUser(_): CurrentUser, page: Page) -> Result<Response, AppError> {
    placeholder(&page, "Messages").await
}

async fn change_password_form(
    CurrentUser(_): CurrentUser,
    page: Page,
) -> Result<Response, AppError> {
    let layout = page.layout().await?;
    Ok(render(&ChangePasswordTemplate {
        layout,
        errors: FieldErrors::new(),
    })?
    .into_response())
}

async fn change_password_submit(
    State(state): State<Arc<AppState>>,
    CurrentUser(me): CurrentUser,
    page: Page,
    Csrf(Form(form)): Csrf<Form<ChangePasswordForm>>,
) -> Result<Response, AppError> {
    let outcome = ServiceContext::from_state(&state)
        .user()
        .change_password(
            &me,
            &form.old_password,
            &form.new_password,
            &form.confirm_password,
        )
        .await?;

    match outcome {
        FormOutcome::Done(()) => {
            page.session().flash(FlashLevel::Success, "Password updated.");
            Ok(Redirect::to("/profile").into_response())
        }
        FormOutcome::Invalid(errors) => {
            let layout = page.layout().await?;
            Ok(render(&ChangePasswordTemplate { layout, errors })?.into_response())
        }
    }
}

async fn delete_account_form(
    CurrentUser(_): CurrentUser,
    page: Page,
) -> Result<Response, AppError> {
    let layout = page.layout().await?;
    Ok(render(&DeleteAccountTemplate {
        layout,
        errors: FieldErrors::new(),
    })?
    .into_response())
}

async fn delete_account_submit(
    State(state): State<Arc<AppState>>,
    CurrentUser(me): CurrentUser,
    page: Page,
    Csrf(Form(form)): Csrf<Form<DeleteAccountForm>>,
) -> Result<Response, AppError> {
    let outcome = ServiceContext::from_state(&state)
        .user()
        .delete_account(&me, &form.confirm_username, &form.password)
        .await?;

    match outcome {
        FormOutcome::Done(()) => {
            let session = page.session();
            session.logout();
            session.flash(FlashLevel::Success, "Your account has been deleted.");
            Ok(Redirect::to("/").into_response())
        }
        FormOutcome::Invalid(errors) => {
            let layout = page.layout().await?;
            Ok(render(&DeleteAccountTemplate { layout, errors })?.into_response())
        }
    }
}
