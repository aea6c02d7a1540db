use std::sync::Arc;

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use super::page::{Layout, Page, render};
use crate::{
    error::AppError,
    forms::{
        ForgotPasswordForm, LoginForm, LogoutForm, ResetPasswordForm,
        validators::{FieldErrors, validate_login},
    },
    middleware::Csrf,
    services::{FormOutcome, ServiceContext, user_service::LoginOutcome},
    session::FlashLevel,
    state::AppState,
};

const INVALID_RESET_MSG: &str = "This reset link is invalid or expired.";

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    layout: Layout,
    identifier: String,
    errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "forgot_password.html")]
struct ForgotPasswordTemplate {
    layout: Layout,
    email: String,
    errors: FieldErrors,
    reset_link: Option<String>,
}

#[derive(Template)]
#[template(path = "reset_password.html")]
struct ResetPasswordTemplate {
    layout: Layout,
    token: String,
    invalid: bool,
    errors: FieldErrors,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_form).post(login_submit))
        .route("/logout", post(logout))
        .route(
            "/forgot-password",
            get(forgot_password_form).post(forgot_password_submit),
        )
        .route(
            "/reset-password/{token}",
            get(reset_password_form).post(reset_password_submit),
        )
        .with_state(state)
}

async fn index() -> Redirect {
    Redirect::to("/login")
}

async fn login_form(page: Page) -> Result<Response, AppError> {
    let layout = page.bare_layout().await?;
    Ok(render(&LoginTemplate {
        layout,
        identifier: String::new(),
        errors: FieldErrors::new(),
    })?
    .into_response())
}

async fn login_submit(
    State(state): State<Arc<AppState>>,
    page: Page,
    Csrf(Form(form)): Csrf<Form<LoginForm>>,
) -> Result<Response, AppError> {
    let mut errors = validate_login(&form.identifier, &form.password);
    if errors.is_empty() {
        let outcome = ServiceContext::from_state(&state)
            .user()
            .authenticate(&form.identifier, &form.password)
            .await?;
        match outcome {
            LoginOutcome::Authenticated(user) => {
                let session = page.session();
                session.login(user.id);
                session.flash(FlashLevel::Success, "Welcome back!");
                return Ok(Redirect::to("/home").into_response());
            }
            LoginOutcome::InvalidCredentials => {
                errors.insert("general", "Invalid credentials. Please try again.");
            }
            LoginOutcome::Inactive => {
                errors.insert("general", "Your account is inactive. Please contact support.");
            }
        }
    }

    let layout = page.bare_layout().await?;
    Ok(render(&LoginTemplate {
        layout,
        identifier: form.identifier.trim().to_string(),
        errors,
    })?
    .into_response())
}

async fn logout(page: Page, Csrf(Form(_)): Csrf<Form<LogoutForm>>) -> Redirect {
    let session = page.session();
    session.logout();
    session.flash(FlashLevel::Success, "You have been logged out.");
    Redirect::to("/login")
}

async fn forgot_password_form(page: Page) -> Result<Response, AppError> {
    let layout = page.bare_layout().await?;
    Ok(render(&ForgotPasswordTemplate {
        layout,
        email: String::new(),
        errors: FieldErrors::new(),
        reset_link: None,
    })?
    .into_response())
}

async fn forgot_password_submit(
    State(state): State<Arc<AppState>>,
    page: Page,
    Csrf(Form(form)): Csrf<Form<ForgotPasswordForm>>,
) -> Result<Response, AppError> {
    let outcome = ServiceContext::from_state(&state)
        .password_reset()
        .request(&form.email)
        .await?;

    let (errors, reset_link) = match outcome {
        FormOutcome::Done(token) => {
            page.session().flash(
                FlashLevel::Success,
                "If the email exists, a reset link has been generated.",
            );
            let base = state.config.general.public_base_url.trim_end_matches('/');
            (FieldErrors::new(), Some(format!("{base}/reset-password/{token}")))
        }
        FormOutcome::Invalid(errors) => (errors, None),
    };

    let layout = page.bare_layout().await?;
    Ok(render(&ForgotPasswordTemplate {
        layout,
        email: form.email.trim().to_string(),
        errors,
        reset_link,
    })?
    .into_response())
}

async fn reset_password_form(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    page: Page,
) -> Result<Response, AppError> {
    let valid = ServiceContext::from_state(&state)
        .password_reset()
        .find_valid(&token)
        .await?
        .is_some();
    if !valid {
        page.session().flash(FlashLevel::Error, INVALID_RESET_MSG);
    }

    let layout = page.bare_layout().await?;
    Ok(render(&ResetPasswordTemplate {
        layout,
        token,
        invalid: !valid,
        errors: FieldErrors::new(),
    })?
    .into_response())
}

async fn reset_password_submit(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    page: Page,
    Csrf(Form(form)): Csrf<Form<ResetPasswordForm>>,
) -> Result<Response, AppError> {
    let outcome = ServiceContext::from_state(&state)
        .password_reset()
        .reset(&token, &form.password, &form.confirm_password)
        .await?;

    let (invalid, errors) = match outcome {
        Some(FormOutcome::Done(())) => {
            page.session()
                .flash(FlashLevel::Success, "Password updated. Please log in.");
            return Ok(Redirect::to("/login").into_response());
        }
        Some(FormOutcome::Invalid(errors)) => (false, errors),
        None => {
            page.session().flash(FlashLevel::Error, INVALID_RESET_MSG);
            (true, FieldErrors::new())
        }
    };

    let layout = page.bare_layout().await?;
    Ok(render(&ResetPasswordTemplate {
        layout,
        token,
        invalid,
        errors,
    })?
    .into_response())
}
