use std::sync::Arc;

use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Utc;

use super::page::{Layout, Page, render};
use crate::{
    domain::wizard::{WizardAction, WizardState},
    error::AppError,
    forms::{FormData, RegisterStepInput, validators::FieldErrors},
    middleware::Csrf,
    services::{
        ServiceContext,
        registration_service::{BAD_BIRTH_DATE_MSG, EXPIRED_MSG, StepOutcome},
    },
    session::FlashLevel,
    state::AppState,
};

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    layout: Layout,
    step: u8,
    username: String,
    display_name: String,
    email: String,
    age: String,
    date_of_birth: String,
    errors: FieldErrors,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", get(register_form).post(register_submit))
        .with_state(state)
}

/// Draft values win; a field the draft does not hold yet shows what was just typed.
fn shown(draft: &Option<String>, submitted: &str) -> String {
    draft
        .clone()
        .unwrap_or_else(|| submitted.trim().to_string())
}

async fn render_step(
    page: &Page,
    state: &WizardState,
    input: &RegisterStepInput,
    errors: FieldErrors,
) -> Result<Response, AppError> {
    let draft = &state.draft;
    let layout = page.bare_layout().await?;
    Ok(render(&RegisterTemplate {
        layout,
        step: state.step,
        username: shown(&draft.username, &input.username),
        display_name: shown(&draft.display_name, &input.display_name),
        email: shown(&draft.email, &input.email),
        age: shown(&draft.age, &input.age),
        date_of_birth: shown(&draft.date_of_birth, &input.date_of_birth),
        errors,
    })?
    .into_response())
}

async fn register_form(page: Page) -> Result<Response, AppError> {
    let session = page.session();
    let state = match session.wizard() {
        Some(state) => state,
        None => {
            let state = WizardState::default();
            session.set_wizard(state.clone());
            state
        }
    };
    render_step(&page, &state, &RegisterStepInput::default(), FieldErrors::new()).await
}

async fn register_submit(
    State(app): State<Arc<AppState>>,
    page: Page,
    Csrf(form): Csrf<FormData>,
) -> Result<Response, AppError> {
    let session = page.session();
    let wizard = session.wizard().unwrap_or_default();
    let input = RegisterStepInput::from(&form);
    let action = WizardAction::parse(form.text("action"));

    let outcome = ServiceContext::from_state(&app)
        .registration(&app.uploads)
        .submit_step(
            wizard,
            form.text("step"),
            action,
            &input,
            form.file("profile_picture"),
            Utc::now().date_naive(),
        )
        .await?;

    match outcome {
        StepOutcome::Render { state, errors } => {
            session.set_wizard(state.clone());
            render_step(&page, &state, &input, errors).await
        }
        StepOutcome::Expired(state) => {
            session.set_wizard(state);
            session.flash(FlashLevel::Error, EXPIRED_MSG);
            Ok(Redirect::to("/register").into_response())
        }
        StepOutcome::InvalidBirthDate(state) => {
            session.set_wizard(state);
            session.flash(FlashLevel::Error, BAD_BIRTH_DATE_MSG);
            Ok(Redirect::to("/register").into_response())
        }
        StepOutcome::Conflict(state) => {
            session.set_wizard(state);
            session.flash(
                FlashLevel::Error,
                "Registration could not be completed. Please start again.",
            );
            Ok(Redirect::to("/register").into_response())
        }
        StepOutcome::Completed(user) => {
            session.login(user.id);
            session.flash(FlashLevel::Success, "Account created successfully!");
            Ok(Redirect::to("/profile/setup").into_response())
        }
    }
}
