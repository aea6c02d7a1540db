use std::sync::{Arc, Mutex, MutexGuard};

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::tokens, domain::wizard::WizardState, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for FlashLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Everything persisted for one visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub register: Option<WizardState>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

impl SessionData {
    fn fresh() -> Self {
        Self {
            csrf_token: tokens::generate_token(),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct SessionInner {
    key: String,
    data: SessionData,
    dirty: bool,
    is_new: bool,
    stale_key: Option<String>,
}

/// What the middleware must persist once the handler is done.
#[derive(Debug)]
pub(crate) struct SessionCommit {
    pub key: String,
    pub data: SessionData,
    pub dirty: bool,
    pub send_cookie: bool,
    pub stale_key: Option<String>,
}

/// Request-scoped handle; clones share state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

impl Session {
    pub(crate) fn existing(key: String, data: SessionData) -> Self {
        Self::wrap(SessionInner {
            key,
            data,
            dirty: false,
            is_new: false,
            stale_key: None,
        })
    }

    /// Nothing is stored for a new visitor until something is written, so asset requests
    /// without a cookie leave no records behind.
    pub(crate) fn fresh() -> Self {
        Self::wrap(SessionInner {
            key: tokens::generate_token(),
            data: SessionData::default(),
            dirty: false,
            is_new: true,
            stale_key: None,
        })
    }

    fn wrap(inner: SessionInner) -> Self {
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.lock().data.user_id
    }

    pub fn csrf_token(&self) -> String {
        let mut inner = self.lock();
        if inner.data.csrf_token.is_empty() {
            inner.data.csrf_token = tokens::generate_token();
            inner.dirty = true;
        }
        inner.data.csrf_token.clone()
    }

    pub fn verify_csrf(&self, provided: &str) -> bool {
        let inner = self.lock();
        !inner.data.csrf_token.is_empty()
            && tokens::constant_time_eq(&inner.data.csrf_token, provided)
    }

    /// Starts a new session bound to `user_id` under a new key; the old record is dropped.
    pub fn login(&self, user_id: Uuid) {
        let mut inner = self.lock();
        Self::cycle(&mut inner);
        inner.data.user_id = Some(user_id);
    }

    /// Like `login`, but anonymous. Flashes raised afterwards survive.
    pub fn logout(&self) {
        Self::cycle(&mut self.lock());
    }

    fn cycle(inner: &mut SessionInner) {
        let previous = std::mem::replace(&mut inner.key, tokens::generate_token());
        if !inner.is_new && inner.stale_key.is_none() {
            inner.stale_key = Some(previous);
        }
        inner.data = SessionData::fresh();
        inner.dirty = true;
    }

    pub fn flash(&self, level: FlashLevel, message: impl Into<String>) {
        let mut inner = self.lock();
        inner.data.flashes.push(Flash {
            level,
            message: message.into(),
        });
        inner.dirty = true;
    }

    pub fn take_flashes(&self) -> Vec<Flash> {
        let mut inner = self.lock();
        if inner.data.flashes.is_empty() {
            return Vec::new();
        }
        inner.dirty = true;
        std::mem::take(&mut inner.data.flashes)
    }

    pub fn wizard(&self) -> Option<WizardState> {
        self.lock().data.register.clone()
    }

    pub fn set_wizard(&self, state: WizardState) {
        let mut inner = self.lock();
        inner.data.register = Some(state);
        inner.dirty = true;
    }

    pub fn clear_wizard(&self) {
        let mut inner = self.lock();
        if inner.data.register.take().is_some() {
            inner.dirty = true;
        }
    }

    pub(crate) fn commit(&self) -> SessionCommit {
        let mut inner = self.lock();
        SessionCommit {
            key: inner.key.clone(),
            data: inner.data.clone(),
            dirty: inner.dirty,
            send_cookie: inner.is_new || inner.stale_key.is_some(),
            stale_key: inner.stale_key.take(),
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::internal("session layer is not installed"))
    }
}
