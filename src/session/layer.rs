use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cookie::{Cookie, SameSite};

use super::handle::Session;
use crate::{config::SessionConfig, error::AppError, state::AppState};

pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let cfg = &state.config.session;

    let session = match read_cookie(req.headers(), &cfg.cookie_name) {
        Some(key) => match state.sessions.load(&key).await {
            Ok(Some(data)) => Session::existing(key, data),
            Ok(None) => Session::fresh(),
            Err(err) => {
                return AppError::internal_with_source("failed to load session", err)
                    .into_response();
            }
        },
        None => Session::fresh(),
    };

    req.extensions_mut().insert(session.clone());
    let mut response = next.run(req).await;

    let commit = session.commit();
    if let Some(stale) = commit.stale_key.as_deref()
        && let Err(err) = state.sessions.delete(stale).await
    {
        tracing::warn!(error = %err, "failed to drop rotated session");
    }

    if !commit.dirty {
        return response;
    }

    let ttl = chrono::Duration::minutes(cfg.ttl_minutes);
    if let Err(err) = state.sessions.save(&commit.key, &commit.data, ttl).await {
        return AppError::internal_with_source("failed to save session", err).into_response();
    }

    if commit.send_cookie {
        match HeaderValue::from_str(&session_cookie(cfg, &commit.key).to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => tracing::error!(error = %err, "session cookie is not a valid header"),
        }
    }

    response
}

fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie(cfg: &SessionConfig, key: &str) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), key.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.cookie_secure)
        .max_age(cookie::time::Duration::minutes(cfg.ttl_minutes))
        .build()
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};

    use super::{read_cookie, session_cookie};
    use crate::config::SessionConfig;

    #[test]
    fn reads_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; kampong_session=abc123; lang=en"),
        );
        assert_eq!(
            read_cookie(&headers, "kampong_session").as_deref(),
            Some("abc123")
        );
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn cookie_is_http_only_and_lax() {
        let cfg = SessionConfig::default();
        let rendered = session_cookie(&cfg, "abc").to_string();
        assert!(rendered.starts_with("kampong_session=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(!rendered.contains("Secure"));
    }
}
