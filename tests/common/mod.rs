#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tower::ServiceExt; // for `oneshot`

use kampong_konek::{
    db::entities::user, routes::router, state::AppState, test_helpers::test_state,
};

pub const PASSWORD: &str = "Passw0rd";

pub struct Reply {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// One visitor: replays the session cookie the app hands out.
pub struct Browser {
    app: Router,
    pub state: Arc<AppState>,
    cookie: Option<String>,
}

impl Browser {
    pub async fn new() -> Self {
        Self::on(&test_state().await)
    }

    /// A second visitor against the same database and session store.
    pub fn on(state: &Arc<AppState>) -> Self {
        Self {
            app: router(Arc::clone(state)),
            state: Arc::clone(state),
            cookie: None,
        }
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> Reply {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }
        let response = self.app.clone().oneshot(request).await.unwrap();

        let cookie_name = &self.state.config.session.cookie_name;
        for value in response.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap().trim();
            if pair.starts_with(&format!("{cookie_name}=")) {
                self.cookie = Some(pair.to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Reply {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> Reply {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Reply {
        let encoded = fields
            .iter()
            .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(encoded))
                .unwrap(),
        )
        .await
    }

    /// Loads `page` and posts `fields` with the anti-forgery token it rendered.
    pub async fn submit(&mut self, page: &str, action: &str, fields: &[(&str, &str)]) -> Reply {
        let token = csrf_token(&self.get(page).await.body);
        let mut with_token = vec![("csrf_token", token.as_str())];
        with_token.extend_from_slice(fields);
        self.post_form(action, &with_token).await
    }

    /// Runs all five wizard steps; the browser is signed in afterwards.
    pub async fn register(&mut self, username: &str, email: &str) -> Reply {
        self.register_through(username, email, 5).await
    }

    /// Runs wizard steps 1 through `last_step` and returns the final reply.
    pub async fn register_through(
        &mut self,
        username: &str,
        email: &str,
        last_step: usize,
    ) -> Reply {
        let display_name = format!("{username} display");
        let steps: [(&str, Vec<(&str, &str)>); 5] = [
            ("1", vec![("username", username), ("display_name", display_name.as_str())]),
            ("2", vec![("email", email)]),
            ("3", vec![("password", PASSWORD)]),
            ("4", vec![("age", "25"), ("date_of_birth", "2000-01-01")]),
            ("5", vec![]),
        ];

        let mut last = None;
        for (step, fields) in steps.into_iter().take(last_step) {
            let mut all = vec![("step", step), ("action", "next")];
            all.extend(fields);
            last = Some(self.submit("/register", "/register", &all).await);
        }
        last.expect("at least one step")
    }

    pub async fn login(&mut self, identifier: &str) -> Reply {
        self.submit(
            "/login",
            "/login",
            &[("identifier", identifier), ("password", PASSWORD)],
        )
        .await
    }

    pub async fn logout(&mut self) -> Reply {
        self.submit("/settings", "/logout", &[]).await
    }
}

pub fn csrf_token(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("page renders a csrf field") + marker.len();
    let end = html[start..].find('"').unwrap();
    html[start..start + end].to_string()
}

fn encode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

pub async fn find_user(state: &AppState, username: &str) -> user::Model {
    user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await
        .unwrap()
        .expect("user exists")
}
