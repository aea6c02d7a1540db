mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::{Browser, csrf_token, find_user};
use kampong_konek::db::entities::{follow, message, notification};

async fn pair() -> (Browser, Browser) {
    let mut alice = Browser::new().await;
    alice.register("alice01", "alice@example.com").await;
    let mut bob = Browser::on(&alice.state);
    bob.register("bob_02", "bob@example.com").await;
    (alice, bob)
}

async fn notifications_of(browser: &Browser, username: &str, kind: &str) -> u64 {
    let owner = find_user(&browser.state, username).await;
    notification::Entity::find()
        .filter(notification::Column::UserId.eq(owner.id))
        .filter(notification::Column::Kind.eq(kind))
        .count(&browser.state.db)
        .await
        .unwrap()
}

async fn follow_rows(browser: &Browser) -> u64 {
    follow::Entity::find().count(&browser.state.db).await.unwrap()
}

#[tokio::test]
async fn following_twice_keeps_one_edge_and_one_notification() {
    let (mut alice, mut bob) = pair().await;
    let next = [("next", "/users/alice01")];

    let first = bob.submit("/users/alice01", "/users/alice01/follow", &next).await;
    assert_eq!(first.location.as_deref(), Some("/users/alice01"));
    bob.submit("/users/alice01", "/users/alice01/follow", &next).await;

    assert_eq!(follow_rows(&bob).await, 1);
    assert_eq!(notifications_of(&bob, "alice01", notification::KIND_FOLLOW).await, 1);

    let inbox = alice.get("/notifications").await;
    assert!(inbox.body.contains("followed you."));
    assert!(inbox.body.contains("unread"));
    let reopened = alice.get("/notifications").await;
    assert!(!reopened.body.contains(" unread"));
}

#[tokio::test]
async fn unfollow_notifies_only_when_an_edge_was_removed() {
    let (_alice, mut bob) = pair().await;
    let next = [("next", "/users/alice01")];

    bob.submit("/users/alice01", "/users/alice01/follow", &next).await;
    bob.submit("/users/alice01", "/users/alice01/unfollow", &next).await;
    bob.submit("/users/alice01", "/users/alice01/unfollow", &next).await;

    assert_eq!(follow_rows(&bob).await, 0);
    assert_eq!(notifications_of(&bob, "alice01", notification::KIND_UNFOLLOW).await, 1);
}

#[tokio::test]
async fn following_yourself_is_refused() {
    let mut alice = Browser::new().await;
    alice.register("alice01", "alice@example.com").await;

    let reply = alice
        .submit("/users/alice01", "/users/alice01/follow", &[("next", "/search")])
        .await;
    assert_eq!(reply.location.as_deref(), Some("/users/alice01"));
    assert_eq!(follow_rows(&alice).await, 0);
    assert!(alice.get("/users/alice01").await.body.contains("You cannot follow yourself."));
}

#[tokio::test]
async fn offsite_next_falls_back_to_the_profile() {
    let (_alice, mut bob) = pair().await;
    let reply = bob
        .submit(
            "/users/alice01",
            "/users/alice01/follow",
            &[("next", "https://evil.example/")],
        )
        .await;
    assert_eq!(reply.location.as_deref(), Some("/users/alice01"));
}

#[tokio::test]
async fn public_profiles_accept_messages_from_anyone_signed_in() {
    let (_alice, mut bob) = pair().await;

    let page = bob.get("/users/alice01").await;
    assert!(page.body.contains("/users/alice01/message"));

    bob.submit(
        "/users/alice01",
        "/users/alice01/message",
        &[("message", "  Hello neighbour  ")],
    )
    .await;
    assert!(bob.get("/users/alice01").await.body.contains("Message sent."));

    let stored = message::Entity::find()
        .all(&bob.state.db)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].body, "Hello neighbour");
}

#[tokio::test]
async fn private_profiles_hide_connections_and_require_mutual_follow_to_message() {
    let (mut alice, mut bob) = pair().await;
    let saved = alice
        .submit("/profile/edit", "/profile/edit", &[("privacy", "private")])
        .await;
    assert_eq!(saved.location.as_deref(), Some("/profile"));
    assert_eq!(find_user(&alice.state, "alice01").await.privacy, "private");

    let list = bob.get("/users/alice01/followers").await;
    assert_eq!(list.status, StatusCode::SEE_OTHER);
    assert_eq!(list.location.as_deref(), Some("/users/alice01"));
    let profile = bob.get("/users/alice01").await;
    assert!(profile.body.contains("Followers list is private."));
    assert!(!profile.body.contains("/users/alice01/message"));

    bob.submit(
        "/users/alice01",
        "/users/alice01/message",
        &[("message", "hi")],
    )
    .await;
    let refused = bob.get("/users/alice01").await;
    assert!(refused.body.contains("You can only message mutual followers for private profiles."));

    // mutual follow unlocks messaging
    bob.submit("/users/alice01", "/users/alice01/follow", &[("next", "/users/alice01")])
        .await;
    alice
        .submit("/users/bob_02", "/users/bob_02/follow", &[("next", "/users/bob_02")])
        .await;
    bob.submit(
        "/users/alice01",
        "/users/alice01/message",
        &[("message", "hi again")],
    )
    .await;
    assert!(bob.get("/users/alice01").await.body.contains("Message sent."));
}

#[tokio::test]
async fn owners_always_see_their_own_connections() {
    let (mut alice, _bob) = pair().await;
    alice
        .submit("/profile/edit", "/profile/edit", &[("privacy", "private")])
        .await;
    let own = alice.get("/users/alice01/following").await;
    assert_eq!(own.status, StatusCode::OK);
    assert!(own.body.contains("Following"));
}

#[tokio::test]
async fn search_marks_the_viewer_and_offers_follow_for_others() {
    let (mut alice, _bob) = pair().await;

    let results = alice.get("/search?q=0").await;
    assert_eq!(results.status, StatusCode::OK);
    assert!(results.body.contains("/users/bob_02/follow"));
    assert!(results.body.contains(r#"<span class="tag">you</span>"#));

    let empty = alice.get("/search?q=zzz").await;
    assert!(empty.body.contains("No users matched"));
}

#[tokio::test]
async fn unknown_profiles_are_not_found() {
    let (_alice, mut bob) = pair().await;
    let reply = bob.get("/users/nobody_here").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

const OVER_LIMIT: usize = 3 * 1024 * 1024;

async fn assert_bounced_back_to_edit(alice: &mut Browser, request: Request<Body>) {
    let reply = alice.send(request).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/profile/edit"));

    let page = alice.get("/profile/edit").await;
    assert!(page.body.contains("File too large. Please upload an image under 2MB."));
}

#[tokio::test]
async fn oversized_urlencoded_profile_update_redirects_with_notice() {
    let mut alice = Browser::new().await;
    alice.register("alice01", "alice@example.com").await;
    let token = csrf_token(&alice.get("/profile/edit").await.body);

    let body = format!("csrf_token={token}&bio={}", "a".repeat(OVER_LIMIT));
    let request = Request::builder()
        .method("POST")
        .uri("/profile/edit")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::REFERER, "/profile/edit")
        .body(Body::from(body))
        .unwrap();
    assert_bounced_back_to_edit(&mut alice, request).await;
}

#[tokio::test]
async fn oversized_picture_upload_redirects_with_notice() {
    let mut alice = Browser::new().await;
    alice.register("alice01", "alice@example.com").await;
    let token = csrf_token(&alice.get("/profile/edit").await.body);

    let boundary = "kampongboundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"csrf_token\"\r\n\r\n{token}\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"profile_picture\"; \
         filename=\"big.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend(std::iter::repeat_n(0u8, OVER_LIMIT));
    body.extend(format!("\r\n--{boundary}--\r\n").into_bytes());

    // no Referer: the redirect falls back to the edit page
    let request = Request::builder()
        .method("POST")
        .uri("/profile/edit")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    assert_bounced_back_to_edit(&mut alice, request).await;
    let stored = find_user(&alice.state, "alice01").await;
    assert_eq!(stored.profile_picture_url.as_deref(), Some("img/default_avatar.svg"));
}
