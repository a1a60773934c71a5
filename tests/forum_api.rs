// tests/forum_api.rs
mod common;

use axum::http::StatusCode;
use forum_web::store::ForumStore;
use serde_json::json;

use common::helpers::{create_test_app, create_test_forum, create_test_user, send, subscribe};

#[tokio::test]
async fn test_create_forum_subscribes_creator() {
    let app = create_test_app();
    let (alice, token) = create_test_user(&app, "alice").await;

    let forum = create_test_forum(&app, &token, "golang").await;
    assert_eq!(forum.name, "golang");
    assert_eq!(forum.creator_id, Some(alice.id));

    assert_eq!(app.store.count_subscribers(forum.id).await.unwrap(), 1);
    assert!(
        app.store
            .find_subscription(alice.id, forum.id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_create_forum_conflicts_and_validation() {
    let app = create_test_app();
    let (_, alice) = create_test_user(&app, "alice").await;
    let (_, bob) = create_test_user(&app, "bob").await;
    create_test_forum(&app, &alice, "golang").await;

    let (status, body) = send(&app, "POST", "/api/forum", Some(&bob), Some(json!({ "name": "golang" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Forum already exists");

    let (status, _) = send(&app, "POST", "/api/forum", Some(&bob), Some(json!({ "name": "go" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/forum", Some(&bob), Some(json!({ "name": "go lang" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/forum", None, Some(json!({ "name": "rustlang" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_subscription_lifecycle() {
    let app = create_test_app();
    let (_, alice) = create_test_user(&app, "alice").await;
    let (bob, bob_token) = create_test_user(&app, "bob").await;
    let forum = create_test_forum(&app, &alice, "golang").await;

    subscribe(&app, &bob_token, forum.id).await;
    assert_eq!(app.store.count_subscribers(forum.id).await.unwrap(), 2);

    let (status, body) = send(
        &app,
        "POST",
        "/api/forum/subscribe",
        Some(&bob_token),
        Some(json!({ "forumId": forum.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You are already subscribed to this forum");

    let (status, body) = send(
        &app,
        "POST",
        "/api/forum/unsubscribe",
        Some(&bob_token),
        Some(json!({ "forumId": forum.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["forumId"], forum.id.to_string());
    assert!(
        app.store
            .find_subscription(bob.id, forum.id)
            .await
            .unwrap()
            .is_none()
    );

    let (status, _) = send(
        &app,
        "POST",
        "/api/forum/unsubscribe",
        Some(&bob_token),
        Some(json!({ "forumId": forum.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_creator_cannot_leave_and_unknown_forum_is_404() {
    let app = create_test_app();
    let (_, alice) = create_test_user(&app, "alice").await;
    let forum = create_test_forum(&app, &alice, "golang").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/forum/unsubscribe",
        Some(&alice),
        Some(json!({ "forumId": forum.id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You cannot unsubscribe from your own forum");

    let (status, body) = send(
        &app,
        "POST",
        "/api/forum/subscribe",
        Some(&alice),
        Some(json!({ "forumId": uuid::Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Forum not found");
}

#[tokio::test]
async fn test_top_communities_ranked_by_members() {
    let app = create_test_app();
    let (_, alice) = create_test_user(&app, "alice").await;
    let (_, bob) = create_test_user(&app, "bob").await;
    let (_, carol) = create_test_user(&app, "carol").await;

    create_test_forum(&app, &alice, "quiet").await;
    let busy = create_test_forum(&app, &alice, "busy").await;
    let middle = create_test_forum(&app, &alice, "middle").await;
    subscribe(&app, &bob, busy.id).await;
    subscribe(&app, &carol, busy.id).await;
    subscribe(&app, &bob, middle.id).await;

    let (status, body) = send(&app, "GET", "/api/forums/top", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "forumName": "busy", "memberCount": 3 },
            { "forumName": "middle", "memberCount": 2 },
            { "forumName": "quiet", "memberCount": 1 }
        ])
    );
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
