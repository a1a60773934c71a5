// tests/comment_api.rs
mod common;

use axum::http::StatusCode;
use forum_web::store::ForumStore;
use serde_json::json;

use common::helpers::{create_test_app, create_test_forum, create_test_post, create_test_user, send};

#[tokio::test]
async fn test_comments_thread_two_levels_deep() {
    let app = create_test_app();
    let (_, alice) = create_test_user(&app, "alice").await;
    let (_, bob) = create_test_user(&app, "bob").await;
    let forum = create_test_forum(&app, &alice, "golang").await;
    let post = create_test_post(&app, &alice, forum.id, "Hello").await;

    let (status, top) = send(
        &app,
        "POST",
        "/api/forum/post/comment",
        Some(&bob),
        Some(json!({ "postId": post.id, "text": "  First!  " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(top["text"], "First!");
    assert!(top["replyToId"].is_null());

    let (status, reply) = send(
        &app,
        "POST",
        "/api/forum/post/comment",
        Some(&alice),
        Some(json!({ "postId": post.id, "text": "Welcome", "replyToId": top["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["replyToId"], top["id"]);

    let (status, body) = send(
        &app,
        "POST",
        "/api/forum/post/comment",
        Some(&bob),
        Some(json!({ "postId": post.id, "text": "Thanks", "replyToId": reply["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot reply to a reply");

    let threads = app.store.list_comment_threads(post.id).await.unwrap();
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].replies.len(), 1);
    assert_eq!(threads[0].replies[0].comment.text, "Welcome");
}

#[tokio::test]
async fn test_comment_rejections() {
    let app = create_test_app();
    let (_, alice) = create_test_user(&app, "alice").await;
    let forum = create_test_forum(&app, &alice, "golang").await;
    let post = create_test_post(&app, &alice, forum.id, "Hello").await;
    let other = create_test_post(&app, &alice, forum.id, "Other").await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/forum/post/comment",
        None,
        Some(json!({ "postId": post.id, "text": "anonymous" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/forum/post/comment",
        Some(&alice),
        Some(json!({ "postId": uuid::Uuid::new_v4(), "text": "lost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Post not found");

    let (status, _) = send(
        &app,
        "POST",
        "/api/forum/post/comment",
        Some(&alice),
        Some(json!({ "postId": post.id, "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, parent) = send(
        &app,
        "POST",
        "/api/forum/post/comment",
        Some(&alice),
        Some(json!({ "postId": other.id, "text": "elsewhere" })),
    )
    .await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/forum/post/comment",
        Some(&alice),
        Some(json!({ "postId": post.id, "text": "crossed", "replyToId": parent["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Reply must belong to the same post");
}
