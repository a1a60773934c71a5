// tests/client_flow.rs
//! Drives the typed client against a real listener backed by the memory store.
mod common;

use forum_web::{
    client::{
        ClientError, FeedParams, ForumClient, PostFeed, SubmitOutcome, VoteFeedback, VoteWidget,
        submit_post,
    },
    models::{CreatePostRequest, FeedScope, VoteTarget, VoteType},
};
use tokio::net::TcpListener;

use common::helpers::{TestApp, create_test_app, create_test_forum, create_test_post, create_test_user};

async fn serve(app: &TestApp) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_infinite_scroll_appends_until_exhausted() {
    let app = create_test_app();
    let (_, token) = create_test_user(&app, "alice").await;
    let forum = create_test_forum(&app, &token, "golang").await;
    for i in 1..=15 {
        create_test_post(&app, &token, forum.id, &format!("Post number {i}")).await;
    }
    let client = ForumClient::new(serve(&app).await);

    let initial = client
        .get_posts(&FeedParams {
            limit: 10,
            page: 1,
            forum_name: Some("golang".to_string()),
            tag: None,
            feed: None,
        })
        .await
        .unwrap();
    assert_eq!(initial.len(), 10);

    let mut feed = PostFeed::new(initial, Some("golang".to_string()), None, 10);
    assert_eq!(feed.load_more(&client).await.unwrap(), 5);
    assert_eq!(feed.posts().len(), 15);
    assert_eq!(feed.posts()[14].post.title, "Post number 1");
    assert!(!feed.is_exhausted());

    assert_eq!(feed.load_more(&client).await.unwrap(), 0);
    assert!(feed.is_exhausted());
    assert_eq!(feed.load_more(&client).await.unwrap(), 0);

    let err = client
        .get_posts(&FeedParams {
            limit: 10,
            page: 1,
            forum_name: Some("nope".to_string()),
            tag: None,
            feed: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_vote_widget_commits_and_matches_server() {
    let app = create_test_app();
    let (_, token) = create_test_user(&app, "alice").await;
    let forum = create_test_forum(&app, &token, "golang").await;
    let post = create_test_post(&app, &token, forum.id, "Hello").await;
    let base_url = serve(&app).await;
    let client = ForumClient::new(&base_url).with_token(&token);

    let mut widget = VoteWidget::new(VoteTarget::Post(post.id), 0, None);

    assert_eq!(widget.vote_with(&client, VoteType::Up).await, VoteFeedback::Committed);
    assert_eq!(widget.state().score, 1);
    assert_eq!(widget.vote_with(&client, VoteType::Up).await, VoteFeedback::Committed);
    assert_eq!(widget.state().score, 0);
    assert_eq!(widget.vote_with(&client, VoteType::Down).await, VoteFeedback::Committed);
    assert_eq!(widget.state().score, -1);
    assert_eq!(widget.state().current_vote, Some(VoteType::Down));

    let server = client.vote_post(post.id, VoteType::Down).await.unwrap();
    assert_eq!(server.votes_amount, 0);
}

#[tokio::test]
async fn test_vote_widget_rolls_back_when_signed_out() {
    let app = create_test_app();
    let (_, token) = create_test_user(&app, "alice").await;
    let forum = create_test_forum(&app, &token, "golang").await;
    let post = create_test_post(&app, &token, forum.id, "Hello").await;
    let client = ForumClient::new(serve(&app).await);

    let mut widget = VoteWidget::new(VoteTarget::Post(post.id), 4, None);
    let feedback = widget.vote_with(&client, VoteType::Up).await;

    assert!(matches!(feedback, VoteFeedback::SignInRequired { .. }));
    assert_eq!(widget.state().score, 4);
    assert_eq!(widget.state().current_vote, None);
}

#[tokio::test]
async fn test_submit_post_outcomes() {
    let app = create_test_app();
    let (_, alice) = create_test_user(&app, "alice").await;
    let (_, bob) = create_test_user(&app, "bob").await;
    let forum = create_test_forum(&app, &alice, "golang").await;
    let base_url = serve(&app).await;

    let request = CreatePostRequest {
        title: "From the editor".to_string(),
        content: None,
        forum_id: forum.id,
        tags: Some(vec!["rust".to_string()]),
    };

    let outcome =
        submit_post(&ForumClient::new(&base_url).with_token(&alice), "golang", &request).await;
    assert!(outcome.is_done());
    match outcome {
        SubmitOutcome::Done { value, redirect, .. } => {
            assert_eq!(value.title, "From the editor");
            assert_eq!(redirect.as_deref(), Some("/d/golang"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let outcome =
        submit_post(&ForumClient::new(&base_url).with_token(&bob), "golang", &request).await;
    assert!(!outcome.is_done());
    match outcome {
        SubmitOutcome::Failed(notice) => {
            assert_eq!(notice.title.as_deref(), Some("You are not subscribed to this community"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    match submit_post(&ForumClient::new(&base_url), "golang", &request).await {
        SubmitOutcome::SignInRequired { redirect } => {
            assert_eq!(redirect, "/signin?unauthorized=1");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_vote_widget_seeds_from_feed_post() {
    let app = create_test_app();
    let (alice, alice_token) = create_test_user(&app, "alice").await;
    let (_, bob_token) = create_test_user(&app, "bob").await;
    let forum = create_test_forum(&app, &alice_token, "golang").await;
    let post = create_test_post(&app, &alice_token, forum.id, "Hello").await;
    let base_url = serve(&app).await;

    let alice_client = ForumClient::new(&base_url).with_token(&alice_token);
    let bob_client = ForumClient::new(&base_url).with_token(&bob_token);
    bob_client.vote_post(post.id, VoteType::Up).await.unwrap();
    alice_client.vote_post(post.id, VoteType::Down).await.unwrap();

    let params = FeedParams {
        limit: 10,
        page: 1,
        forum_name: None,
        tag: None,
        feed: None,
    };
    let posts = alice_client.get_posts(&params).await.unwrap();
    let mut widget = VoteWidget::from_feed_post(&posts[0], Some(alice.id));

    assert_eq!(widget.target(), VoteTarget::Post(post.id));
    assert_eq!(widget.state().score, 0);
    assert_eq!(widget.state().current_vote, Some(VoteType::Down));

    // Switching sides moves the score by two.
    assert_eq!(
        widget.vote_with(&alice_client, VoteType::Up).await,
        VoteFeedback::Committed
    );
    assert_eq!(widget.state().score, 2);

    let anonymous = VoteWidget::from_feed_post(&posts[0], None);
    assert_eq!(anonymous.state().current_vote, None);
}

#[tokio::test]
async fn test_following_feed_scrolls_subscribed_forums_only() {
    let app = create_test_app();
    let (_, alice) = create_test_user(&app, "alice").await;
    let (_, bob) = create_test_user(&app, "bob").await;
    let golang = create_test_forum(&app, &alice, "golang").await;
    let rust = create_test_forum(&app, &bob, "rustlang").await;
    create_test_post(&app, &bob, rust.id, "Ownership").await;
    create_test_post(&app, &alice, golang.id, "Goroutines").await;
    create_test_post(&app, &bob, rust.id, "Lifetimes").await;

    let client = ForumClient::new(serve(&app).await).with_token(&bob);
    let initial = client
        .get_posts(&FeedParams {
            limit: 1,
            page: 1,
            forum_name: None,
            tag: None,
            feed: Some(FeedScope::Following),
        })
        .await
        .unwrap();

    let mut feed = PostFeed::new(initial, None, None, 1).following();
    assert_eq!(feed.params().feed, Some(FeedScope::Following));
    assert_eq!(feed.load_more(&client).await.unwrap(), 1);
    assert_eq!(feed.load_more(&client).await.unwrap(), 0);
    assert!(feed.is_exhausted());

    let titles: Vec<&str> = feed.posts().iter().map(|p| p.post.title.as_str()).collect();
    assert_eq!(titles, ["Lifetimes", "Ownership"]);
}
