//! End-to-end: dev backend, HTTP load, push channel and session together.

use postwall::config::ApiConfig;
use postwall::{
    build_router, AppState, Comment, EventKind, FeedSession, Post, PostList, PostSource,
    PostsClient, WsChannel,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

async fn start_backend(posts: Vec<Post>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(AppState::new(posts));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn fixture() -> Vec<Post> {
    vec![
        Post::new("p1")
            .caption("first")
            .counts(2, 1)
            .comment(Comment::new("c0", "hello", "ann")),
        Post::new("p2").caption("second"),
    ]
}

fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    }
}

async fn publish(base_url: &str, body: Value) -> reqwest::StatusCode {
    reqwest::Client::new()
        .post(format!("{}/events", base_url))
        .json(&body)
        .send()
        .await
        .unwrap()
        .status()
}

async fn wait_for<F>(updates: &mut watch::Receiver<PostList>, condition: F) -> PostList
where
    F: Fn(&PostList) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let posts = updates.borrow_and_update();
                if condition(&posts) {
                    return posts.clone();
                }
            }
            updates.changed().await.unwrap();
        }
    })
    .await
    .expect("condition not reached in time")
}

#[tokio::test]
async fn test_get_posts_over_http() {
    let base_url = start_backend(fixture()).await;
    let client = PostsClient::new(&api_config(&base_url)).unwrap();

    let posts = client.fetch_posts().await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "p1");
    assert_eq!(posts[0].comments[0].id, "c0");
    assert!(!posts[0].ai_reply);
}

#[tokio::test]
async fn test_session_follows_published_events() {
    let base_url = start_backend(fixture()).await;
    let live_url = format!("{}/ws", base_url.replacen("http://", "ws://", 1));

    let source = Arc::new(PostsClient::new(&api_config(&base_url)).unwrap());
    let channel = WsChannel::connect(&live_url, &EventKind::ALL).await.unwrap();
    assert!(channel.connection_id().is_some());

    let session = FeedSession::mount(source, channel);
    let mut updates = session.watch();

    let loaded = wait_for(&mut updates, |posts| posts.len() == 2).await;
    assert_eq!(loaded[0].likes, 2);

    let status = publish(
        &base_url,
        json!({
            "event": "comment",
            "data": {
                "postId": "p1",
                "verb": "add",
                "comment": {"id": "c1", "text": "nice", "username": "bo"}
            }
        }),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::ACCEPTED);

    let posts = wait_for(&mut updates, |posts| {
        posts.first().map(|p| p.has_comment("c1")).unwrap_or(false)
    })
    .await;
    assert_eq!(posts[0].comments[0].id, "c1");
    assert_eq!(posts[0].comments_count, 2);
    assert_eq!(posts[0].likes, 2);

    session.toggle_ai_reply("p1");
    wait_for(&mut updates, |posts| posts[0].ai_reply).await;

    let status = publish(
        &base_url,
        json!({"event": "post_removed", "data": {"postId": "p2"}}),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::ACCEPTED);

    let posts = wait_for(&mut updates, |posts| posts.len() == 1).await;
    assert_eq!(posts[0].id, "p1");
    assert!(posts[0].ai_reply);
    assert_eq!(posts[0].comments_count, 2);

    session.unmount().await;
}

#[tokio::test]
async fn test_malformed_publish_is_rejected() {
    let base_url = start_backend(fixture()).await;

    let status = publish(
        &base_url,
        json!({"event": "engagement", "data": {"postId": "p1", "likes": "many"}}),
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);

    let client = PostsClient::new(&api_config(&base_url)).unwrap();
    let posts = client.fetch_posts().await.unwrap();
    assert_eq!(posts[0].likes, 2);
}
