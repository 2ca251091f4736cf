// tests/thread_tests.rs

// Drives `CommentThread` through `HttpCommentApi` against a live server and
// checks that the incrementally reconciled view matches a fresh reload.

mod common;

use common::{spawn_app, spawn_app_with};
use folio::{
    client::HttpCommentApi,
    comments::{CommentForest, CommentThread, DeletePolicy},
    error::AppError,
    models::user::{Principal, Role},
};

fn principal(id: i64, name: &str, role: Role) -> Principal {
    Principal {
        id,
        name: name.to_string(),
        role,
        image: None,
    }
}

/// Loads a fresh view of the post, as a page reload would.
async fn reload(address: &str, post_id: i64) -> CommentForest {
    let mut fresh = CommentThread::new(HttpCommentApi::new(address), post_id, None);
    fresh.load().await.unwrap().clone()
}

#[tokio::test]
async fn incremental_view_matches_reload() {
    let app = spawn_app().await;
    let post_id = app.create_published_post("Threads").await;
    let (alice_id, token) = app.register_and_login("alice").await;

    let api = HttpCommentApi::new(&app.address).with_token(&token);
    let mut thread = CommentThread::new(api, post_id, Some(principal(alice_id, "alice", Role::User)));
    thread.load().await.unwrap();
    assert!(thread.forest().is_empty());

    let root = thread.submit("root", None).await.unwrap();
    let reply = thread.submit("reply", Some(root.id)).await.unwrap();
    thread.submit("deeper", Some(reply.id)).await.unwrap();
    let other = thread.submit("another root", None).await.unwrap();
    thread.edit(reply.id, "edited reply").await.unwrap();

    assert_eq!(thread.forest(), &reload(&app.address, post_id).await);
    assert_eq!(thread.forest().find(root.id).unwrap().replies[0].comment.text, "edited reply");

    thread.delete(root.id).await.unwrap();
    let after = reload(&app.address, post_id).await;
    assert_eq!(thread.forest(), &after);
    assert_eq!(after.len(), 1);
    assert!(after.find(other.id).is_some());
}

#[tokio::test]
async fn promote_policy_view_matches_reload() {
    let app = spawn_app_with(DeletePolicy::PromoteToRoot).await;
    let post_id = app.create_published_post("Promote").await;
    let (alice_id, token) = app.register_and_login("alice").await;

    let api = HttpCommentApi::new(&app.address).with_token(&token);
    let mut thread = CommentThread::new(api, post_id, Some(principal(alice_id, "alice", Role::User)))
        .with_policy(DeletePolicy::PromoteToRoot);
    thread.load().await.unwrap();

    let root = thread.submit("root", None).await.unwrap();
    let reply = thread.submit("reply", Some(root.id)).await.unwrap();

    thread.delete(root.id).await.unwrap();
    let after = reload(&app.address, post_id).await;
    assert_eq!(thread.forest(), &after);
    assert_eq!(after.roots()[0].id(), reply.id);
}

#[tokio::test]
async fn server_rejection_leaves_view_untouched() {
    let app = spawn_app().await;
    let post_id = app.create_published_post("Rejections").await;
    let (alice_id, alice) = app.register_and_login("alice").await;
    let (bob_id, bob) = app.register_and_login("bob").await;

    let root = app.comment(&alice, post_id, "alice's", None).await;

    // Bob's client believes it is Alice: the local gate passes, the server refuses
    let forged = principal(alice_id, "alice", Role::User);
    let api = HttpCommentApi::new(&app.address).with_token(&bob);
    let mut thread = CommentThread::new(api, post_id, Some(forged));
    thread.load().await.unwrap();
    let before = thread.forest().clone();

    let err = thread.edit(root, "hijacked").await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let err = thread.delete(root).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(thread.forest(), &before);

    // A signed-out client with a principal still gets a 401
    let anonymous = HttpCommentApi::new(&app.address);
    let mut thread = CommentThread::new(anonymous, post_id, Some(principal(bob_id, "bob", Role::User)));
    thread.load().await.unwrap();
    let err = thread.submit("hello", None).await.unwrap_err();
    assert!(matches!(err, AppError::AuthError(_)));
    assert_eq!(thread.forest().len(), 1);
}

#[tokio::test]
async fn missing_post_surfaces_not_found() {
    let app = spawn_app().await;
    let mut thread = CommentThread::new(HttpCommentApi::new(&app.address), 424242, None);

    let err = thread.load().await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(thread.forest().is_empty());
}
