// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use folio::{
    comments::DeletePolicy,
    config::Config,
    error::AppError,
    mailer::{Email, Mailer},
    models::user::{NewUser, Role},
    routes,
    state::AppState,
    store::{MemoryRepository, Repository},
    utils::hash::hash_password,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Captures outgoing mail instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Email>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub repo: Arc<MemoryRepository>,
    pub mailer: Arc<RecordingMailer>,
    pub client: reqwest::Client,
}

pub fn test_config(policy: DeletePolicy) -> Config {
    Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        admin_name: "Admin".to_string(),
        comment_delete_policy: policy,
        upload_dir: std::env::temp_dir().join(format!("folio-test-{}", uuid::Uuid::new_v4())),
        max_upload_bytes: 1024,
        resend_api_key: None,
        contact_from: "Portfolio <site@example.com>".to_string(),
        contact_to: Some("owner@example.com".to_string()),
    }
}

/// Spawns the app on a random port backed by a fresh in-memory repository
/// holding one admin account.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(DeletePolicy::Cascade).await
}

pub async fn spawn_app_with(policy: DeletePolicy) -> TestApp {
    let config = test_config(policy);
    let repo = Arc::new(MemoryRepository::new());
    repo.create_user(NewUser {
        email: ADMIN_EMAIL.to_string(),
        name: "Admin".to_string(),
        password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
        role: Role::Admin,
        image: None,
    })
    .await
    .unwrap();

    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(repo.clone(), config, mailer.clone());
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        repo,
        mailer,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a fresh account and returns `(user_id, token)`.
    pub async fn register_and_login(&self, name: &str) -> (i64, String) {
        let email = format!("{}-{}@example.com", name, &uuid::Uuid::new_v4().to_string()[..8]);
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "name": name,
                "password": "password123"
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        self.login(&email, "password123").await
    }

    pub async fn login(&self, email: &str, password: &str) -> (i64, String) {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);

        let body: serde_json::Value = response.json().await.unwrap();
        let id = body["user"]["id"].as_i64().unwrap();
        let token = body["token"].as_str().unwrap().to_string();
        (id, token)
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.1
    }

    /// Creates a published post as admin and returns its id.
    pub async fn create_published_post(&self, title: &str) -> i64 {
        let token = self.admin_token().await;
        let response = self
            .client
            .post(self.url("/api/admin/posts"))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "title": title,
                "content": "<p>Body</p>",
                "published": true
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: serde_json::Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    /// Posts a comment and returns its id.
    pub async fn comment(&self, token: &str, post_id: i64, text: &str, parent_id: Option<i64>) -> i64 {
        let response = self
            .client
            .post(self.url(&format!("/api/posts/{}/comments", post_id)))
            .bearer_auth(token)
            .json(&serde_json::json!({ "text": text, "parent_id": parent_id }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: serde_json::Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }
}
