// src/client.rs

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{
    comments::CommentApi,
    error::AppError,
    models::comment::{Comment, CreateCommentRequest, UpdateCommentRequest},
};

/// `CommentApi` over this service's own HTTP surface.
#[derive(Debug, Clone)]
pub struct HttpCommentApi {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpCommentApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Sends the session token as a bearer credential on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Maps a non-success response back onto `AppError`, using the `error`
/// field of the JSON body when present.
async fn check(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    Err(AppError::from_status(status, message))
}

async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    Ok(check(response).await?.json::<T>().await?)
}

#[async_trait]
impl CommentApi for HttpCommentApi {
    async fn list(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let response = self
            .http
            .get(self.url(&format!("/api/posts/{}/comments", post_id)))
            .send()
            .await?;
        parse(response).await
    }

    async fn create(
        &self,
        post_id: i64,
        payload: &CreateCommentRequest,
    ) -> Result<Comment, AppError> {
        let request = self
            .http
            .post(self.url(&format!("/api/posts/{}/comments", post_id)))
            .json(payload);
        parse(self.authorize(request).send().await?).await
    }

    async fn update(
        &self,
        comment_id: i64,
        payload: &UpdateCommentRequest,
    ) -> Result<Comment, AppError> {
        let request = self
            .http
            .patch(self.url(&format!("/api/comments/{}", comment_id)))
            .json(payload);
        parse(self.authorize(request).send().await?).await
    }

    async fn delete(&self, comment_id: i64) -> Result<(), AppError> {
        let request = self
            .http
            .delete(self.url(&format!("/api/comments/{}", comment_id)));
        check(self.authorize(request).send().await?).await?;
        Ok(())
    }
}
