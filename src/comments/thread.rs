// src/comments/thread.rs

// Client-resident comment section for one post. The forest changes only after
// the API call has succeeded, so a failed request leaves the view as it was.

use async_trait::async_trait;
use validator::Validate;

use super::{
    permission::can_modify_comment,
    policy::DeletePolicy,
    tree::CommentForest,
};
use crate::{
    error::AppError,
    models::{
        comment::{Comment, CreateCommentRequest, UpdateCommentRequest},
        user::Principal,
    },
};

/// Remote comment store as seen from the client.
#[async_trait]
pub trait CommentApi: Send + Sync {
    async fn list(&self, post_id: i64) -> Result<Vec<Comment>, AppError>;
    async fn create(
        &self,
        post_id: i64,
        payload: &CreateCommentRequest,
    ) -> Result<Comment, AppError>;
    async fn update(
        &self,
        comment_id: i64,
        payload: &UpdateCommentRequest,
    ) -> Result<Comment, AppError>;
    async fn delete(&self, comment_id: i64) -> Result<(), AppError>;
}

#[async_trait]
impl<'a, T: CommentApi + ?Sized> CommentApi for &'a T {
    async fn list(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        (**self).list(post_id).await
    }

    async fn create(
        &self,
        post_id: i64,
        payload: &CreateCommentRequest,
    ) -> Result<Comment, AppError> {
        (**self).create(post_id, payload).await
    }

    async fn update(
        &self,
        comment_id: i64,
        payload: &UpdateCommentRequest,
    ) -> Result<Comment, AppError> {
        (**self).update(comment_id, payload).await
    }

    async fn delete(&self, comment_id: i64) -> Result<(), AppError> {
        (**self).delete(comment_id).await
    }
}

pub struct CommentThread<A> {
    api: A,
    post_id: i64,
    principal: Option<Principal>,
    policy: DeletePolicy,
    forest: CommentForest,
}

impl<A: CommentApi> CommentThread<A> {
    pub fn new(api: A, post_id: i64, principal: Option<Principal>) -> Self {
        Self {
            api,
            post_id,
            principal,
            policy: DeletePolicy::default(),
            forest: CommentForest::default(),
        }
    }

    /// Must match the server's configured policy for the local view to
    /// agree with a reload.
    pub fn with_policy(mut self, policy: DeletePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn forest(&self) -> &CommentForest {
        &self.forest
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Fetches the full comment set and rebuilds the view.
    pub async fn load(&mut self) -> Result<&CommentForest, AppError> {
        let comments = self.api.list(self.post_id).await.map_err(|e| {
            tracing::warn!(post_id = self.post_id, "failed to load comments: {}", e);
            e
        })?;
        let mut forest = CommentForest::build(comments);
        forest.sort_for_display();
        self.forest = forest;
        Ok(&self.forest)
    }

    /// Whether edit/delete controls should be offered for this comment.
    pub fn can_modify(&self, comment_id: i64) -> bool {
        self.forest
            .find(comment_id)
            .is_some_and(|node| can_modify_comment(self.principal.as_ref(), &node.comment))
    }

    /// Posts a root comment or a reply and splices it into the view.
    pub async fn submit(
        &mut self,
        text: &str,
        parent_id: Option<i64>,
    ) -> Result<Comment, AppError> {
        let payload = CreateCommentRequest {
            text: text.to_string(),
            parent_id,
        };
        payload.validate()?;
        if self.principal.is_none() {
            return Err(AppError::AuthError(
                "You need to be signed in to comment".to_string(),
            ));
        }

        let created = self
            .api
            .create(self.post_id, &payload)
            .await
            .map_err(|e| {
                tracing::warn!(
                    post_id = self.post_id,
                    ?parent_id,
                    "failed to submit comment: {}",
                    e
                );
                e
            })?;
        self.forest.insert(created.clone());
        Ok(created)
    }

    /// Replaces the text of a comment the principal may modify.
    pub async fn edit(&mut self, comment_id: i64, text: &str) -> Result<Comment, AppError> {
        let payload = UpdateCommentRequest {
            text: text.to_string(),
        };
        payload.validate()?;
        self.ensure_can_modify(comment_id)?;

        let updated = self.api.update(comment_id, &payload).await.map_err(|e| {
            tracing::warn!(post_id = self.post_id, comment_id, "failed to edit comment: {}", e);
            e
        })?;
        self.forest.replace(updated.clone());
        Ok(updated)
    }

    /// Deletes a comment and mirrors the delete policy locally.
    pub async fn delete(&mut self, comment_id: i64) -> Result<(), AppError> {
        self.ensure_can_modify(comment_id)?;

        self.api.delete(comment_id).await.map_err(|e| {
            tracing::warn!(post_id = self.post_id, comment_id, "failed to delete comment: {}", e);
            e
        })?;
        let removed = self.policy.apply(&mut self.forest, comment_id);
        tracing::debug!(comment_id, removed, "comment removed from view");
        Ok(())
    }

    fn ensure_can_modify(&self, comment_id: i64) -> Result<(), AppError> {
        let node = self
            .forest
            .find(comment_id)
            .ok_or(AppError::NotFound("Comment not found".to_string()))?;
        if !can_modify_comment(self.principal.as_ref(), &node.comment) {
            return Err(AppError::Forbidden(
                "You are not allowed to change this comment".to_string(),
            ));
        }
        Ok(())
    }
}
