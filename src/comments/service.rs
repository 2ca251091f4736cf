// src/comments/service.rs

use std::sync::Arc;

use validator::Validate;

use super::{
    permission::{can_manage_posts, can_modify_comment},
    policy::DeletePolicy,
    tree::CommentForest,
};
use crate::{
    error::AppError,
    models::{
        comment::{Comment, CreateCommentRequest, NewComment, UpdateCommentRequest},
        user::Principal,
    },
    store::Repository,
};

/// Server-side comment store. Every mutation re-checks the permission
/// predicate against the comment as currently persisted.
#[derive(Clone)]
pub struct CommentService {
    repo: Arc<dyn Repository>,
    policy: DeletePolicy,
}

impl CommentService {
    pub fn new(repo: Arc<dyn Repository>, policy: DeletePolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> DeletePolicy {
        self.policy
    }

    async fn ensure_post(&self, post_id: i64) -> Result<(), AppError> {
        self.repo
            .find_post(post_id)
            .await?
            .ok_or(AppError::NotFound("Post not found".to_string()))?;
        Ok(())
    }

    async fn load(&self, comment_id: i64) -> Result<Comment, AppError> {
        self.repo
            .find_comment(comment_id)
            .await?
            .ok_or(AppError::NotFound("Comment not found".to_string()))
    }

    /// Flat list, pinned first then oldest first.
    pub async fn list(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        self.ensure_post(post_id).await?;
        self.repo.list_comments(post_id).await
    }

    /// Nested and display-ordered.
    pub async fn tree(&self, post_id: i64) -> Result<CommentForest, AppError> {
        let mut forest = CommentForest::build(self.list(post_id).await?);
        forest.sort_for_display();
        Ok(forest)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        post_id: i64,
        payload: CreateCommentRequest,
    ) -> Result<Comment, AppError> {
        payload
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        self.ensure_post(post_id).await?;

        if let Some(parent_id) = payload.parent_id {
            let parent = self
                .repo
                .find_comment(parent_id)
                .await?
                .filter(|parent| parent.post_id == post_id)
                .ok_or(AppError::NotFound("Parent comment not found".to_string()))?;
            tracing::debug!(parent_id = parent.id, "replying to comment");
        }

        let comment = self
            .repo
            .create_comment(NewComment {
                post_id,
                author_id: principal.id,
                text: payload.text,
                parent_id: payload.parent_id,
            })
            .await?;

        tracing::info!(
            comment_id = comment.id,
            post_id,
            author_id = principal.id,
            "comment created"
        );
        Ok(comment)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        comment_id: i64,
        payload: UpdateCommentRequest,
    ) -> Result<Comment, AppError> {
        payload
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let current = self.load(comment_id).await?;
        if !can_modify_comment(Some(principal), &current) {
            return Err(AppError::Forbidden(
                "You are not allowed to edit this comment".to_string(),
            ));
        }

        self.repo
            .update_comment_text(comment_id, &payload.text)
            .await?
            .ok_or(AppError::NotFound("Comment not found".to_string()))
    }

    pub async fn delete(&self, principal: &Principal, comment_id: i64) -> Result<(), AppError> {
        let current = self.load(comment_id).await?;
        if !can_modify_comment(Some(principal), &current) {
            return Err(AppError::Forbidden(
                "You are not allowed to delete this comment".to_string(),
            ));
        }

        let deleted = self
            .repo
            .delete_comment_with(comment_id, self.policy)
            .await
            .map_err(|e| {
                if matches!(e, AppError::Conflict(_)) {
                    tracing::debug!(comment_id, "delete refused, comment has replies");
                }
                e
            })?;
        if !deleted {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        tracing::info!(comment_id, by = principal.id, policy = %self.policy, "comment deleted");
        Ok(())
    }

    pub async fn set_pinned(
        &self,
        principal: &Principal,
        comment_id: i64,
        pinned: bool,
    ) -> Result<Comment, AppError> {
        if !can_manage_posts(Some(principal)) {
            return Err(AppError::Forbidden(
                "Only administrators can pin comments".to_string(),
            ));
        }

        self.repo
            .set_comment_pinned(comment_id, pinned)
            .await?
            .ok_or(AppError::NotFound("Comment not found".to_string()))
    }
}
