// src/store/mod.rs

// Persistence seam. Handlers and services only see `Repository`; the binary
// picks Postgres when `DATABASE_URL` is set and the in-memory implementation
// otherwise.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    comments::DeletePolicy,
    error::AppError,
    models::{
        comment::{Comment, NewComment},
        post::{NewPost, Post, PostSummary, UpdatePostRequest},
        user::{NewUser, User},
    },
};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Newest first. Drafts are only listed when `include_drafts` is set.
    async fn list_posts(&self, include_drafts: bool) -> Result<Vec<PostSummary>, AppError>;
    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError>;
    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError>;
    /// Fails with `Conflict` when the slug is taken.
    async fn create_post(&self, post: NewPost) -> Result<Post, AppError>;
    async fn update_post(
        &self,
        id: i64,
        changes: UpdatePostRequest,
    ) -> Result<Option<Post>, AppError>;
    /// Also removes the post's comments.
    async fn delete_post(&self, id: i64) -> Result<bool, AppError>;

    /// Pinned first, then oldest first, ties broken by id.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError>;
    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError>;
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, AppError>;
    async fn update_comment_text(&self, id: i64, text: &str)
    -> Result<Option<Comment>, AppError>;
    async fn set_comment_pinned(&self, id: i64, pinned: bool)
    -> Result<Option<Comment>, AppError>;
    /// Deletes the comment and settles its replies per `policy` in one atomic
    /// step: a reply arriving concurrently is either seen by the policy or
    /// rejected for lack of a parent. Returns `false` when the id is unknown.
    /// `ForbidIfReplies` fails with `Conflict` and leaves everything in place.
    async fn delete_comment_with(&self, id: i64, policy: DeletePolicy)
    -> Result<bool, AppError>;
}
