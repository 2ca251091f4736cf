// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::Repository;
use crate::{
    comments::DeletePolicy,
    error::AppError,
    models::{
        comment::{Comment, CommentAuthor, NewComment},
        post::{NewPost, Post, PostSummary, UpdatePostRequest},
        user::{NewUser, User},
    },
};

const POST_COLUMNS: &str = r#"
    p.id, p.slug, p.title, p.content, p.image_url, p.published,
    p.author_id, u.name AS author_name, p.created_at, p.updated_at
"#;

const COMMENT_COLUMNS: &str = r#"
    c.id, c.post_id, c.text, c.is_pinned, c.parent_id, c.created_at, c.updated_at,
    u.id AS author_id, u.name AS author_name, u.image AS author_image, u.role AS author_role
"#;

/// Row shape of 'users'. `role` is stored as text.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    email: String,
    name: String,
    password: String,
    role: String,
    image: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            password: row.password,
            role: row.role.parse().unwrap_or_default(),
            image: row.image,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    slug: String,
    title: String,
    content: String,
    image_url: Option<String>,
    published: bool,
    author_id: i64,
    author_name: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            content: row.content,
            image_url: row.image_url,
            published: row.published,
            author_id: row.author_id,
            author_name: row.author_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A comment joined with its author.
#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    text: String,
    is_pinned: bool,
    parent_id: Option<i64>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    author_id: i64,
    author_name: String,
    author_image: Option<String>,
    author_role: String,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            text: row.text,
            is_pinned: row.is_pinned,
            parent_id: row.parent_id,
            author: CommentAuthor {
                id: row.author_id,
                name: row.author_name,
                image: row.author_image,
                role: row.author_role.parse().unwrap_or_default(),
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres-backed repository. Queries are checked at runtime so the crate
/// builds without a live database.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn select_posts(tail: &str) -> String {
    format!(
        "SELECT {} FROM posts p JOIN users u ON u.id = p.author_id {}",
        POST_COLUMNS, tail
    )
}

fn select_comments(tail: &str) -> String {
    format!(
        "SELECT {} FROM comments c JOIN users u ON u.id = c.author_id {}",
        COMMENT_COLUMNS, tail
    )
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, name, password, role, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, name, password, role, image, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Email '{}' is already in use", user.email))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })?;

        Ok(row.into())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, password, role, image, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, name, password, role, image, created_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn list_posts(&self, include_drafts: bool) -> Result<Vec<PostSummary>, AppError> {
        let rows = sqlx::query_as::<_, PostRow>(&select_posts(
            "WHERE ($1 OR p.published) ORDER BY p.created_at DESC, p.id DESC",
        ))
        .bind(include_drafts)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list posts: {:?}", e);
            AppError::from(e)
        })?;

        Ok(rows
            .into_iter()
            .map(|row| PostSummary::from(&Post::from(row)))
            .collect())
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let row = sqlx::query_as::<_, PostRow>(&select_posts("WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError> {
        let row = sqlx::query_as::<_, PostRow>(&select_posts("WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Post::from))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO posts (slug, title, content, image_url, published, author_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(post.published)
        .bind(post.author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("A post with slug '{}' already exists", post.slug))
            } else {
                tracing::error!("Failed to create post: {:?}", e);
                AppError::from(e)
            }
        })?;

        self.find_post(id)
            .await?
            .ok_or_else(|| AppError::InternalServerError("Created post vanished".to_string()))
    }

    async fn update_post(
        &self,
        id: i64,
        changes: UpdatePostRequest,
    ) -> Result<Option<Post>, AppError> {
        if changes.is_empty() {
            return self.find_post(id).await;
        }

        let conflicting_slug = changes.slug.clone();

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE posts SET ");
        let mut separated = builder.separated(", ");

        if let Some(title) = changes.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }

        if let Some(slug) = changes.slug {
            separated.push("slug = ");
            separated.push_bind_unseparated(slug);
        }

        if let Some(content) = changes.content {
            separated.push("content = ");
            separated.push_bind_unseparated(content);
        }

        if let Some(image_url) = changes.image_url {
            separated.push("image_url = ");
            separated.push_bind_unseparated(image_url);
        }

        if let Some(published) = changes.published {
            separated.push("published = ");
            separated.push_bind_unseparated(published);
        }

        separated.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&self.pool).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!(
                    "A post with slug '{}' already exists",
                    conflicting_slug.unwrap_or_default()
                ))
            } else {
                tracing::error!("Failed to update post: {:?}", e);
                AppError::from(e)
            }
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_post(id).await
    }

    async fn delete_post(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete post: {:?}", e);
                AppError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let rows = sqlx::query_as::<_, CommentRow>(&select_comments(
            "WHERE c.post_id = $1 ORDER BY c.is_pinned DESC, c.created_at ASC, c.id ASC",
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let row = sqlx::query_as::<_, CommentRow>(&select_comments("WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Comment::from))
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO comments (post_id, author_id, text, parent_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .bind(comment.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound("Parent comment not found".to_string())
            } else {
                tracing::error!("Failed to create comment: {:?}", e);
                AppError::from(e)
            }
        })?;

        self.find_comment(id)
            .await?
            .ok_or_else(|| AppError::InternalServerError("Created comment vanished".to_string()))
    }

    async fn update_comment_text(
        &self,
        id: i64,
        text: &str,
    ) -> Result<Option<Comment>, AppError> {
        let result = sqlx::query("UPDATE comments SET text = $1, updated_at = NOW() WHERE id = $2")
            .bind(text)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_comment(id).await
    }

    async fn set_comment_pinned(
        &self,
        id: i64,
        pinned: bool,
    ) -> Result<Option<Comment>, AppError> {
        let result = sqlx::query("UPDATE comments SET is_pinned = $1 WHERE id = $2")
            .bind(pinned)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_comment(id).await
    }

    async fn delete_comment_with(
        &self,
        id: i64,
        policy: DeletePolicy,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            tracing::error!("Failed to begin transaction: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        // Concurrent replies wait on their foreign-key check until commit.
        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM comments WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(false);
        }

        match policy {
            DeletePolicy::Cascade => {}
            DeletePolicy::PromoteToRoot => {
                let promoted =
                    sqlx::query("UPDATE comments SET parent_id = NULL WHERE parent_id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected();
                tracing::debug!(comment_id = id, promoted, "replies promoted to root");
            }
            DeletePolicy::ForbidIfReplies => {
                let replies: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE parent_id = $1")
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await?;
                if replies > 0 {
                    return Err(AppError::Conflict(
                        "Comment has replies and cannot be deleted".to_string(),
                    ));
                }
            }
        }

        // Replies still pointing at this row go with it (ON DELETE CASCADE).
        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete comment: {:?}", e);
                AppError::from(e)
            })?;

        tx.commit()
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(true)
    }
}
