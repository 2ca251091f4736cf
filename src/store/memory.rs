// src/store/memory.rs

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

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

#[derive(Debug, Clone)]
struct PostRecord {
    id: i64,
    slug: String,
    title: String,
    content: String,
    image_url: Option<String>,
    published: bool,
    author_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: i64,
    post_id: i64,
    author_id: i64,
    parent_id: Option<i64>,
    text: String,
    is_pinned: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, PostRecord>,
    comments: BTreeMap<i64, CommentRecord>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn post(&self, record: &PostRecord) -> Post {
        Post {
            id: record.id,
            slug: record.slug.clone(),
            title: record.title.clone(),
            content: record.content.clone(),
            image_url: record.image_url.clone(),
            published: record.published,
            author_id: record.author_id,
            author_name: self
                .users
                .get(&record.author_id)
                .map(|u| u.name.clone())
                .unwrap_or_default(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    fn comment(&self, record: &CommentRecord) -> Comment {
        let author = match self.users.get(&record.author_id) {
            Some(user) => CommentAuthor {
                id: user.id,
                name: user.name.clone(),
                image: user.image.clone(),
                role: user.role,
            },
            None => CommentAuthor {
                id: record.author_id,
                name: String::new(),
                image: None,
                role: Default::default(),
            },
        };
        Comment {
            id: record.id,
            post_id: record.post_id,
            text: record.text.clone(),
            is_pinned: record.is_pinned,
            parent_id: record.parent_id,
            author,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.posts
            .values()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    /// Ids of `root` and every comment below it.
    fn subtree(&self, root: i64) -> HashSet<i64> {
        let mut ids = HashSet::from([root]);
        let mut frontier = vec![root];
        while let Some(current) = frontier.pop() {
            for c in self.comments.values() {
                if c.parent_id == Some(current) && ids.insert(c.id) {
                    frontier.push(c.id);
                }
            }
        }
        ids
    }
}

/// Process-local repository. Backs local runs without `DATABASE_URL` and
/// the integration tests. Semantics follow the Postgres schema: unique
/// emails and slugs, cascading deletes.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already in use",
                user.email
            )));
        }

        let id = tables.next_id();
        let created = User {
            id,
            email: user.email,
            name: user.name,
            password: user.password_hash,
            role: user.role,
            image: user.image,
            created_at: Utc::now(),
        };
        tables.users.insert(id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_posts(&self, include_drafts: bool) -> Result<Vec<PostSummary>, AppError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| include_drafts || p.published)
            .map(|p| tables.post(p))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts.iter().map(PostSummary::from).collect())
    }

    async fn find_post(&self, id: i64) -> Result<Option<Post>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).map(|p| tables.post(p)))
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .find(|p| p.slug == slug)
            .map(|p| tables.post(p)))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, AppError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&post.slug, None) {
            return Err(AppError::Conflict(format!(
                "A post with slug '{}' already exists",
                post.slug
            )));
        }

        let id = tables.next_id();
        let now = Utc::now();
        let record = PostRecord {
            id,
            slug: post.slug,
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            published: post.published,
            author_id: post.author_id,
            created_at: now,
            updated_at: now,
        };
        let created = tables.post(&record);
        tables.posts.insert(id, record);
        Ok(created)
    }

    async fn update_post(
        &self,
        id: i64,
        changes: UpdatePostRequest,
    ) -> Result<Option<Post>, AppError> {
        let mut tables = self.tables.write().await;
        if let Some(slug) = &changes.slug {
            if tables.slug_taken(slug, Some(id)) {
                return Err(AppError::Conflict(format!(
                    "A post with slug '{}' already exists",
                    slug
                )));
            }
        }

        let touched = !changes.is_empty();
        let Some(record) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(slug) = changes.slug {
            record.slug = slug;
        }
        if let Some(content) = changes.content {
            record.content = content;
        }
        if let Some(image_url) = changes.image_url {
            record.image_url = Some(image_url);
        }
        if let Some(published) = changes.published {
            record.published = published;
        }
        if touched {
            record.updated_at = Utc::now();
        }

        let record = record.clone();
        Ok(Some(tables.post(&record)))
    }

    async fn delete_post(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Ok(false);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(true)
    }

    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, AppError> {
        let tables = self.tables.read().await;
        let mut records: Vec<&CommentRecord> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        records.sort_by(|a, b| {
            b.is_pinned
                .cmp(&a.is_pinned)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(records.into_iter().map(|c| tables.comment(c)).collect())
    }

    async fn find_comment(&self, id: i64) -> Result<Option<Comment>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.get(&id).map(|c| tables.comment(c)))
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, AppError> {
        let mut tables = self.tables.write().await;
        if comment
            .parent_id
            .is_some_and(|parent_id| !tables.comments.contains_key(&parent_id))
        {
            return Err(AppError::NotFound("Parent comment not found".to_string()));
        }
        let id = tables.next_id();
        let now = Utc::now();
        let record = CommentRecord {
            id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            parent_id: comment.parent_id,
            text: comment.text,
            is_pinned: false,
            created_at: now,
            updated_at: now,
        };
        let created = tables.comment(&record);
        tables.comments.insert(id, record);
        Ok(created)
    }

    async fn update_comment_text(
        &self,
        id: i64,
        text: &str,
    ) -> Result<Option<Comment>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.comments.get_mut(&id) else {
            return Ok(None);
        };
        record.text = text.to_string();
        record.updated_at = Utc::now();
        let record = record.clone();
        Ok(Some(tables.comment(&record)))
    }

    async fn set_comment_pinned(
        &self,
        id: i64,
        pinned: bool,
    ) -> Result<Option<Comment>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.comments.get_mut(&id) else {
            return Ok(None);
        };
        record.is_pinned = pinned;
        let record = record.clone();
        Ok(Some(tables.comment(&record)))
    }

    async fn delete_comment_with(
        &self,
        id: i64,
        policy: DeletePolicy,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.comments.contains_key(&id) {
            return Ok(false);
        }

        match policy {
            DeletePolicy::Cascade => {}
            DeletePolicy::PromoteToRoot => {
                for c in tables.comments.values_mut() {
                    if c.parent_id == Some(id) {
                        c.parent_id = None;
                    }
                }
            }
            DeletePolicy::ForbidIfReplies => {
                if tables.comments.values().any(|c| c.parent_id == Some(id)) {
                    return Err(AppError::Conflict(
                        "Comment has replies and cannot be deleted".to_string(),
                    ));
                }
            }
        }

        let doomed = tables.subtree(id);
        tables.comments.retain(|cid, _| !doomed.contains(cid));
        Ok(true)
    }
}
