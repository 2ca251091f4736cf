use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::slug::is_valid_slug;

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// Sanitized HTML body.
    pub content: String,
    pub image_url: Option<String>,
    pub published: bool,
    pub author_id: i64,
    pub author_name: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Listing shape for the blog index and the admin dashboard table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub image_url: Option<String>,
    pub published: bool,
    pub author_name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            slug: post.slug.clone(),
            title: post.title.clone(),
            image_url: post.image_url.clone(),
            published: post.published,
            author_name: post.author_name.clone(),
            created_at: post.created_at,
        }
    }
}

/// Fully resolved post ready to insert.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub published: bool,
    pub author_id: i64,
}

/// DTO for creating a new post.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePostRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: String,

    /// Derived from the title when omitted.
    #[validate(length(max = 200), custom(function = validate_slug))]
    pub slug: Option<String>,

    #[validate(length(
        min = 1,
        max = 100000,
        message = "Content length must be between 1 and 100000 chars"
    ))]
    pub content: String,

    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,

    #[serde(default)]
    pub published: bool,
}

/// DTO for patching a post. Absent fields are left as they are.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 200), custom(function = validate_slug))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 100000))]
    pub content: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
    pub published: Option<bool>,
}

impl UpdatePostRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.content.is_none()
            && self.image_url.is_none()
            && self.published.is_none()
    }
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    if !is_valid_slug(slug) {
        return Err(validator::ValidationError::new("invalid_slug"));
    }
    Ok(())
}

/// Accepts an absolute URL or a site-relative path such as `/uploads/x.png`.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    let site_relative = url.starts_with('/') && !url.starts_with("//");
    if !site_relative && Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
