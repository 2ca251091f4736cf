use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::user::Role;

/// Author sub-record embedded in every comment returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommentAuthor {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub role: Role,
}

/// A persisted comment, flat shape: replies are linked by `parent_id` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub is_pinned: bool,
    /// `None` for a root comment.
    pub parent_id: Option<i64>,
    pub author: CommentAuthor,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Resolved insert for the repository.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub parent_id: Option<i64>,
}

/// DTO for creating a new comment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(
        length(
            min = 1,
            max = 1000,
            message = "Comment must be between 1 and 1000 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub text: String,

    /// Optional: the ID of the comment being replied to.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// DTO for editing the text of a comment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentRequest {
    #[validate(
        length(
            min = 1,
            max = 1000,
            message = "Comment must be between 1 and 1000 characters"
        ),
        custom(function = validate_not_blank)
    )]
    pub text: String,
}

/// DTO for pinning or unpinning a comment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PinCommentRequest {
    pub pinned: bool,
}

/// Whitespace-only text counts as empty.
fn validate_not_blank(text: &str) -> Result<(), validator::ValidationError> {
    if text.trim().is_empty() {
        let mut err = validator::ValidationError::new("blank");
        err.message = Some("Comment cannot be empty".into());
        return Err(err);
    }
    Ok(())
}
