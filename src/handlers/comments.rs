// src/handlers/comments.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::{
    comments::CommentService,
    error::AppError,
    models::{
        comment::{CreateCommentRequest, PinCommentRequest, UpdateCommentRequest},
        user::Principal,
    },
};

/// Flat comment list for a post: pinned first, then oldest first.
pub async fn list_comments(
    State(service): State<CommentService>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comments = service.list(post_id).await?;
    Ok(Json(comments))
}

/// The same comments nested into reply trees, display-sorted at every level.
pub async fn comment_tree(
    State(service): State<CommentService>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let forest = service.tree(post_id).await?;
    let body = forest
        .to_json()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// Posts a root comment, or a reply when `parent_id` is set.
pub async fn create_comment(
    State(service): State<CommentService>,
    Extension(principal): Extension<Principal>,
    Path(post_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = service.create(&principal, post_id, payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Author or admin only.
pub async fn update_comment(
    State(service): State<CommentService>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = service.update(&principal, id, payload).await?;
    Ok(Json(comment))
}

/// Author or admin only. Replies are handled by the configured delete policy.
pub async fn delete_comment(
    State(service): State<CommentService>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    service.delete(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Admin only.
pub async fn pin_comment(
    State(service): State<CommentService>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<PinCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = service.set_pinned(&principal, id, payload.pinned).await?;
    Ok(Json(comment))
}
