// src/handlers/posts.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    comments::can_manage_posts,
    error::AppError,
    models::{
        post::{CreatePostRequest, NewPost, UpdatePostRequest},
        user::Principal,
    },
    store::Repository,
    utils::{
        html::clean_html,
        slug::{is_valid_slug, slugify},
    },
};

/// Published posts, newest first.
pub async fn list_posts(
    State(repo): State<Arc<dyn Repository>>,
) -> Result<impl IntoResponse, AppError> {
    let posts = repo.list_posts(false).await?;
    Ok(Json(posts))
}

/// A single published post. Drafts are reported as missing.
pub async fn get_post_by_slug(
    State(repo): State<Arc<dyn Repository>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let post = repo
        .find_post_by_slug(&slug)
        .await?
        .filter(|p| p.published)
        .ok_or(AppError::NotFound(format!("Post '{}' not found", slug)))?;

    Ok(Json(post))
}

/// Dashboard listing, drafts included.
/// Admin only.
pub async fn admin_list_posts(
    State(repo): State<Arc<dyn Repository>>,
) -> Result<impl IntoResponse, AppError> {
    let posts = repo.list_posts(true).await?;
    Ok(Json(posts))
}

/// Admin only.
pub async fn admin_get_post(
    State(repo): State<Arc<dyn Repository>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = repo
        .find_post(id)
        .await?
        .ok_or(AppError::NotFound(format!("Post {} not found", id)))?;
    Ok(Json(post))
}

/// Creates a post authored by the calling admin.
pub async fn create_post(
    State(repo): State<Arc<dyn Repository>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_manager(&principal)?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let slug = match payload.slug {
        Some(slug) => slug,
        None => slugify(&payload.title),
    };
    if !is_valid_slug(&slug) {
        return Err(AppError::BadRequest(
            "Could not derive a slug from the title, please provide one".to_string(),
        ));
    }

    let post = repo
        .create_post(NewPost {
            slug,
            title: payload.title.trim().to_string(),
            content: clean_html(&payload.content),
            image_url: payload.image_url,
            published: payload.published,
            author_id: principal.id,
        })
        .await?;

    tracing::info!(post_id = post.id, slug = %post.slug, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// Patches a post. Absent fields are left untouched.
pub async fn update_post(
    State(repo): State<Arc<dyn Repository>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(mut payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    ensure_manager(&principal)?;
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if let Some(content) = payload.content.take() {
        payload.content = Some(clean_html(&content));
    }

    let post = repo
        .update_post(id, payload)
        .await?
        .ok_or(AppError::NotFound(format!("Post {} not found", id)))?;

    tracing::info!(post_id = post.id, "post updated");
    Ok(Json(post))
}

/// Deletes a post and, with it, every comment on it.
pub async fn delete_post(
    State(repo): State<Arc<dyn Repository>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    ensure_manager(&principal)?;
    if !repo.delete_post(id).await? {
        return Err(AppError::NotFound(format!("Post {} not found", id)));
    }

    tracing::info!(post_id = id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Same check as `admin_middleware`, applied per handler.
fn ensure_manager(principal: &Principal) -> Result<(), AppError> {
    if !can_manage_posts(Some(principal)) {
        return Err(AppError::Forbidden("Administrator access required".to_string()));
    }
    Ok(())
}
