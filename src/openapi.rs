// src/openapi.rs

use axum::Json;
use utoipa::OpenApi;

use crate::{
    handlers::upload::UploadResponse,
    models::{
        comment::{
            Comment, CommentAuthor, CreateCommentRequest, PinCommentRequest, UpdateCommentRequest,
        },
        contact::ContactRequest,
        post::{CreatePostRequest, Post, PostSummary, UpdatePostRequest},
        user::{CreateUserRequest, LoginRequest, LoginResponse, Principal, Role, User},
    },
};

/// Schema catalogue for the public API.
#[derive(OpenApi)]
#[openapi(
    info(title = "folio", description = "Portfolio blog API"),
    components(schemas(
        Role,
        User,
        Principal,
        CreateUserRequest,
        LoginRequest,
        LoginResponse,
        Post,
        PostSummary,
        CreatePostRequest,
        UpdatePostRequest,
        CommentAuthor,
        Comment,
        CreateCommentRequest,
        UpdateCommentRequest,
        PinCommentRequest,
        ContactRequest,
        UploadResponse,
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
