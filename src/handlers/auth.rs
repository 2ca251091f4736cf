// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, LoginResponse, NewUser, Principal, Role},
    store::Repository,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(repo): State<Arc<dyn Repository>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = repo
        .create_user(NewUser {
            email: payload.email.trim().to_lowercase(),
            name: payload.name.trim().to_string(),
            password_hash: hashed_password,
            role: Role::User,
            image: None,
        })
        .await
        .map_err(|e| {
            if !matches!(e, AppError::Conflict(_)) {
                tracing::error!("Failed to register user: {:?}", e);
            }
            e
        })?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(repo): State<Arc<dyn Repository>>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let invalid = || AppError::AuthError("Invalid email or password".to_string());

    let user = repo
        .find_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(invalid());
    }

    let principal = Principal::from(&user);
    let token = sign_jwt(&principal, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        user: principal,
    }))
}

/// Returns the signed-in account as currently stored, so profile changes
/// show up without a new token.
pub async fn me(
    State(repo): State<Arc<dyn Repository>>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let user = repo
        .find_user(principal.id)
        .await?
        .ok_or(AppError::AuthError("Account no longer exists".to_string()))?;

    Ok(Json(Principal::from(&user)))
}
