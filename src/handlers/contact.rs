// src/handlers/contact.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    mailer::Email,
    models::contact::ContactRequest,
    state::AppState,
};

/// Relays a contact form submission to the site owner's inbox.
pub async fn send_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let to = state
        .config
        .contact_to
        .as_deref()
        .or(state.config.admin_email.as_deref())
        .ok_or(AppError::InternalServerError(
            "No recipient configured for contact messages".to_string(),
        ))?;

    let email = Email::from_contact(&payload, &state.config.contact_from, to);
    state.mailer.send(&email).await.map_err(|e| {
        tracing::error!("Failed to send contact message: {}", e);
        e
    })?;

    Ok(Json(json!({ "sent": true })))
}
