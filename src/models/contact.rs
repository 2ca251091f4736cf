use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Message submitted through the landing page contact form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ContactRequest {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Name must have at least 2 characters."
    ))]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address."))]
    pub email: String,
    #[validate(length(
        min = 10,
        max = 5000,
        message = "Message must have at least 10 characters."
    ))]
    pub message: String,
}
