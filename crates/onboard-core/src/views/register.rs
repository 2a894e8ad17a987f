//! Account registration.

use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult, FieldError};
use crate::models::{RegisterRequest, RegisteredUser};

/// Creates an account. The user logs in separately afterwards.
///
/// Blank usernames and passwords are rejected locally without a request.
///
/// # Errors
/// Returns `Validation` with field messages (local or from the server).
pub async fn register(client: &ApiClient, request: &RegisterRequest) -> ApiResult<RegisteredUser> {
    let mut fields = Vec::new();
    if request.username.trim().is_empty() {
        fields.push(required("username"));
    }
    if request.password.is_empty() {
        fields.push(required("password"));
    }
    if !fields.is_empty() {
        return Err(ApiError {
            fields,
            ..ApiError::new(ApiErrorKind::Validation, "Validation failed")
        });
    }

    let user = client.register(request).await?;
    tracing::info!(username = %user.username, "account registered");
    Ok(user)
}

fn required(field: &str) -> FieldError {
    FieldError {
        field: field.to_string(),
        messages: vec!["This field may not be blank.".to_string()],
    }
}
