use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, models::SessionContext};

/// HTTP header carrying the authenticated user's ID
pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolves the caller's session context from the user header.
///
/// Authentication happens upstream; requests without a user are rejected.
#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing or empty {} header", USER_ID_HEADER))
            })?;

        Ok(SessionContext::new(user_id))
    }
}
