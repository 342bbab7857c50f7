use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::utils::error::AppError;

/// Identity header set by the upstream auth proxy after token verification.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller identity.
///
/// Token issuance and verification happen upstream; by the time a request
/// reaches this service the gateway has already resolved the caller to a
/// user id and placed it in [`USER_ID_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::AuthError("Missing user identity".to_string()))?;

        let user_id = header
            .parse::<Uuid>()
            .map_err(|_| AppError::AuthError("Invalid user identity".to_string()))?;

        Ok(AuthUser(user_id))
    }
}
