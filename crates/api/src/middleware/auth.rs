//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::ApiError};
use campuspay_shared::{AppError, AppResult, Claims, JwtService};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Validates a raw token into claims.
pub(crate) fn authenticate(jwt: &JwtService, token: &str) -> AppResult<Claims> {
    jwt.validate_token(token).map_err(AppError::from)
}

/// Authentication middleware that validates JWT tokens.
///
/// Valid claims are stored in request extensions for [`AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or(AppError::MissingToken)?;

    let claims = authenticate(&state.jwt_service, token)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated caller.
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> uuid::Uuid {
        self.0.user_id()
    }

    /// Returns true for admins.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }

    /// Fails with 403 unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::admin_only())
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Unauthenticated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campuspay_shared::JwtConfig;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_authenticate_maps_jwt_failures() {
        let jwt = JwtService::new(JwtConfig {
            secret: "auth-middleware-test-secret-32-bytes!".into(),
            access_token_expires_minutes: 15,
        });
        let err = authenticate(&jwt, "not-a-jwt").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TOKEN");

        let token = jwt.generate_access_token(uuid::Uuid::new_v4(), "student").unwrap();
        assert!(authenticate(&jwt, &token).is_ok());
    }
}
