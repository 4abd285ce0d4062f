//! Admin authorization.
//!
//! Admin routes require `Authorization: Bearer <token>` matching the
//! configured `auth.admin_token`. With no token configured, every admin
//! request is rejected.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use secrecy::{ExposeSecret, SecretString};

use prerna_http::AppError;
use prerna_kernel::{settings::AuthSettings, InitCtx, Module};

/// Checks admin credentials on incoming requests.
#[derive(Clone)]
pub struct AdminGuard {
    token: Option<Arc<SecretString>>,
}

impl AdminGuard {
    /// Build a guard; an empty or whitespace token counts as unset.
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| Arc::new(SecretString::from(t)));
        Self { token }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(settings.admin_token.clone())
    }

    /// Whether an admin token is configured at all.
    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Verify the bearer token carried by `headers`.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let Some(expected) = &self.token else {
            return Err(AppError::unauthorized("Unauthorized"));
        };

        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if constant_time_eq(token, expected.expose_secret()) => Ok(()),
            _ => Err(AppError::unauthorized("Unauthorized")),
        }
    }
}

/// Compare two secrets without returning early on the first differing byte.
fn constant_time_eq(presented: &str, expected: &str) -> bool {
    if presented.len() != expected.len() {
        return false;
    }

    let mut diff: u8 = 0;
    for (a, b) in presented.bytes().zip(expected.bytes()) {
        diff |= a ^ b;
    }
    diff == 0
}

impl std::fmt::Debug for AdminGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGuard")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// Extractor that requires admin credentials.
///
/// ```rust,ignore
/// async fn delete_product(_admin: RequireAdmin, Path(id): Path<String>) -> ... { }
/// ```
pub struct RequireAdmin;

impl<S> FromRequestParts<S> for RequireAdmin
where
    AdminGuard: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        AdminGuard::from_ref(state).authorize(&parts.headers)?;
        Ok(Self)
    }
}

/// Core module reporting the admin guard configuration at startup.
pub struct AuthzModule {
    guard: AdminGuard,
}

impl AuthzModule {
    pub fn new(guard: AdminGuard) -> Self {
        Self { guard }
    }
}

#[async_trait]
impl Module for AuthzModule {
    fn name(&self) -> &'static str {
        "authz"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if self.guard.is_configured() {
            tracing::info!(module = self.name(), "admin token configured");
        } else {
            tracing::warn!(
                module = self.name(),
                environment = ?ctx.settings.environment,
                "no admin token configured; admin routes will reject every request"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_matching_bearer_token() {
        let guard = AdminGuard::new(Some("s3cret".to_string()));
        assert!(guard.authorize(&headers_with("Bearer s3cret")).is_ok());
    }

    #[test]
    fn rejects_missing_or_wrong_token() {
        let guard = AdminGuard::new(Some("s3cret".to_string()));
        assert!(guard.authorize(&HeaderMap::new()).is_err());
        assert!(guard.authorize(&headers_with("Bearer nope")).is_err());
        assert!(guard.authorize(&headers_with("Basic s3cret")).is_err());
    }

    #[test]
    fn rejects_same_length_token_with_different_bytes() {
        let guard = AdminGuard::new(Some("s3cret".to_string()));
        assert!(guard.authorize(&headers_with("Bearer s3creT")).is_err());
        assert!(guard.authorize(&headers_with("Bearer x3cret")).is_err());

        assert!(constant_time_eq("s3cret", "s3cret"));
        assert!(!constant_time_eq("s3cret", "s3cres"));
        assert!(!constant_time_eq("s3cret", "s3cret!"));
        assert!(!constant_time_eq("", "s"));
    }

    #[test]
    fn unconfigured_guard_rejects_everything() {
        let guard = AdminGuard::new(Some("   ".to_string()));
        assert!(!guard.is_configured());
        assert!(guard.authorize(&headers_with("Bearer ")).is_err());
        assert_eq!(format!("{guard:?}"), "AdminGuard { configured: false }");
    }

    #[tokio::test]
    async fn extractor_uses_guard_from_state() {
        let guard = AdminGuard::new(Some("s3cret".to_string()));
        let request = axum::http::Request::builder()
            .header(AUTHORIZATION, "Bearer s3cret")
            .body(())
            .unwrap();
        let (mut parts, ()) = request.into_parts();

        assert!(RequireAdmin::from_request_parts(&mut parts, &guard)
            .await
            .is_ok());
    }
}
