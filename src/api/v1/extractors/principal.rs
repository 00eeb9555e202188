use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::{AuthError, Principal};

/// The verified principal of the current request.
///
/// The gateway middleware inserts it into request extensions. On an exempt
/// route there is none; use `Option<CurrentPrincipal>` there.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentPrincipal)
            .ok_or(AppError::Unauthorized(AuthError::MissingCredential))
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Principal>().cloned().map(CurrentPrincipal))
    }
}

/// A principal carrying the administrator claim.
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentPrincipal(principal) =
            <CurrentPrincipal as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            tracing::warn!(subject_id = %principal.subject_id(), "admin route called by non-admin");
            return Err(AppError::Unauthorized(AuthError::AdminRequired));
        }
        Ok(AdminPrincipal(principal))
    }
}
