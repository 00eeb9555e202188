//! Request gateway: exemption check -> credential -> revocation -> forward.
//!
//! - Exempt requests are forwarded without a `Principal`.
//! - Authorized requests get the `Principal` in request extensions; handlers read it
//!   through `CurrentPrincipal` / `AdminPrincipal`.
//! - Every refusal becomes `AppError::Unauthorized` and is answered here; the
//!   downstream handler is never called.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::{Gateway, GatewayDecision};

/// Put the gateway in front of every route of `router` (including its fallback).
///
/// 例：
/// ```ignore
/// let router = Router::new().nest("/api/v1", api::v1::routes()).with_state(state.clone());
/// let router = middleware::auth::access::apply(router, state.gateway.clone());
/// ```
pub fn apply<S>(router: Router<S>, gateway: Arc<Gateway>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(gateway, gateway_middleware))
}

async fn gateway_middleware(
    State(gateway): State<Arc<Gateway>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let decision = gateway
        .authorize(req.method(), req.uri().path(), req.headers())
        .await
        .map_err(|reason| {
            tracing::warn!(
                reason = %reason,
                method = %req.method(),
                path = %req.uri().path(),
                "request refused by auth gateway"
            );
            AppError::Unauthorized(reason)
        })?;

    match decision {
        GatewayDecision::Bypassed => {
            tracing::debug!(path = %req.uri().path(), "exempt request forwarded anonymously");
        }
        GatewayDecision::Authorized(principal) => {
            tracing::debug!(
                subject_id = %principal.subject_id(),
                expires_at = principal.expires_at(),
                "request authorized"
            );
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(principal);
        }
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        Json,
        body::to_bytes,
        http::{StatusCode, header},
        routing::{get, post},
    };
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use serde_json::{Value, json};
    use uuid::Uuid;

    use tower::ServiceExt;

    use super::*;
    use crate::api::v1::extractors::{AdminPrincipal, CurrentPrincipal};
    use crate::services::auth::CredentialIssuer;
    use crate::services::auth::revocation::{LegacyAdminOnly, NeverRevoked, RevocationPolicy};
    use crate::services::auth::testing::{SECRET, gateway_config};

    async fn whoami(principal: Option<CurrentPrincipal>) -> Json<Value> {
        match principal {
            Some(CurrentPrincipal(p)) => Json(json!({
                "userId": p.subject_id(),
                "isAdmin": p.is_admin(),
            })),
            None => Json(json!({ "anonymous": true })),
        }
    }

    async fn admin_only(AdminPrincipal(p): AdminPrincipal) -> Json<Value> {
        Json(json!({ "userId": p.subject_id() }))
    }

    async fn reject_payload() -> Result<Json<Value>, AppError> {
        Err(AppError::validation("countInStock must be >= 0"))
    }

    fn app(revocation: Arc<dyn RevocationPolicy>) -> Router {
        let gateway = Arc::new(Gateway::new(Arc::new(gateway_config()), revocation));
        let router = Router::new()
            .route("/api/v1/products", get(whoami).post(whoami))
            .route("/api/v1/orders", get(whoami))
            .route("/api/v1/orders/import", post(reject_payload))
            .route("/api/v1/users", get(admin_only));
        apply(router, gateway)
    }

    fn token(is_admin: bool) -> String {
        CredentialIssuer::new(&gateway_config())
            .issue(Uuid::new_v4(), is_admin)
            .unwrap()
            .token
    }

    fn expired_token() -> String {
        let now = chrono::Utc::now().timestamp();
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &json!({"userId": Uuid::new_v4(), "isAdmin": true, "iat": now - 7200, "exp": now - 3600}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    async fn send(app: Router, method: &str, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let res = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn unauthorized() -> Value {
        json!({ "message": "User not authorized" })
    }

    #[tokio::test]
    async fn exempt_path_is_forwarded_anonymously() {
        let (status, body) = send(app(Arc::new(NeverRevoked)), "GET", "/api/v1/products", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "anonymous": true }));
    }

    #[tokio::test]
    async fn exempt_path_with_wrong_method_is_guarded() {
        let (status, body) = send(app(Arc::new(NeverRevoked)), "POST", "/api/v1/products", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unauthorized());
    }

    #[tokio::test]
    async fn guarded_path_without_credential_is_401() {
        let (status, body) = send(app(Arc::new(NeverRevoked)), "GET", "/api/v1/orders", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unauthorized());
    }

    #[tokio::test]
    async fn unknown_route_is_guarded_too() {
        let (status, body) = send(app(Arc::new(NeverRevoked)), "GET", "/api/v1/nowhere", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unauthorized());
    }

    #[tokio::test]
    async fn expired_credential_is_401() {
        let token = expired_token();
        let (status, body) =
            send(app(Arc::new(NeverRevoked)), "GET", "/api/v1/orders", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unauthorized());
    }

    #[tokio::test]
    async fn non_admin_is_refused_under_legacy_policy() {
        // Legacy behaviour: kept visible so switching policy is a deliberate change.
        let token = token(false);
        let (status, body) =
            send(app(Arc::new(LegacyAdminOnly)), "GET", "/api/v1/orders", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unauthorized());
    }

    #[tokio::test]
    async fn non_admin_is_forwarded_without_legacy_policy() {
        let token = token(false);
        let (status, body) =
            send(app(Arc::new(NeverRevoked)), "GET", "/api/v1/orders", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isAdmin"], false);
        assert!(body["userId"].is_string());
    }

    #[tokio::test]
    async fn admin_is_forwarded_under_legacy_policy() {
        let token = token(true);
        let (status, body) =
            send(app(Arc::new(LegacyAdminOnly)), "GET", "/api/v1/orders", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isAdmin"], true);
    }

    #[tokio::test]
    async fn admin_route_refuses_plain_users() {
        let token = token(false);
        let (status, body) =
            send(app(Arc::new(NeverRevoked)), "GET", "/api/v1/users", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unauthorized());
    }

    #[tokio::test]
    async fn downstream_validation_failure_is_classified() {
        let token = token(true);
        let (status, body) =
            send(app(Arc::new(NeverRevoked)), "POST", "/api/v1/orders/import", Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "ValidationFailure" }));
    }

    #[tokio::test]
    async fn tampered_credential_is_401() {
        let mut token = token(true);
        token.push('x');
        let (status, _) =
            send(app(Arc::new(NeverRevoked)), "GET", "/api/v1/orders", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
