use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use crate::{auth::jwt::JwtKeys, error::ApiError};

/// Verified caller identity. Extracting it is the auth gate for a route:
/// no usable bearer token is 401, a token that fails verification is 403.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("authorization token missing".into()))?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims.sub)),
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                Err(ApiError::Forbidden("invalid or expired token".into()))
            }
        }
    }
}

/// Token from `Authorization: Bearer <token>`; `None` when absent, another scheme, or empty.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo_types::User, config::JwtConfig};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use time::OffsetDateTime;
    use tower::ServiceExt;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "gate-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 60,
        })
    }

    fn app() -> Router {
        Router::new()
            .route("/whoami", get(|AuthUser(id): AuthUser| async move { id.to_string() }))
            .with_state(keys())
    }

    async fn call(auth: Option<&str>) -> (StatusCode, String) {
        let mut req = Request::builder().uri("/whoami");
        if let Some(value) = auth {
            req = req.header(AUTHORIZATION, value);
        }
        let res = app().oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let (status, _) = call(None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_scheme_or_empty_token_is_unauthorized() {
        assert_eq!(call(Some("Basic abc")).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(Some("Bearer ")).await.0, StatusCode::UNAUTHORIZED);
        assert_eq!(call(Some("Bearer")).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_is_forbidden() {
        let (status, body) = call(Some("Bearer not-a-token")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains("invalid or expired token"));
    }

    #[tokio::test]
    async fn valid_token_passes_subject_through() {
        let user = User {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@x.com".into(),
            password_hash: String::new(),
            avatar_url: None,
            reset_password_token: None,
            reset_password_expires: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let token = keys().issue(&user).unwrap();
        let (status, body) = call(Some(&format!("Bearer {token}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, user.id.to_string());
    }
}
