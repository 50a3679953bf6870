//! Axum 요청 추출기.
//!
//! - [`Authenticated`]: Bearer 토큰 인증만 요구
//! - [`AdminAuth`]: 인증 + `admin` 역할 요구
//! - [`ValidatedJson`]: JSON 본문 파싱 + `validator` 검증, 실패 시 400
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(Authenticated(ctx): Authenticated) -> impl IntoResponse {
//!     format!("Hello, {}!", ctx.subject)
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use iam_core::{AuthContext, RoleSet, ROLE_ADMIN};

use crate::error::ApiError;
use crate::state::AppState;

/// 인증된 사용자 컨텍스트 추출기.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthContext);

/// Admin 역할을 요구하는 추출기.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub AuthContext);

fn authorization_header(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

fn guard_request(
    parts: &Parts,
    state: &AppState,
    required: Option<&RoleSet>,
) -> Result<AuthContext, ApiError> {
    state
        .guard
        .check(authorization_header(parts), required, Utc::now())
        .map_err(|reason| {
            tracing::debug!(
                path = %parts.uri.path(),
                reason = reason.code(),
                "Request rejected by access guard"
            );
            ApiError::from(reason)
        })
}

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        guard_request(parts, state, None).map(Authenticated)
    }
}

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let required: RoleSet = [ROLE_ADMIN].into_iter().collect();
        guard_request(parts, state, Some(&required)).map(AdminAuth)
    }
}

/// 검증된 JSON 본문 추출기.
///
/// 본문이 JSON이 아니거나 필드 검증에 실패하면 422/415 대신 400을 반환합니다.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                tracing::debug!(error = %rejection.body_text(), "Malformed JSON body");
                ApiError::validation("Request body must be a valid JSON object")
            })?;

        value
            .validate()
            .map_err(|errors| ApiError::validation(first_message(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

/// 검증 에러 중 필드 이름 순으로 첫 메시지를 고릅니다.
fn first_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.keys().collect();
    fields.sort();

    fields
        .into_iter()
        .filter_map(|field| field_errors.get(field))
        .flat_map(|errs| errs.iter())
        .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid request".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Router,
    };
    use iam_core::auth::TokenIssuer;
    use serde::Deserialize;
    use tower::ServiceExt;

    use crate::state::create_test_state;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[serde(default)]
        #[validate(required(message = "name is required"), length(min = 1, message = "name is required"))]
        name: Option<String>,
    }

    async fn whoami(Authenticated(ctx): Authenticated) -> String {
        ctx.subject
    }

    async fn admin_only(AdminAuth(ctx): AdminAuth) -> String {
        ctx.subject
    }

    async fn echo(ValidatedJson(payload): ValidatedJson<Payload>) -> String {
        payload.name.unwrap_or_default()
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route("/admin", get(admin_only))
            .route("/echo", post(echo))
            .with_state(state)
    }

    fn bearer(state: &AppState, roles: RoleSet) -> String {
        let issuer = TokenIssuer::new(&state.config.auth);
        format!("Bearer {}", issuer.issue("tester", &roles, Utc::now()).unwrap())
    }

    async fn status_of(app: Router, request: HttpRequest<Body>) -> StatusCode {
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let state = Arc::new(create_test_state());
        let request = HttpRequest::builder().uri("/whoami").body(Body::empty()).unwrap();
        assert_eq!(status_of(app(state), request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        let state = Arc::new(create_test_state());
        let header = bearer(&state, RoleSet::default_user());
        let request = HttpRequest::builder()
            .uri("/whoami")
            .header(AUTHORIZATION, header)
            .body(Body::empty())
            .unwrap();

        let response = app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"tester");
    }

    #[tokio::test]
    async fn test_admin_extractor_requires_role() {
        let state = Arc::new(create_test_state());

        let user_header = bearer(&state, RoleSet::default_user());
        let request = HttpRequest::builder()
            .uri("/admin")
            .header(AUTHORIZATION, user_header)
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(app(state.clone()), request).await, StatusCode::FORBIDDEN);

        let admin_header = bearer(&state, RoleSet::administrator());
        let request = HttpRequest::builder()
            .uri("/admin")
            .header(AUTHORIZATION, admin_header)
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(app(state), request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_validated_json_rejections_are_bad_request() {
        let state = Arc::new(create_test_state());

        for body in ["not json", "{}", r#"{"name": ""}"#, r#"{"name": 5}"#] {
            let request = HttpRequest::builder()
                .method("POST")
                .uri("/echo")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap();
            assert_eq!(
                status_of(app(state.clone()), request).await,
                StatusCode::BAD_REQUEST,
                "body: {body}"
            );
        }

        let request = HttpRequest::builder()
            .method("POST")
            .uri("/echo")
            .body(Body::from(r#"{"name": "x"}"#))
            .unwrap();
        assert_eq!(status_of(app(state), request).await, StatusCode::BAD_REQUEST);
    }
}
