//! API 에러 응답 타입.
//!
//! 모든 에러는 경계에서 `{code, message}` JSON 본문과 상태 코드로 변환됩니다.
//!
//! | 에러 | 상태 코드 |
//! |---|---|
//! | `Validation` | 400 |
//! | `InvalidCredentials`, `Token(Missing/Invalid/Expired)` | 401 |
//! | `Token(Forbidden)` | 403 |
//! | `NotFound` | 404 |
//! | `Conflict` | 409 |
//! | 저장소/해싱/내부 에러 | 500 |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use iam_core::{IamError, TokenError};

use crate::metrics::record_auth_rejection;

/// API 에러 응답 본문.
///
/// ```json
/// {
///   "code": "TOKEN_EXPIRED",
///   "message": "Token has expired!"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "INVALID_TOKEN")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 상태 코드와 응답 본문을 가진 API 에러.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorResponse::new(code, message),
        }
    }

    /// 500 내부 에러. 원인은 응답에 담지 않습니다.
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }

    /// 400 요청 검증 실패.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        let status = if err.is_authentication_failure() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::FORBIDDEN
        };
        record_auth_rejection(err.code());
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<IamError> for ApiError {
    fn from(err: IamError) -> Self {
        if !err.is_client_error() {
            tracing::error!(error = %err, "Request failed with internal error");
            return Self::internal();
        }

        let (status, code) = match &err {
            IamError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            IamError::Conflict => (StatusCode::CONFLICT, "USER_EXISTS"),
            IamError::InvalidCredentials => {
                record_auth_rejection("INVALID_CREDENTIALS");
                (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            }
            IamError::NotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            IamError::Token(token) => return (*token).into(),
            _ => return Self::internal(),
        };
        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use iam_core::StoreError;

    #[test]
    fn test_token_error_status_codes() {
        for (err, status) in [
            (TokenError::Missing, StatusCode::UNAUTHORIZED),
            (TokenError::Invalid, StatusCode::UNAUTHORIZED),
            (TokenError::Expired, StatusCode::UNAUTHORIZED),
            (TokenError::Forbidden, StatusCode::FORBIDDEN),
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.status, status);
            assert_eq!(api.body.code, err.code());
        }
    }

    #[test]
    fn test_iam_error_status_codes() {
        let cases = [
            (IamError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (IamError::Conflict, StatusCode::CONFLICT),
            (IamError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (IamError::NotFound, StatusCode::NOT_FOUND),
            (IamError::Token(TokenError::Forbidden), StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "/etc/secret/path unreadable");
        let api = ApiError::from(IamError::from(StoreError::Io(io)));

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.body.message.contains("/etc/secret/path"));
    }

    #[test]
    fn test_hashing_and_internal_errors_share_generic_body() {
        for err in [
            IamError::Password(iam_core::PasswordError::HashingFailed),
            IamError::Internal("token role set must not be empty".into()),
        ] {
            let api = ApiError::from(err);
            assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(api.body.code, "INTERNAL_ERROR");
            assert_eq!(api.body.message, "Internal server error");
        }
    }

    #[test]
    fn test_json_body_shape() {
        let api = ApiError::from(IamError::InvalidCredentials);
        let json = serde_json::to_string(&api.body).unwrap();
        assert_eq!(
            json,
            r#"{"code":"INVALID_CREDENTIALS","message":"Invalid credentials"}"#
        );
    }
}
