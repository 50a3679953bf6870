//! 회원가입 및 로그인 endpoint.
//!
//! - `POST /register` - 신규 사용자 등록 (기본 역할 `user`)
//! - `POST /login` - 자격증명 확인 후 Bearer 토큰 발급

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{ApiErrorResponse, ApiResult};
use crate::extractors::ValidatedJson;
use crate::metrics::{record_login, record_registration};
use crate::state::AppState;

/// 회원가입/로그인 요청 본문.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CredentialsRequest {
    /// 사용자 이름
    #[validate(
        required(message = "Username and password are required"),
        length(min = 1, message = "Username and password are required")
    )]
    pub username: Option<String>,
    /// 평문 비밀번호
    #[validate(
        required(message = "Username and password are required"),
        length(min = 1, message = "Username and password are required")
    )]
    pub password: Option<String>,
}

impl CredentialsRequest {
    fn into_parts(self) -> (String, String) {
        (
            self.username.unwrap_or_default(),
            self.password.unwrap_or_default(),
        )
    }
}

/// 회원가입 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub username: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// `Authorization: Bearer <token>` 헤더에 사용할 토큰
    pub token: String,
}

/// 신규 사용자 등록.
///
/// POST /register
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "등록 성공", body = RegisterResponse),
        (status = 400, description = "필드 누락", body = ApiErrorResponse),
        (status = 409, description = "이미 존재하는 사용자", body = ApiErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CredentialsRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let (username, password) = request.into_parts();

    let user = state.identity.register(&username, &password).await?;
    record_registration();

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            username: user.username,
        }),
    ))
}

/// 로그인 후 토큰 발급.
///
/// POST /login
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "로그인 성공", body = LoginResponse),
        (status = 400, description = "필드 누락", body = ApiErrorResponse),
        (status = 401, description = "잘못된 자격증명", body = ApiErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CredentialsRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (username, password) = request.into_parts();

    let token = match state.identity.login(&username, &password, Utc::now()).await {
        Ok(token) => {
            record_login("success");
            token
        }
        Err(e) => {
            record_login("failure");
            return Err(e.into());
        }
    };

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}

/// 인증 라우터 (`/register`, `/login`).
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}
