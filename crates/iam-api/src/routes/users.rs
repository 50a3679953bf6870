//! 보호된 사용자/관리자 endpoint.
//!
//! - `GET /api/user_data` - 인증된 모든 사용자
//! - `GET /api/admin_panel` - `admin` 역할 필요
//! - `GET /api/all_users` - `admin` 역할 필요, 비밀번호 해시 제외
//! - `PUT /api/users/{username}/roles` - `admin` 역할 필요, 역할 교체

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use iam_core::{RoleSet, UserSummary};

use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::extractors::{AdminAuth, Authenticated, ValidatedJson};
use crate::state::AppState;

/// 개인 데이터 샘플.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDataItems {
    pub item1: String,
    pub item2: String,
}

/// `GET /api/user_data` 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDataResponse {
    pub message: String,
    /// 토큰에 담긴 역할
    pub your_roles: Vec<String>,
    pub data: UserDataItems,
}

/// `GET /api/admin_panel` 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminPanelResponse {
    pub message: String,
    pub your_roles: Vec<String>,
    pub admin_secrets: Vec<String>,
}

/// 사용자 정보 (해시 제외).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub username: String,
    pub roles: Vec<String>,
}

impl From<UserSummary> for UserInfo {
    fn from(summary: UserSummary) -> Self {
        Self {
            username: summary.username,
            roles: summary.roles.to_vec(),
        }
    }
}

/// `GET /api/all_users` 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersListResponse {
    pub users: Vec<UserInfo>,
}

/// 역할 교체 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRolesRequest {
    #[validate(
        required(message = "At least one role is required"),
        length(min = 1, message = "At least one role is required")
    )]
    pub roles: Option<Vec<String>>,
}

/// 인증된 사용자의 개인 데이터.
///
/// GET /api/user_data
#[utoipa::path(
    get,
    path = "/api/user_data",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "개인 데이터", body = UserDataResponse),
        (status = 401, description = "토큰 없음/무효/만료", body = ApiErrorResponse)
    )
)]
pub async fn user_data(Authenticated(ctx): Authenticated) -> Json<UserDataResponse> {
    Json(UserDataResponse {
        message: format!("Welcome, {}! This is your personal data.", ctx.subject),
        your_roles: ctx.roles.to_vec(),
        data: UserDataItems {
            item1: "value1".to_string(),
            item2: "value2".to_string(),
        },
    })
}

/// 관리자 패널.
///
/// GET /api/admin_panel
#[utoipa::path(
    get,
    path = "/api/admin_panel",
    tag = "admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "관리자 패널", body = AdminPanelResponse),
        (status = 401, description = "토큰 없음/무효/만료", body = ApiErrorResponse),
        (status = 403, description = "권한 부족", body = ApiErrorResponse)
    )
)]
pub async fn admin_panel(AdminAuth(ctx): AdminAuth) -> Json<AdminPanelResponse> {
    Json(AdminPanelResponse {
        message: format!("Hello, Admin {}! This is the admin panel.", ctx.subject),
        your_roles: ctx.roles.to_vec(),
        admin_secrets: vec!["secret_key_1".to_string(), "secret_key_2".to_string()],
    })
}

/// 전체 사용자 목록.
///
/// GET /api/all_users
#[utoipa::path(
    get,
    path = "/api/all_users",
    tag = "admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "사용자 목록", body = UsersListResponse),
        (status = 401, description = "토큰 없음/무효/만료", body = ApiErrorResponse),
        (status = 403, description = "권한 부족", body = ApiErrorResponse)
    )
)]
pub async fn all_users(
    State(state): State<Arc<AppState>>,
    AdminAuth(_admin): AdminAuth,
) -> ApiResult<Json<UsersListResponse>> {
    let users = state.identity.list_users().await?;

    Ok(Json(UsersListResponse {
        users: users.into_iter().map(UserInfo::from).collect(),
    }))
}

/// 사용자 역할 교체.
///
/// 이미 발급된 토큰에는 반영되지 않고, 다음 로그인부터 적용됩니다.
///
/// PUT /api/users/{username}/roles
#[utoipa::path(
    put,
    path = "/api/users/{username}/roles",
    tag = "admin",
    security(("bearer" = [])),
    params(("username" = String, Path, description = "대상 사용자 이름")),
    request_body = UpdateRolesRequest,
    responses(
        (status = 200, description = "변경된 사용자 정보", body = UserInfo),
        (status = 400, description = "역할 누락", body = ApiErrorResponse),
        (status = 403, description = "권한 부족", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    )
)]
pub async fn update_roles(
    State(state): State<Arc<AppState>>,
    AdminAuth(admin): AdminAuth,
    Path(username): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateRolesRequest>,
) -> ApiResult<Json<UserInfo>> {
    let roles: RoleSet = request.roles.unwrap_or_default().into_iter().collect();
    if roles.is_empty() {
        return Err(ApiError::validation("At least one role is required"));
    }

    let updated = state.identity.update_roles(&username, roles).await?;
    tracing::info!(admin = %admin.subject, username = %username, "Roles replaced by admin");

    Ok(Json(updated.into()))
}

/// 보호된 API 라우터.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user_data", get(user_data))
        .route("/api/admin_panel", get(admin_panel))
        .route("/api/all_users", get(all_users))
        .route("/api/users/{username}/roles", put(update_roles))
}
