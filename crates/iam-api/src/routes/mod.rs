//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/`, `/health` - 환영 메시지, 헬스 체크
//! - `/register`, `/login` - 회원가입, 토큰 발급
//! - `/api/user_data` - 인증 필요
//! - `/api/admin_panel`, `/api/all_users`, `/api/users/{username}/roles` - `admin` 역할 필요

pub mod auth;
pub mod health;
pub mod users;

pub use auth::{auth_router, CredentialsRequest, LoginResponse, RegisterResponse};
pub use health::{health_router, HealthResponse, WelcomeResponse};
pub use users::{
    users_router, AdminPanelResponse, UpdateRolesRequest, UserDataResponse, UserInfo,
    UsersListResponse,
};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 서브 라우터들은 절대 경로로 라우트를 선언하므로 `merge`로 조합합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health_router())
        .merge(auth_router())
        .merge(users_router())
}
