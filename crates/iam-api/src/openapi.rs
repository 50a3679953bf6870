//! OpenAPI 문서화 설정.
//!
//! utoipa로 REST API의 OpenAPI 3.0 문서를 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiErrorResponse;
use crate::routes::{
    users::UserDataItems, AdminPanelResponse, CredentialsRequest, HealthResponse, LoginResponse,
    RegisterResponse, UpdateRolesRequest, UserDataResponse, UserInfo, UsersListResponse,
    WelcomeResponse,
};

/// `Authorization: Bearer <token>` 보안 스키마 등록.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Mini IAM API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mini IAM API",
        version = "0.1.0",
        description = r#"
# Mini IAM REST API

사용자 등록, 로그인, 역할 기반 접근 제어를 제공합니다.

## 인증

`/login`으로 받은 토큰을 `Authorization: Bearer <token>` 헤더로 전달합니다.
토큰의 역할은 발급 시점 값이며, 역할 변경은 다음 로그인부터 반영됩니다.
"#
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "헬스 체크"),
        (name = "auth", description = "회원가입 및 로그인"),
        (name = "users", description = "인증된 사용자 API"),
        (name = "admin", description = "관리자 전용 API")
    ),
    components(schemas(
        ApiErrorResponse,
        WelcomeResponse,
        HealthResponse,
        CredentialsRequest,
        RegisterResponse,
        LoginResponse,
        UserDataItems,
        UserDataResponse,
        AdminPanelResponse,
        UserInfo,
        UsersListResponse,
        UpdateRolesRequest,
    )),
    paths(
        // ===== Health =====
        crate::routes::health::welcome,
        crate::routes::health::health_check,

        // ===== Auth =====
        crate::routes::auth::register,
        crate::routes::auth::login,

        // ===== Users / Admin =====
        crate::routes::users::user_data,
        crate::routes::users::admin_panel,
        crate::routes::users::all_users,
        crate::routes::users::update_roles,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
