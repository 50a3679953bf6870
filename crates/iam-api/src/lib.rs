//! Mini IAM REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (회원가입, 로그인, 보호된 리소스)
//! - Bearer 토큰 인증 및 역할 기반 접근 추출기
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`extractors`]: 인증/검증 추출기
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod error;
pub mod extractors;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use extractors::{AdminAuth, Authenticated, ValidatedJson};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use openapi::{swagger_ui_router, ApiDoc};
pub use routes::create_api_router;
pub use state::AppState;
