//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 설정과 서명 키는 시작 시 한 번 만들어진 뒤 변경되지 않습니다.
//! 가변 상태는 자격증명 저장소뿐이며, 동시성은 저장소 구현이 책임집니다.

use std::sync::Arc;

use iam_core::auth::{AccessGuard, TokenIssuer, TokenVerifier};
use iam_core::{AppConfig, CredentialStore, IdentityService};

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러와 인증 추출기에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 회원가입/로그인/사용자 관리 서비스
    pub identity: IdentityService,

    /// 토큰 검증 + 역할 검사 가드
    pub guard: AccessGuard,

    /// 불변 설정
    pub config: Arc<AppConfig>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 설정과 저장소로 상태를 구성합니다.
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn CredentialStore>) -> Self {
        let issuer = TokenIssuer::new(&config.auth);
        let verifier = TokenVerifier::new(&config.auth);

        Self {
            identity: IdentityService::new(store, issuer),
            guard: AccessGuard::new(verifier),
            config,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
pub(crate) fn create_test_state() -> AppState {
    use iam_core::{AuthConfig, MemoryCredentialStore};

    let config = AppConfig::new(AuthConfig::new("unit-test-secret-key-minimum-32-chars"));
    AppState::new(Arc::new(config), Arc::new(MemoryCredentialStore::new()))
}
