//! 접근 가드.
//!
//! 보호된 작업마다 두 단계 검사를 순서대로 적용합니다.
//!
//! 1. 인증: `Authorization: Bearer <token>` 헤더에서 토큰을 꺼내 검증
//! 2. 인가 (선택): 토큰 역할과 요구 역할의 교집합이 비어 있지 않은지 확인
//!
//! 요청 단위 상태 전이는 `NoToken → TokenPresent → Authenticated → Authorized`이며
//! 각 단계에서 실패 사유(`Missing`/`Invalid`/`Expired`/`Forbidden`)를 가진 거부 상태로 갈 수 있습니다.
//! `Forbidden`은 인증이 성공한 뒤에만 나올 수 있습니다.

use chrono::{DateTime, Utc};

use super::TokenVerifier;
use crate::domain::{AuthContext, RoleSet};
use crate::error::TokenError;

/// Authorization 헤더의 Bearer 접두사.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Authorization 헤더 값에서 Bearer 토큰을 추출합니다.
///
/// 헤더가 없거나, `Bearer ` 접두사가 없거나, 토큰 부분이 비어 있으면 `Missing`.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, TokenError> {
    let token = header
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .ok_or(TokenError::Missing)?;

    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    Ok(token)
}

/// 인증 컨텍스트가 요구 역할 중 하나라도 가지는지 확인합니다.
pub fn require_any_role(ctx: &AuthContext, required: &RoleSet) -> Result<(), TokenError> {
    if ctx.roles.intersects(required) {
        Ok(())
    } else {
        Err(TokenError::Forbidden)
    }
}

/// 토큰 검증과 역할 검사를 조합한 가드.
#[derive(Clone)]
pub struct AccessGuard {
    verifier: TokenVerifier,
}

impl AccessGuard {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    /// 인증 단계만 수행합니다.
    pub fn authenticate(
        &self,
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AuthContext, TokenError> {
        let token = extract_bearer(header)?;
        self.verifier.verify(token, now)
    }

    /// 인증 후, `required`가 주어지면 역할 검사까지 수행합니다.
    pub fn check(
        &self,
        header: Option<&str>,
        required: Option<&RoleSet>,
        now: DateTime<Utc>,
    ) -> Result<AuthContext, TokenError> {
        let ctx = self.authenticate(header, now)?;
        if let Some(required) = required {
            require_any_role(&ctx, required)?;
        }
        Ok(ctx)
    }
}
