//! JWT 토큰 발급 및 검증.
//!
//! HS256 서명 토큰을 사용합니다. 발급자와 검증자는 프로세스 시작 시 로드된
//! 하나의 비밀 키를 공유하며, 서버는 발급한 토큰을 기록하지 않습니다.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::domain::{AuthContext, RoleSet};
use crate::error::{IamError, IamResult, TokenError};

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 이름
    pub sub: String,
    /// 발급 시점의 역할 스냅샷
    pub roles: RoleSet,
    /// Issued At (Unix timestamp, 초)
    pub iat: i64,
    /// Expiration (Unix timestamp, 초)
    pub exp: i64,
    /// JWT ID - 같은 초에 발급된 토큰도 서로 다른 문자열이 되도록 함
    pub jti: String,
}

impl Claims {
    /// `now` 기준으로 `ttl` 후 만료되는 Claims 생성.
    pub fn new(
        subject: impl Into<String>,
        roles: RoleSet,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: subject.into(),
            roles,
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// `now`가 만료 시각을 지났는지 확인 (leeway 없음, `now == exp`는 유효).
    ///
    /// 초 미만 단위까지 비교하므로 `exp` 직후의 순간도 만료입니다.
    /// 표현할 수 없는 `exp`는 만료로 취급합니다.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        DateTime::from_timestamp(self.exp, 0).map_or(true, |exp| now > exp)
    }
}

/// 토큰 발급자.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key: EncodingKey::from_secret(config.secret_bytes()),
            ttl: config.token_ttl,
        }
    }

    /// 토큰 유효 기간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 서명된 토큰 발급.
    ///
    /// 사용자 이름과 역할 집합은 비어 있으면 안 됩니다.
    pub fn issue(&self, username: &str, roles: &RoleSet, now: DateTime<Utc>) -> IamResult<String> {
        if username.is_empty() {
            return Err(IamError::Internal("token subject must not be empty".into()));
        }
        if roles.is_empty() {
            return Err(IamError::Internal("token role set must not be empty".into()));
        }

        let claims = Claims::new(username, roles.clone(), now, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| IamError::Internal(format!("token encoding failed: {}", e)))
    }
}

/// 토큰 검증자.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 호출자가 넘긴 시각으로 직접 비교한다
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(config.secret_bytes()),
            validation,
        }
    }

    /// 토큰을 검증하고 Claims를 반환합니다.
    ///
    /// 1. 구조 파싱 실패 → `Invalid`
    /// 2. 서명 불일치 → `Invalid`
    /// 3. `now > exp` → `Expired`
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            TokenError::Invalid
        })?;

        if data.claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }

    /// 토큰을 검증하고 인증 컨텍스트를 반환합니다.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AuthContext, TokenError> {
        let claims = self.decode(token, now)?;
        Ok(AuthContext::new(claims.sub, claims.roles))
    }
}
