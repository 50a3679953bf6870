//! 인증 및 권한 부여.
//!
//! JWT 기반 인증 및 역할 기반 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`hash_password`] / [`verify_password`]: Argon2id 비밀번호 해싱
//! - [`TokenIssuer`]: 서명된 시간 제한 토큰 발급
//! - [`TokenVerifier`]: 서명/만료 검증 후 [`AuthContext`](crate::domain::AuthContext) 추출
//! - [`AccessGuard`]: 토큰 검증 + 요구 역할 검사
//!
//! 토큰에 담긴 역할은 발급 시점의 스냅샷입니다. 발급 이후 역할을 회수해도
//! 이미 발급된 토큰은 만료될 때까지 그 역할을 유지합니다.
//!
//! # 사용 예시
//!
//! ```
//! use chrono::Utc;
//! use iam_core::auth::{AccessGuard, TokenIssuer, TokenVerifier};
//! use iam_core::config::AuthConfig;
//! use iam_core::domain::RoleSet;
//!
//! let config = AuthConfig::new("doc-example-secret");
//! let issuer = TokenIssuer::new(&config);
//! let guard = AccessGuard::new(TokenVerifier::new(&config));
//!
//! let now = Utc::now();
//! let token = issuer.issue("alice", &RoleSet::default_user(), now).unwrap();
//! let header = format!("Bearer {}", token);
//! let ctx = guard.authenticate(Some(&header), now).unwrap();
//! assert_eq!(ctx.subject, "alice");
//! ```

mod guard;
mod password;
mod token;

pub use guard::{extract_bearer, require_any_role, AccessGuard, BEARER_PREFIX};
pub use password::{check_hash_format, hash_password, verify_password};
pub use token::{Claims, TokenIssuer, TokenVerifier};
