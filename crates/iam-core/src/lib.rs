//! # IAM Core
//!
//! 사용자 등록, 인증, 토큰 발급, 역할 기반 접근 제어의 핵심 로직을 제공합니다.
//! HTTP 계층에 의존하지 않습니다.
//!
//! - 비밀번호 해싱 (Argon2id)
//! - HS256 토큰 발급/검증
//! - 접근 가드 (Bearer 추출 + 역할 검사)
//! - 자격증명 저장소 trait 및 구현 (메모리, JSON 파일)
//! - 설정 관리
//! - 로깅 인프라

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod service;
pub mod store;

pub use config::{AppConfig, AuthConfig, StorageBackend};
pub use domain::{AuthContext, RoleSet, UserRecord, UserSummary, ROLE_ADMIN, ROLE_USER};
pub use error::{IamError, IamResult, PasswordError, StoreError, TokenError};
pub use service::IdentityService;
pub use store::{CredentialStore, JsonFileCredentialStore, MemoryCredentialStore};
