//! 설정 관리.
//!
//! 서명 비밀 키, 토큰 TTL, 자격증명 저장소 위치 등 프로세스 설정을 정의합니다.
//! 설정은 시작 시 한 번 로드되어 `Arc`로 공유되며 이후 변경되지 않습니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Duration;
use config::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// 기본 토큰 TTL (1시간).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// 허용하는 최대 토큰 TTL (365일).
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;

/// 환경 변수 접두사 (`IAM__AUTH__SECRET` 형식).
pub const ENV_PREFIX: &str = "IAM";

/// 애플리케이션 설정.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 토큰 발급/검증 설정
    pub auth: AuthConfig,
    /// 자격증명 저장소 설정
    pub storage: StorageConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// 토큰 발급/검증 설정.
///
/// 비밀 키는 `SecretString`으로 보관되어 `Debug` 출력에 노출되지 않습니다.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    secret: SecretString,
    /// 토큰 유효 기간
    pub token_ttl: Duration,
}

impl AuthConfig {
    /// 새 인증 설정 생성 (TTL은 기본값 1시간).
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into().into()),
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS as i64),
        }
    }

    /// 토큰 TTL 설정.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// 서명 비밀 키 바이트.
    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}

/// 자격증명 저장소 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON 파일 저장소
    #[default]
    File,
    /// 프로세스 메모리 저장소 (재시작 시 초기화)
    Memory,
}

/// 자격증명 저장소 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// 저장소 종류
    #[serde(default)]
    pub backend: StorageBackend,
    /// 사용자 JSON 파일 경로
    pub users_db: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            users_db: PathBuf::from("users.json"),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 역직렬화 전용 중간 구조체. 비밀 키를 검증한 뒤 `AppConfig`로 변환합니다.
#[derive(Deserialize)]
struct RawConfig {
    server: ServerConfig,
    auth: RawAuthConfig,
    storage: StorageConfig,
    logging: LoggingConfig,
}

#[derive(Deserialize)]
struct RawAuthConfig {
    #[serde(default)]
    secret: String,
    token_ttl_secs: u64,
}

impl AppConfig {
    /// 기본값으로 설정 생성 (테스트 및 임베딩용).
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            server: ServerConfig::default(),
            auth,
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// 파일(선택)과 프로세스 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    /// 주어진 환경 변수 맵으로 설정을 로드합니다.
    ///
    /// 우선순위 (높은 순): `IAM__*` 변수, 설정 파일, 레거시 변수
    /// (`SECRET_KEY`, `JWT_EXPIRATION_HOURS`, `USERS_DB`), 내장 기본값.
    pub fn load_with_env(
        path: Option<&Path>,
        env: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let legacy_ttl = env
            .get("JWT_EXPIRATION_HOURS")
            .and_then(|h| h.parse::<u64>().ok())
            .map(|hours| hours.saturating_mul(3600))
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let legacy_secret = env.get("SECRET_KEY").cloned().unwrap_or_default();
        let legacy_db = env
            .get("USERS_DB")
            .cloned()
            .unwrap_or_else(|| "users.json".to_string());

        let mut builder = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("auth.secret", legacy_secret)?
            .set_default("auth.token_ttl_secs", legacy_ttl)?
            .set_default("storage.backend", "file")?
            .set_default("storage.users_db", legacy_db)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(Some(env)),
        );

        let raw: RawConfig = builder.build()?.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.auth.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "signing secret is not configured (set IAM__AUTH__SECRET or SECRET_KEY)"
                    .to_string(),
            ));
        }
        if raw.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Message(
                "auth.token_ttl_secs must be greater than zero".to_string(),
            ));
        }

        if raw.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Message(format!(
                "auth.token_ttl_secs must not exceed {MAX_TOKEN_TTL_SECS}"
            )));
        }

        let ttl = Duration::seconds(raw.auth.token_ttl_secs as i64);
        Ok(Self {
            server: raw.server,
            auth: AuthConfig::new(raw.auth.secret).with_ttl(ttl),
            storage: raw.storage,
            logging: raw.logging,
        })
    }
}
