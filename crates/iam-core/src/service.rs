//! 회원가입, 로그인, 사용자 관리 서비스.
//!
//! 흐름:
//! - 회원가입: 비밀번호 해싱 → 저장소 삽입
//! - 로그인: 저장소 조회 + 비밀번호 검증 → 토큰 발급

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, TokenIssuer};
use crate::domain::{RoleSet, UserRecord, UserSummary};
use crate::error::{IamError, IamResult, StoreError};
use crate::store::CredentialStore;

/// 저장소가 비어 있을 때 생성되는 관리자 계정 이름.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// 기본 관리자 비밀번호. 운영 전에 반드시 바꿔야 합니다.
pub const DEFAULT_ADMIN_PASSWORD: &str = "adminpassword";

/// 존재하지 않는 사용자 로그인 시에도 같은 비용의 검증을 수행하기 위한 해시.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("timing-equalizer").unwrap_or_default())
}

/// 사용자 인증 서비스.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
}

impl IdentityService {
    pub fn new(store: Arc<dyn CredentialStore>, issuer: TokenIssuer) -> Self {
        Self { store, issuer }
    }

    /// 자격증명 저장소.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// 신규 사용자 등록 (기본 역할 `user`).
    pub async fn register(&self, username: &str, password: &str) -> IamResult<UserSummary> {
        validate_credentials(username, password)?;

        // 해싱 전에 빠르게 중복을 거른다. 최종 판정은 insert가 원자적으로 한다.
        if self.store.exists(username).await? {
            return Err(IamError::Conflict);
        }

        let password_hash = hash_blocking(password.to_string()).await?;
        let record = UserRecord::new(username, password_hash);
        let summary = record.summary();

        self.store.insert(record).await?;
        info!(username = %username, "User registered");

        Ok(summary)
    }

    /// 로그인 후 토큰 발급.
    ///
    /// 존재하지 않는 사용자와 틀린 비밀번호는 같은 에러를 반환합니다.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> IamResult<String> {
        validate_credentials(username, password)?;

        let user = self.store.get(username).await?;
        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| dummy_hash().to_string());

        let password_ok = verify_blocking(password.to_string(), stored_hash).await?;

        let user = match user {
            Some(user) if password_ok => user,
            _ => {
                warn!(username = %username, "Login rejected");
                return Err(IamError::InvalidCredentials);
            }
        };

        let token = self.issuer.issue(&user.username, &user.roles, now)?;
        info!(username = %user.username, roles = %user.roles, "Login succeeded");

        Ok(token)
    }

    /// 전체 사용자 목록 (해시 제외).
    pub async fn list_users(&self) -> IamResult<Vec<UserSummary>> {
        let users = self.store.list().await?;
        Ok(users.iter().map(UserRecord::summary).collect())
    }

    /// 관리자 작업: 사용자 역할 교체.
    ///
    /// 이미 발급된 토큰의 역할은 바뀌지 않습니다.
    pub async fn update_roles(&self, username: &str, roles: RoleSet) -> IamResult<UserSummary> {
        if roles.is_empty() {
            return Err(IamError::Validation("At least one role is required".into()));
        }

        let mut user = self.store.get(username).await?.ok_or(IamError::NotFound)?;
        user.roles = roles;
        let summary = user.summary();
        self.store.put(user).await?;

        info!(username = %username, roles = %summary.roles, "User roles updated");
        Ok(summary)
    }

    /// 저장소가 비어 있으면 기본 관리자 계정을 생성합니다.
    ///
    /// 생성했으면 `true`.
    pub async fn ensure_default_admin(&self) -> IamResult<bool> {
        if self.store.count().await? > 0 {
            return Ok(false);
        }

        let password_hash = hash_blocking(DEFAULT_ADMIN_PASSWORD.to_string()).await?;
        let admin = UserRecord::with_roles(
            DEFAULT_ADMIN_USERNAME,
            password_hash,
            RoleSet::administrator(),
        );

        match self.store.insert(admin).await {
            Ok(()) => {
                warn!(
                    username = DEFAULT_ADMIN_USERNAME,
                    "No users found. Created default admin user with the built-in password. PLEASE CHANGE IT!"
                );
                Ok(true)
            }
            Err(StoreError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_credentials(username: &str, password: &str) -> IamResult<()> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(IamError::Validation(
            "Username and password are required".into(),
        ));
    }
    Ok(())
}

async fn hash_blocking(password: String) -> IamResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| IamError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(IamError::from)
}

async fn verify_blocking(password: String, hash: String) -> IamResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| IamError::Internal(format!("verification task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenVerifier;
    use crate::config::AuthConfig;
    use crate::domain::{ROLE_ADMIN, ROLE_USER};
    use crate::store::MemoryCredentialStore;

    fn setup() -> (IdentityService, TokenVerifier) {
        let config = AuthConfig::new("service-test-secret-key-minimum-32");
        let store = Arc::new(MemoryCredentialStore::new());
        (
            IdentityService::new(store, TokenIssuer::new(&config)),
            TokenVerifier::new(&config),
        )
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, verifier) = setup();

        let summary = service.register("alice", "pw1").await.unwrap();
        assert_eq!(summary.username, "alice");
        assert_eq!(summary.roles, RoleSet::default_user());

        let now = Utc::now();
        let token = service.login("alice", "pw1", now).await.unwrap();
        let ctx = verifier.verify(&token, now).unwrap();
        assert_eq!(ctx.subject, "alice");
        assert!(ctx.roles.contains(ROLE_USER));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let (service, _) = setup();
        service.register("alice", "plain-pw").await.unwrap();

        let record = service.store().get("alice").await.unwrap().unwrap();
        assert_ne!(record.password_hash, "plain-pw");
        assert!(verify_password("plain-pw", &record.password_hash));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let (service, _) = setup();
        service.register("alice", "pw1").await.unwrap();

        let second = service.register("alice", "other").await;
        assert!(matches!(second, Err(IamError::Conflict)));
        assert_eq!(service.store().count().await.unwrap(), 1);

        // 첫 비밀번호가 유지됨
        assert!(service.login("alice", "pw1", Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_with_werkzeug_pbkdf2_hash() {
        let (service, verifier) = setup();
        // hashlib.pbkdf2_hmac("sha256", b"adminpassword", b"q1w2e3r4", 2000).hex()
        let migrated = UserRecord::with_roles(
            "legacy",
            "pbkdf2:sha256:2000$q1w2e3r4$ce9d978cd294438657ded0b68a284c57706c9b2842d0316850a4e77ab0896e4d",
            RoleSet::administrator(),
        );
        service.store().insert(migrated).await.unwrap();

        let now = Utc::now();
        let token = service.login("legacy", "adminpassword", now).await.unwrap();
        assert!(verifier.verify(&token, now).unwrap().roles.contains(ROLE_ADMIN));

        assert!(matches!(
            service.login("legacy", "wrong", now).await,
            Err(IamError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let (service, _) = setup();
        assert!(matches!(service.register("", "pw").await, Err(IamError::Validation(_))));
        assert!(matches!(service.register("bob", "").await, Err(IamError::Validation(_))));
        assert!(matches!(
            service.login("  ", "pw", Utc::now()).await,
            Err(IamError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = setup();
        service.register("alice", "pw1").await.unwrap();

        let wrong_password = service.login("alice", "wrong", Utc::now()).await.unwrap_err();
        let unknown_user = service.login("nobody", "pw1", Utc::now()).await.unwrap_err();

        assert!(matches!(wrong_password, IamError::InvalidCredentials));
        assert!(matches!(unknown_user, IamError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_default_admin_seeded_once() {
        let (service, verifier) = setup();

        assert!(service.ensure_default_admin().await.unwrap());
        assert!(!service.ensure_default_admin().await.unwrap());
        assert_eq!(service.store().count().await.unwrap(), 1);

        let now = Utc::now();
        let token = service
            .login(DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD, now)
            .await
            .unwrap();
        let ctx = verifier.verify(&token, now).unwrap();
        assert!(ctx.roles.contains(ROLE_ADMIN));
        assert!(ctx.roles.contains(ROLE_USER));
    }

    #[tokio::test]
    async fn test_no_admin_seed_when_users_exist() {
        let (service, _) = setup();
        service.register("alice", "pw1").await.unwrap();

        assert!(!service.ensure_default_admin().await.unwrap());
        assert!(!service.store().exists(DEFAULT_ADMIN_USERNAME).await.unwrap());
    }

    #[tokio::test]
    async fn test_role_change_does_not_affect_issued_token() {
        let (service, verifier) = setup();
        service.register("alice", "pw1").await.unwrap();

        let now = Utc::now();
        let before = service.login("alice", "pw1", now).await.unwrap();

        let promoted = service
            .update_roles("alice", RoleSet::administrator())
            .await
            .unwrap();
        assert!(promoted.roles.contains(ROLE_ADMIN));

        // 기존 토큰은 발급 시점 역할 유지
        let old_ctx = verifier.verify(&before, now).unwrap();
        assert!(!old_ctx.roles.contains(ROLE_ADMIN));

        // 새 토큰은 새 역할 반영
        let after = service.login("alice", "pw1", now).await.unwrap();
        assert!(verifier.verify(&after, now).unwrap().roles.contains(ROLE_ADMIN));
    }

    #[tokio::test]
    async fn test_update_roles_errors() {
        let (service, _) = setup();
        service.register("alice", "pw1").await.unwrap();

        assert!(matches!(
            service.update_roles("alice", RoleSet::new()).await,
            Err(IamError::Validation(_))
        ));
        assert!(matches!(
            service.update_roles("ghost", RoleSet::default_user()).await,
            Err(IamError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_users_sorted_without_hashes() {
        let (service, _) = setup();
        service.register("bob", "pw").await.unwrap();
        service.register("alice", "pw").await.unwrap();

        let users = service.list_users().await.unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }
}
