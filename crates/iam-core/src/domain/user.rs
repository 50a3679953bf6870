//! 사용자 레코드와 요청 단위 인증 컨텍스트.

use serde::{Deserialize, Serialize};

use super::RoleSet;

/// 저장소에 보관되는 사용자 레코드.
///
/// `password_hash`는 PHC 형식 문자열이며 평문 비밀번호는 어디에도 저장되지 않습니다.
/// 직렬화 형식은 `users.json` 파일 형식과 동일합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// 사용자 이름 (고유 키, 변경 불가)
    pub username: String,
    /// 비밀번호 해시 (솔트/파라미터 포함)
    pub password_hash: String,
    /// 보유 역할 (최소 1개)
    pub roles: RoleSet,
}

impl UserRecord {
    /// 기본 역할(`user`)을 가진 신규 레코드 생성.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self::with_roles(username, password_hash, RoleSet::default_user())
    }

    /// 지정한 역할로 레코드 생성. 빈 역할 집합이면 기본 역할을 부여합니다.
    pub fn with_roles(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        roles: RoleSet,
    ) -> Self {
        let roles = if roles.is_empty() {
            RoleSet::default_user()
        } else {
            roles
        };
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            roles,
        }
    }

    /// 해시를 제외한 공개 요약.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            username: self.username.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// 비밀번호 해시를 제외한 사용자 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub roles: RoleSet,
}

/// 토큰 검증 성공 시 생성되는 요청 단위 인증 컨텍스트.
///
/// 역할은 토큰 발급 시점의 스냅샷입니다. 발급 이후 역할이 바뀌어도
/// 토큰이 만료될 때까지 이 값은 바뀌지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    /// 토큰 주체 (사용자 이름)
    pub subject: String,
    /// 발급 시점 역할
    pub roles: RoleSet,
}

impl AuthContext {
    pub fn new(subject: impl Into<String>, roles: RoleSet) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ROLE_USER;

    #[test]
    fn test_new_user_gets_default_role() {
        let user = UserRecord::new("alice", "$argon2id$dummy");
        assert!(user.roles.contains(ROLE_USER));
        assert_eq!(user.roles.len(), 1);
    }

    #[test]
    fn test_empty_roles_fall_back_to_default() {
        let user = UserRecord::with_roles("bob", "$argon2id$dummy", RoleSet::new());
        assert_eq!(user.roles, RoleSet::default_user());
    }

    #[test]
    fn test_summary_omits_hash() {
        let user = UserRecord::with_roles("root", "secret-hash", RoleSet::administrator());
        let json = serde_json::to_string(&user.summary()).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains(r#""username":"root""#));
    }

    #[test]
    fn test_file_format_compatibility() {
        let json = r#"{
            "username": "admin",
            "password_hash": "pbkdf2:sha256:600000$abc$def",
            "roles": ["user", "admin"]
        }"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.roles, RoleSet::administrator());
    }
}
