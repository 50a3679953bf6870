//! 역할 기반 접근 제어 (RBAC).
//!
//! 역할은 자유 형식 문자열이며, 사용자는 여러 역할을 가질 수 있습니다.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// 신규 사용자에게 부여되는 기본 역할.
pub const ROLE_USER: &str = "user";

/// 관리자 역할.
pub const ROLE_ADMIN: &str = "admin";

/// 역할 집합.
///
/// 정렬된 집합이므로 JSON 직렬화 결과가 항상 같은 순서를 가집니다.
/// 빈 문자열이나 공백만 있는 역할은 들어가지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// 빈 역할 집합.
    pub fn new() -> Self {
        Self::default()
    }

    /// 기본 사용자 역할 집합 (`{"user"}`).
    pub fn default_user() -> Self {
        [ROLE_USER].into_iter().collect()
    }

    /// 관리자 역할 집합 (`{"user", "admin"}`).
    pub fn administrator() -> Self {
        [ROLE_USER, ROLE_ADMIN].into_iter().collect()
    }

    /// 역할 추가. 앞뒤 공백은 제거되며 빈 역할은 무시됩니다.
    pub fn insert(&mut self, role: impl AsRef<str>) -> bool {
        let role = role.as_ref().trim();
        if role.is_empty() {
            return false;
        }
        self.0.insert(role.to_string())
    }

    /// 특정 역할 보유 여부.
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// 두 집합의 교집합이 비어 있지 않은지 확인합니다.
    pub fn intersects(&self, other: &RoleSet) -> bool {
        self.0.iter().any(|role| other.0.contains(role))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// 역할 목록을 벡터로 반환 (정렬됨).
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = RoleSet::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

// 역직렬화도 `insert`의 정규화(trim, 빈 역할 제거)를 거친다
impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(|roles| roles.into_iter().collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(","))
    }
}
