//! 자격증명 저장소 추상화.
//!
//! 핵심 로직은 [`CredentialStore`] trait에만 의존하며 저장 방식은 알지 못합니다.
//! 같은 사용자 이름에 대한 읽기/쓰기는 선형화 가능해야 합니다. 동시에 들어온
//! 회원가입과 로그인이 반쯤 기록된 레코드를 보면 안 됩니다.

use async_trait::async_trait;

use crate::domain::UserRecord;
use crate::error::StoreError;

mod file;
mod memory;

pub use file::JsonFileCredentialStore;
pub use memory::MemoryCredentialStore;

/// 사용자 이름 → 사용자 레코드 저장소.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct RedisCredentialStore {
///     client: redis::Client,
/// }
///
/// #[async_trait]
/// impl CredentialStore for RedisCredentialStore {
///     async fn get(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
///         // HGET users <username>
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 사용자 레코드 조회.
    async fn get(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// 존재하지 않을 때만 삽입합니다. 이미 있으면 `StoreError::AlreadyExists`.
    ///
    /// 존재 확인과 삽입은 하나의 원자적 작업이어야 합니다.
    async fn insert(&self, record: UserRecord) -> Result<(), StoreError>;

    /// 기존 레코드를 교체합니다. 없으면 `StoreError::NotFound`.
    async fn put(&self, record: UserRecord) -> Result<(), StoreError>;

    /// 사용자 이름 존재 여부.
    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.get(username).await?.is_some())
    }

    /// 전체 사용자 목록 (사용자 이름 순).
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// 저장된 사용자 수.
    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.list().await?.len())
    }
}
