//! JSON 파일 기반 자격증명 저장소.
//!
//! 파일 형식은 사용자 레코드의 JSON 배열입니다.
//!
//! ```json
//! [
//!   { "username": "admin", "password_hash": "$argon2id$...", "roles": ["admin", "user"] }
//! ]
//! ```
//!
//! 메모리 사본을 `RwLock`으로 보호하고, 쓰기 잠금을 쥔 상태에서 임시 파일에 기록한 뒤
//! rename으로 교체합니다. 기록이 실패하면 메모리 사본도 바뀌지 않습니다.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::CredentialStore;
use crate::auth::check_hash_format;
use crate::domain::{RoleSet, UserRecord};
use crate::error::StoreError;

/// JSON 파일 저장소.
#[derive(Debug)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl JsonFileCredentialStore {
    /// 저장 파일을 열어 메모리로 로드합니다.
    ///
    /// 파일이 없으면 빈 배열로 새로 만들고, 크기가 0인 파일은 빈 저장소로 취급합니다.
    /// 읽을 수 없거나 JSON 형식이 잘못된 파일은 에러입니다.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let users = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => Self::parse(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "User database not found, creating empty file");
                let empty = BTreeMap::new();
                write_atomically(&path, &empty).await?;
                empty
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        debug!(path = %path.display(), count = users.len(), "User database loaded");

        Ok(Self {
            path,
            users: RwLock::new(users),
        })
    }

    /// 저장 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(bytes: &[u8]) -> Result<BTreeMap<String, UserRecord>, StoreError> {
        let records: Vec<UserRecord> = serde_json::from_slice(bytes)?;

        let mut users = BTreeMap::new();
        for mut record in records {
            if record.roles.is_empty() {
                warn!(username = %record.username, "User without roles, assigning default role");
                record.roles = RoleSet::default_user();
            }
            if let Err(e) = check_hash_format(&record.password_hash) {
                warn!(username = %record.username, error = %e, "Unsupported password hash, user cannot log in");
            }
            match users.entry(record.username.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(_) => {
                    warn!(username = %record.username, "Duplicate user in database, ignoring later entry");
                }
            }
        }
        Ok(users)
    }

    /// 변경된 사본을 기록한 뒤에만 메모리 상태를 교체합니다.
    async fn commit(
        &self,
        users: &mut BTreeMap<String, UserRecord>,
        next: BTreeMap<String, UserRecord>,
    ) -> Result<(), StoreError> {
        write_atomically(&self.path, &next).await?;
        *users = next;
        Ok(())
    }
}

async fn write_atomically(
    path: &Path,
    users: &BTreeMap<String, UserRecord>,
) -> Result<(), StoreError> {
    let records: Vec<&UserRecord> = users.values().collect();
    let bytes = serde_json::to_vec_pretty(&records)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl CredentialStore for JsonFileCredentialStore {
    async fn get(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&record.username) {
            return Err(StoreError::AlreadyExists(record.username));
        }

        let mut next = users.clone();
        next.insert(record.username.clone(), record);
        self.commit(&mut users, next).await
    }

    async fn put(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&record.username) {
            return Err(StoreError::NotFound(record.username));
        }

        let mut next = users.clone();
        next.insert(record.username.clone(), record);
        self.commit(&mut users, next).await
    }

    async fn exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.users.read().await.contains_key(username))
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.users.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = JsonFileCredentialStore::open(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), "[]");
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "").unwrap();

        let store = JsonFileCredentialStore::open(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonFileCredentialStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.json");

        {
            let store = JsonFileCredentialStore::open(&path).await.unwrap();
            store.insert(UserRecord::new("alice", "hash-a")).await.unwrap();
            store
                .insert(UserRecord::with_roles("root", "hash-r", RoleSet::administrator()))
                .await
                .unwrap();
            let duplicate = store.insert(UserRecord::new("alice", "hash-b")).await;
            assert!(matches!(duplicate, Err(StoreError::AlreadyExists(_))));
        }

        let reopened = JsonFileCredentialStore::open(&path).await.unwrap();
        let users = reopened.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "alice");
        assert_eq!(users[0].password_hash, "hash-a");
        assert_eq!(users[1].roles, RoleSet::administrator());

        // 임시 파일이 남지 않아야 함
        assert!(!dir.path().join("nested").join("users.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_put_persists_role_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");

        let store = JsonFileCredentialStore::open(&path).await.unwrap();
        store.insert(UserRecord::new("alice", "hash")).await.unwrap();
        store
            .put(UserRecord::with_roles("alice", "hash", RoleSet::administrator()))
            .await
            .unwrap();

        let reopened = JsonFileCredentialStore::open(&path).await.unwrap();
        let alice = reopened.get("alice").await.unwrap().unwrap();
        assert!(alice.roles.contains("admin"));
    }

    #[tokio::test]
    async fn test_duplicate_username_keeps_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            r#"[
                {"username": "a", "password_hash": "first", "roles": ["user"]},
                {"username": "a", "password_hash": "second", "roles": ["user", "admin"]}
            ]"#,
        )
        .unwrap();

        let store = JsonFileCredentialStore::open(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);

        let a = store.get("a").await.unwrap().unwrap();
        assert_eq!(a.password_hash, "first");
        assert_eq!(a.roles, RoleSet::default_user());
    }

    #[tokio::test]
    async fn test_legacy_file_with_empty_roles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            r#"[
                {"username": "old", "password_hash": "x", "roles": []},
                {"username": "blank", "password_hash": "x", "roles": [" ", ""]}
            ]"#,
        )
        .unwrap();

        let store = JsonFileCredentialStore::open(&path).await.unwrap();
        let old = store.get("old").await.unwrap().unwrap();
        assert_eq!(old.roles, RoleSet::default_user());
        let blank = store.get("blank").await.unwrap().unwrap();
        assert_eq!(blank.roles, RoleSet::default_user());
        assert_eq!(store.path(), path.as_path());
    }
}
