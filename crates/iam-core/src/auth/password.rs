//! 비밀번호 해싱.
//!
//! 새 해시는 Argon2id PHC 형식 문자열입니다. 알고리즘, 파라미터, 솔트를 모두
//! 포함하므로 솔트를 따로 저장할 필요가 없습니다.
//!
//! 이전 사용자 파일과의 호환을 위해 werkzeug 형식
//! `pbkdf2:sha256:<iterations>$<salt>$<hex digest>` 해시도 검증할 수 있습니다.
//! 이 형식으로 새 해시를 만들지는 않습니다.

use argon2::{
    password_hash::{
        rand_core::OsRng, Output, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use sha2::Sha256;

use crate::error::PasswordError;

/// werkzeug PBKDF2-HMAC-SHA256 해시 접두사.
const PBKDF2_SHA256_PREFIX: &str = "pbkdf2:sha256:";

/// SHA-256 digest 길이 (바이트).
const PBKDF2_SHA256_LEN: usize = 32;

/// 파싱된 저장 해시.
enum StoredHash<'a> {
    Phc(PasswordHash<'a>),
    Pbkdf2Sha256 {
        iterations: u32,
        salt: &'a str,
        digest: Vec<u8>,
    },
}

impl<'a> StoredHash<'a> {
    fn parse(hash: &'a str) -> Result<Self, PasswordError> {
        if let Some(rest) = hash.strip_prefix(PBKDF2_SHA256_PREFIX) {
            let mut parts = rest.splitn(3, '$');
            let (Some(iterations), Some(salt), Some(digest)) =
                (parts.next(), parts.next(), parts.next())
            else {
                return Err(PasswordError::InvalidHashFormat);
            };

            let iterations: u32 = iterations
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(PasswordError::InvalidHashFormat)?;
            let digest = hex::decode(digest).map_err(|_| PasswordError::InvalidHashFormat)?;
            if salt.is_empty() || digest.len() != PBKDF2_SHA256_LEN {
                return Err(PasswordError::InvalidHashFormat);
            }

            return Ok(Self::Pbkdf2Sha256 {
                iterations,
                salt,
                digest,
            });
        }

        PasswordHash::new(hash)
            .map(Self::Phc)
            .map_err(|_| PasswordError::InvalidHashFormat)
    }
}

/// 비밀번호 해싱.
///
/// 호출마다 새로운 랜덤 솔트를 생성하므로 같은 비밀번호라도 결과가 다릅니다.
///
/// # Example
///
/// ```
/// let hash = iam_core::auth::hash_password("my_password").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::HashingFailed)
}

/// 비밀번호 검증.
///
/// 저장된 해시의 솔트/파라미터로 다시 계산한 뒤 상수 시간 비교합니다.
/// 비밀번호가 틀리거나 해시 형식이 잘못되었으면 `false`를 반환합니다.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match StoredHash::parse(hash) {
        Ok(StoredHash::Phc(parsed)) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Ok(StoredHash::Pbkdf2Sha256 {
            iterations,
            salt,
            digest,
        }) => {
            let mut computed = [0u8; PBKDF2_SHA256_LEN];
            pbkdf2::pbkdf2_hmac::<Sha256>(
                password.as_bytes(),
                salt.as_bytes(),
                iterations,
                &mut computed,
            );

            // Output의 PartialEq는 상수 시간 비교
            match (Output::new(&computed), Output::new(&digest)) {
                (Ok(computed), Ok(expected)) => computed == expected,
                _ => false,
            }
        }
        Err(_) => {
            tracing::warn!("Stored password hash is in an unsupported format");
            false
        }
    }
}

/// 해시 형식만 검사합니다 (비밀번호 비교 없음).
///
/// Argon2 등 PHC 문자열과 werkzeug `pbkdf2:sha256` 형식을 허용합니다.
pub fn check_hash_format(hash: &str) -> Result<(), PasswordError> {
    StoredHash::parse(hash).map(|_| ())
}
