//! IAM 서비스의 에러 타입.
//!
//! 요청 검증, 자격증명 확인, 토큰 검증, 저장소 접근에서 발생하는 에러를
//! 하나의 분류 체계로 정의합니다. HTTP 상태 코드로의 변환은 API 계층이 담당합니다.

use thiserror::Error;

/// 토큰 인증/인가 실패 사유.
///
/// 외부로는 `Missing`/`Invalid`/`Expired`가 모두 401로 나가지만
/// 내부에서는 원인을 구분할 수 있어야 합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Authorization 헤더가 없거나 `Bearer <token>` 형식이 아님
    #[error("Token is missing!")]
    Missing,
    /// 구조 파싱 실패 또는 서명 불일치
    #[error("Invalid token!")]
    Invalid,
    /// `now > exp`
    #[error("Token has expired!")]
    Expired,
    /// 인증은 되었지만 필요한 역할이 없음
    #[error("Access denied: Insufficient permissions.")]
    Forbidden,
}

impl TokenError {
    /// 외부 응답에 쓰는 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Missing => "MISSING_TOKEN",
            TokenError::Invalid => "INVALID_TOKEN",
            TokenError::Expired => "TOKEN_EXPIRED",
            TokenError::Forbidden => "INSUFFICIENT_PERMISSION",
        }
    }

    /// 인증 단계 실패인지 (인가 실패가 아닌지) 확인합니다.
    pub fn is_authentication_failure(&self) -> bool {
        !matches!(self, TokenError::Forbidden)
    }
}

/// 비밀번호 처리 에러.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("잘못된 해시 형식")]
    InvalidHashFormat,
}

/// 자격증명 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 동일한 사용자 이름이 이미 존재
    #[error("User already exists: {0}")]
    AlreadyExists(String),

    /// 사용자를 찾을 수 없음
    #[error("User not found: {0}")]
    NotFound(String),

    /// 저장 파일 입출력 실패
    #[error("저장소 I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 저장 파일 직렬화/역직렬화 실패
    #[error("저장소 직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// IAM 핵심 에러.
#[derive(Debug, Error)]
pub enum IamError {
    /// 요청 필드 누락 또는 형식 오류
    #[error("{0}")]
    Validation(String),

    /// 사용자 이름 중복
    #[error("User already exists")]
    Conflict,

    /// 로그인 실패 (사용자 존재 여부는 드러내지 않음)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// 관리 작업 대상 사용자가 없음
    #[error("User not found")]
    NotFound,

    /// 토큰 인증/인가 실패
    #[error(transparent)]
    Token(#[from] TokenError),

    /// 저장소 에러
    #[error("저장소 에러: {0}")]
    Store(#[source] StoreError),

    /// 비밀번호 처리 에러
    #[error("비밀번호 처리 에러: {0}")]
    Password(#[from] PasswordError),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl From<StoreError> for IamError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(_) => IamError::Conflict,
            StoreError::NotFound(_) => IamError::NotFound,
            other => IamError::Store(other),
        }
    }
}

/// IAM 작업을 위한 Result 타입.
pub type IamResult<T> = Result<T, IamError>;

impl IamError {
    /// 클라이언트에 원인을 그대로 보여줘도 되는 에러인지 확인합니다.
    ///
    /// 저장소/해싱/내부 에러는 일반 메시지로 대체해야 합니다.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            IamError::Store(_) | IamError::Password(_) | IamError::Internal(_)
        )
    }
}
