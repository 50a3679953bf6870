//! 도메인 모델.

mod roles;
mod user;

pub use roles::{RoleSet, ROLE_ADMIN, ROLE_USER};
pub use user::{AuthContext, UserRecord, UserSummary};
