/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("invalid stored value: {0}")]
    InvalidValue(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

pub type RepoResult<T> = Result<T, RepoError>;
