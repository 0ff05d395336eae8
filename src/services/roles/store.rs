//! User store interface used by the role sync.
use async_trait::async_trait;
use uuid::Uuid;

use super::catalog::PermissionSet;
use crate::repos::error::RepoResult;

/// Local user record as the role sync sees it.
///
/// Store-owned attributes (password hash, note, timestamps) stay in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub user_name: String,
    pub permissions: PermissionSet,
}

/// Persistence for local user records, keyed by user name.
///
/// Implementations must give at least last-writer-wins semantics per record.
#[async_trait]
pub trait UserStore: Send + Sync {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn find_by_user_name(&self, user_name: &str) -> RepoResult<Option<UserRecord>>;

    // Create a record with no permissions. `initial_password` is the plaintext credential;
    // the store decides how it is kept.
    async fn create(
        &self,
        user_name: &str,
        initial_password: &str,
        note: &str,
    ) -> RepoResult<UserRecord>;

    // Overwrite the stored permission set of `record.user_name`.
    async fn update(&self, record: &UserRecord) -> RepoResult<()>;
}
