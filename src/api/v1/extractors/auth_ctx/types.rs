/*
 * Responsibility
 * - Handler / middleware から見える「認証済みコンテキスト」の型
 * - access middleware が検証して request extensions に格納する
 *
 * Notes
 * - JWT の検証ロジックは middleware/services 側の責務
 * - role claim -> permission の同期は role_sync middleware が identity を読んで行う
 */
use crate::services::roles::Identity;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `identity` は user name と role claim (prefix 付き) の組
/// - `jti` は監査/相関用
#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub identity: Identity,
    pub jti: Option<String>,
}

impl AuthCtx {
    pub fn new(identity: Identity, jti: Option<String>) -> Self {
        Self { identity, jti }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn user_name(&self) -> &str {
        &self.identity.user_name
    }
}
