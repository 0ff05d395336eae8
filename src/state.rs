/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: auth: AuthService, role_sync: RoleSyncService
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{auth::AuthService, roles::RoleSyncService};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub role_sync: Arc<RoleSyncService>,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, role_sync: Arc<RoleSyncService>) -> Self {
        Self { auth, role_sync }
    }
}
