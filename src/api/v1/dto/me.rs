/*
 * Responsibility
 * - GET /me の response DTO
 */
use serde::Serialize;
use uuid::Uuid;

use crate::services::roles::{PermissionSet, UserRecord};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub user_name: String,
    pub permissions: PermissionSet,
}

impl From<UserRecord> for MeResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            user_name: record.user_name,
            permissions: record.permissions,
        }
    }
}
