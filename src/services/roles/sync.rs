//! Per-request role synchronization.
//!
//! Flow:
//! 1. no identity / no recognized claim -> skip (no store access)
//! 2. resolve the governing role
//! 3. load the local record (optionally provision it)
//! 4. reconcile and persist when the permission set differs
//!
//! Every failure is logged and folded into `SyncOutcome::Failed`; nothing here
//! may stop the request from being forwarded.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::catalog::{PermissionSet, ResolvedRole, RoleCatalog};
use super::decider::is_qualified;
use super::identity::Identity;
use super::provision::{generate_initial_password, provisioning_note};
use super::reconciler::reconcile;
use super::resolver::resolve;
use super::store::{UserRecord, UserStore};
use crate::repos::error::RepoResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingIdentity,
    NotQualified,
    UnknownUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    Unchanged {
        role: ResolvedRole,
    },
    Updated {
        role: ResolvedRole,
        permissions: PermissionSet,
    },
    Failed,
}

#[derive(Clone)]
pub struct RoleSyncService {
    catalog: Arc<RoleCatalog>,
    store: Arc<dyn UserStore>,
    auto_provision: bool,
}

impl std::fmt::Debug for RoleSyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleSyncService")
            .field("catalog", &self.catalog)
            .field("store", &self.store.backend_name())
            .field("auto_provision", &self.auto_provision)
            .finish()
    }
}

impl RoleSyncService {
    pub fn new(catalog: Arc<RoleCatalog>, store: Arc<dyn UserStore>, auto_provision: bool) -> Self {
        Self {
            catalog,
            store,
            auto_provision,
        }
    }

    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    /// Bring the local record of `identity` in line with its role claims.
    ///
    /// Never fails; the outcome is informational.
    pub async fn sync(&self, identity: Option<&Identity>) -> SyncOutcome {
        let Some(identity) = identity else {
            return SyncOutcome::Skipped(SkipReason::MissingIdentity);
        };

        if !is_qualified(&self.catalog, Some(identity)) {
            debug!(user_name = %identity.user_name, "identity has no recognized role");
            return SyncOutcome::Skipped(SkipReason::NotQualified);
        }

        let role = resolve(&self.catalog, &identity.claims);
        if role == ResolvedRole::Unknown {
            warn!(
                user_name = %identity.user_name,
                claims = ?identity.claims,
                "qualified identity resolved to no role; clearing permissions"
            );
        }

        match self.sync_record(identity, role).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    user_name = %identity.user_name,
                    store = self.store.backend_name(),
                    error = %err,
                    "role sync abandoned"
                );
                SyncOutcome::Failed
            }
        }
    }

    async fn sync_record(&self, identity: &Identity, role: ResolvedRole) -> RepoResult<SyncOutcome> {
        let user_name = identity.user_name.as_str();

        let mut record = match self.store.find_by_user_name(user_name).await? {
            Some(record) => record,
            None if self.auto_provision => self.create_user(user_name).await?,
            None => {
                debug!(user_name, "no local user record; skipping role sync");
                return Ok(SyncOutcome::Skipped(SkipReason::UnknownUser));
            }
        };

        let reconciliation = reconcile(&self.catalog, role, &record);
        if !reconciliation.apply(&mut record) {
            debug!(user_name, %role, "permissions already up to date");
            return Ok(SyncOutcome::Unchanged { role });
        }

        self.store.update(&record).await?;
        info!(
            user_name,
            %role,
            permissions = %record.permissions,
            "updated user permissions"
        );

        Ok(SyncOutcome::Updated {
            role,
            permissions: record.permissions,
        })
    }

    /// Make sure a local record exists for `user_name`, creating one with a random credential.
    pub async fn ensure_user(&self, user_name: &str) -> RepoResult<UserRecord> {
        if let Some(record) = self.store.find_by_user_name(user_name).await? {
            debug!(user_name, "user exists in the store");
            return Ok(record);
        }
        self.create_user(user_name).await
    }

    async fn create_user(&self, user_name: &str) -> RepoResult<UserRecord> {
        let password = generate_initial_password();
        let record = self
            .store
            .create(user_name, &password, &provisioning_note(user_name))
            .await?;

        info!(user_name, "provisioned local user");
        Ok(record)
    }
}
