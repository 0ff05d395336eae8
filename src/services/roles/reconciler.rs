//! Computes the permission set a record must hold for a resolved role.
//!
//! Pure: the caller persists the result when `changed` is true.

use super::catalog::{PermissionSet, ResolvedRole, RoleCatalog};
use super::store::UserRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Full replacement for `record.permissions` (never merged with the current set).
    pub permissions: PermissionSet,
    pub changed: bool,
}

impl Reconciliation {
    /// Overwrite the record's permissions. Returns whether the record was modified.
    pub fn apply(self, record: &mut UserRecord) -> bool {
        if self.changed {
            record.permissions = self.permissions;
        }
        self.changed
    }
}

pub fn reconcile(catalog: &RoleCatalog, role: ResolvedRole, record: &UserRecord) -> Reconciliation {
    let permissions = catalog.target_for(role);
    let changed = permissions != record.permissions;

    Reconciliation {
        permissions,
        changed,
    }
}
