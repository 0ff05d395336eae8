pub mod catalog;
pub mod decider;
pub mod identity;
pub mod provision;
pub mod reconciler;
pub mod resolver;
pub mod store;
pub mod sync;

pub use catalog::{ClaimSet, Permission, PermissionSet, RecognizedRole, ResolvedRole, RoleCatalog};
pub use identity::Identity;
pub use store::{UserRecord, UserStore};
pub use sync::{RoleSyncService, SkipReason, SyncOutcome};
