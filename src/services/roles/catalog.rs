//! Recognized external roles and the permission set each one grants.
//!
//! Responsibility:
//! - Fixed vocabulary of local permissions (`Permission` / `PermissionSet`)
//! - Fixed set of recognized roles and their precedence
//! - Mapping: claim identifier -> `RecognizedRole` -> `PermissionSet`
//!
//! The catalog is built once at startup (claim identifiers come from `Config`)
//! and shared read-only via `Arc<RoleCatalog>`.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role claims asserted by the identity provider for one request.
pub type ClaimSet = HashSet<String>;

/// Local capability a user record may hold.
///
/// The string form (`as_str`) is what the user store persists and what the API returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Admin,
    Settings,
    Download,
    Upload,
    Playlist,
    CoverArt,
    Comment,
    Podcast,
    Stream,
    Jukebox,
    Share,
}

impl Permission {
    pub const ALL: [Permission; 11] = [
        Permission::Admin,
        Permission::Settings,
        Permission::Download,
        Permission::Upload,
        Permission::Playlist,
        Permission::CoverArt,
        Permission::Comment,
        Permission::Podcast,
        Permission::Stream,
        Permission::Jukebox,
        Permission::Share,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Admin => "admin",
            Permission::Settings => "settings",
            Permission::Download => "download",
            Permission::Upload => "upload",
            Permission::Playlist => "playlist",
            Permission::CoverArt => "cover_art",
            Permission::Comment => "comment",
            Permission::Podcast => "podcast",
            Permission::Stream => "stream",
            Permission::Jukebox => "jukebox",
            Permission::Share => "share",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// Set of permissions. Equality is set equality (order and duplicates are irrelevant).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    /// Stable string form, sorted by declaration order of `Permission`.
    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Permission; N]> for PermissionSet {
    fn from(permissions: [Permission; N]) -> Self {
        permissions.into_iter().collect()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|p| p.as_str()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// External roles this service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizedRole {
    Administrator,
    StandardUser,
    Creator,
}

impl RecognizedRole {
    /// Declaration order. The first role present in a claim set governs.
    pub const PRECEDENCE: [RecognizedRole; 3] = [
        RecognizedRole::Administrator,
        RecognizedRole::StandardUser,
        RecognizedRole::Creator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecognizedRole::Administrator => "administrator",
            RecognizedRole::StandardUser => "standard_user",
            RecognizedRole::Creator => "creator",
        }
    }
}

impl fmt::Display for RecognizedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of role resolution. `Unknown` maps to an empty permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedRole {
    Recognized(RecognizedRole),
    Unknown,
}

impl fmt::Display for ResolvedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedRole::Recognized(role) => role.fmt(f),
            ResolvedRole::Unknown => f.write_str("unknown"),
        }
    }
}

pub const DEFAULT_ADMIN_CLAIM: &str = "APPROLE_Admin";
pub const DEFAULT_USER_CLAIM: &str = "APPROLE_User";
pub const DEFAULT_CREATOR_CLAIM: &str = "APPROLE_Creator";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub claim: String,
    pub role: RecognizedRole,
}

/// Immutable role catalog.
///
/// Entries are always kept in `RecognizedRole::PRECEDENCE` order; only the claim
/// identifiers are configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCatalog {
    entries: [CatalogEntry; 3],
}

impl RoleCatalog {
    pub fn new(
        admin_claim: impl Into<String>,
        user_claim: impl Into<String>,
        creator_claim: impl Into<String>,
    ) -> Self {
        Self {
            entries: [
                CatalogEntry {
                    claim: admin_claim.into(),
                    role: RecognizedRole::Administrator,
                },
                CatalogEntry {
                    claim: user_claim.into(),
                    role: RecognizedRole::StandardUser,
                },
                CatalogEntry {
                    claim: creator_claim.into(),
                    role: RecognizedRole::Creator,
                },
            ],
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn claim_for(&self, role: RecognizedRole) -> &str {
        self.entries
            .iter()
            .find(|e| e.role == role)
            .map(|e| e.claim.as_str())
            .unwrap_or_default()
    }

    pub fn is_recognized(&self, claim: &str) -> bool {
        self.entries.iter().any(|e| e.claim == claim)
    }

    pub fn permissions_for(&self, role: RecognizedRole) -> PermissionSet {
        use Permission::*;

        match role {
            RecognizedRole::Administrator => PermissionSet::from([
                Admin, Settings, Download, Upload, Playlist, CoverArt, Comment, Podcast, Stream,
                Jukebox, Share,
            ]),
            RecognizedRole::StandardUser => PermissionSet::from([Download, Stream]),
            RecognizedRole::Creator => PermissionSet::from([
                Download, Stream, Upload, Playlist, CoverArt, Comment, Podcast, Share,
            ]),
        }
    }

    /// Target permissions for a resolution result (`Unknown` -> empty).
    pub fn target_for(&self, role: ResolvedRole) -> PermissionSet {
        match role {
            ResolvedRole::Recognized(role) => self.permissions_for(role),
            ResolvedRole::Unknown => PermissionSet::empty(),
        }
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_CLAIM, DEFAULT_USER_CLAIM, DEFAULT_CREATOR_CLAIM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrator_gets_every_permission() {
        let catalog = RoleCatalog::default();
        let perms = catalog.permissions_for(RecognizedRole::Administrator);

        assert_eq!(perms.len(), Permission::ALL.len());
        assert!(Permission::ALL.iter().all(|p| perms.contains(*p)));
    }

    #[test]
    fn standard_user_can_only_download_and_stream() {
        let catalog = RoleCatalog::default();

        assert_eq!(
            catalog.permissions_for(RecognizedRole::StandardUser),
            PermissionSet::from([Permission::Stream, Permission::Download])
        );
    }

    #[test]
    fn creator_has_no_admin_settings_or_jukebox() {
        let catalog = RoleCatalog::default();
        let perms = catalog.permissions_for(RecognizedRole::Creator);

        assert_eq!(perms.len(), 8);
        assert!(!perms.contains(Permission::Admin));
        assert!(!perms.contains(Permission::Settings));
        assert!(!perms.contains(Permission::Jukebox));
    }

    #[test]
    fn unknown_role_targets_empty_set() {
        let catalog = RoleCatalog::default();
        assert!(catalog.target_for(ResolvedRole::Unknown).is_empty());
    }

    #[test]
    fn entries_follow_precedence_order() {
        let catalog = RoleCatalog::new("a", "u", "c");
        let roles: Vec<_> = catalog.entries().iter().map(|e| e.role).collect();

        assert_eq!(roles, RecognizedRole::PRECEDENCE.to_vec());
        assert_eq!(catalog.claim_for(RecognizedRole::Creator), "c");
        assert!(catalog.is_recognized("u"));
        assert!(!catalog.is_recognized("APPROLE_User"));
    }

    #[test]
    fn permission_string_form_round_trips_for_vocabulary() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>(), Ok(p));
        }
        assert!("everything".parse::<Permission>().is_err());
    }

    #[test]
    fn permission_set_equality_ignores_duplicates_and_order() {
        let a: PermissionSet = [Permission::Stream, Permission::Download, Permission::Stream]
            .into_iter()
            .collect();
        let b = PermissionSet::from([Permission::Download, Permission::Stream]);

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[download, stream]");
    }
}
