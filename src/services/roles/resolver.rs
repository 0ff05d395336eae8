//! Picks the single governing role from a claim set.

use super::catalog::{ClaimSet, ResolvedRole, RoleCatalog};

/// First catalog entry (in declaration order) whose identifier is present in `claims`.
///
/// The order of `claims` never matters. No match yields `ResolvedRole::Unknown`.
pub fn resolve(catalog: &RoleCatalog, claims: &ClaimSet) -> ResolvedRole {
    catalog
        .entries()
        .iter()
        .find(|entry| claims.contains(entry.claim.as_str()))
        .map(|entry| ResolvedRole::Recognized(entry.role))
        .unwrap_or(ResolvedRole::Unknown)
}
