//! Qualification gate: is this identity a user of the application at all?

use tracing::debug;

use super::catalog::{ClaimSet, RoleCatalog};
use super::identity::Identity;

/// True iff an identity is present and at least one of its claims is a recognized role.
pub fn is_qualified(catalog: &RoleCatalog, identity: Option<&Identity>) -> bool {
    let Some(identity) = identity else {
        debug!("no authenticated identity on request");
        return false;
    };

    if identity.claims.is_empty() {
        debug!(user_name = %identity.user_name, "identity carries no claims");
        return false;
    }

    debug!(
        user_name = %identity.user_name,
        claims = ?identity.claims,
        "checking claims against role catalog"
    );

    claims_qualify(catalog, &identity.claims)
}

pub fn claims_qualify(catalog: &RoleCatalog, claims: &ClaimSet) -> bool {
    claims.iter().any(|claim| catalog.is_recognized(claim))
}
