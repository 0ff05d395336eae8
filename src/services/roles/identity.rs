use super::catalog::ClaimSet;

/// Authenticated identity as asserted by the identity provider for the current request.
///
/// Built by the access-token middleware and passed explicitly into the role sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_name: String,
    pub claims: ClaimSet,
}

impl Identity {
    pub fn new<I, S>(user_name: impl Into<String>, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_name: user_name.into(),
            claims: claims.into_iter().map(Into::into).collect(),
        }
    }
}
