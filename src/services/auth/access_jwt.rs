use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::services::roles::{ClaimSet, Identity};

// Errors returned by access-token verification + strict claim validation.
#[derive(Debug, Error)]
pub enum AccessJwtError {
    #[error("invalid ed25519 public key pem: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("missing or invalid 'aud' claim")]
    MissingOrInvalidAud,
    #[error("empty '{0}' claim")]
    EmptyClaim(&'static str),
}

fn aud_is_present_and_valid(aud: &serde_json::Value) -> bool {
    match aud {
        // Typical: aud is a string
        serde_json::Value::String(s) => !s.trim().is_empty(),
        // Also valid: aud is an array of strings
        serde_json::Value::Array(arr) => arr.iter().any(|v| match v {
            serde_json::Value::String(s) => !s.trim().is_empty(),
            _ => false,
        }),
        // Missing claim ends up as Null due to #[serde(default)]
        _ => false,
    }
}

/// Access token (JWT) claims as issued by the identity provider.
///
/// NOTE:
/// - `aud` in JWT can be either string or array; jsonwebtoken validates it via `Validation::set_audience`.
/// - `roles` carries the app roles assigned to the user (e.g. `Admin`, `User`, `Creator`).
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    // Keep as Value to accept both string and array. Validation handles audience checks.
    #[serde(default)]
    pub aud: serde_json::Value,

    pub sub: String,
    pub exp: u64,

    #[serde(default)]
    pub nbf: Option<u64>,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub jti: Option<String>,

    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// AuthService が返す「検証済み・アプリ側で使う型」
///
/// - user name は `preferred_username`、無ければ `sub`
/// - role claim には `role_claim_prefix` を付けて ClaimSet にする
#[derive(Debug, Clone)]
pub struct VerifiedAccessToken {
    pub identity: Identity,
    pub jti: Option<String>,
}

/// EdDSA (Ed25519) access-token verifier.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
    role_claim_prefix: String,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("AuthService")
            .field("validation", &self.validation)
            .field("role_claim_prefix", &self.role_claim_prefix)
            .finish()
    }
}

impl AuthService {
    pub fn new(
        access_public_key_pem: &str,
        issuer: &str,
        audience: &str,
        leeway_seconds: u64,
        role_claim_prefix: impl Into<String>,
    ) -> Result<Self, AccessJwtError> {
        let decoding_key = DecodingKey::from_ed_pem(access_public_key_pem.as_bytes())
            .map_err(AccessJwtError::InvalidKey)?;

        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.leeway = leeway_seconds;

        Ok(Self {
            decoding_key,
            validation,
            role_claim_prefix: role_claim_prefix.into(),
        })
    }

    // Verify and decode a JWT access token.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Verify + strict claim validation.
    ///
    /// `jsonwebtoken::Validation` already checks signature, `exp`, `iss` and `aud`.
    /// This method additionally requires `iss`, `aud`, `sub`, `exp` to be non-empty.
    pub fn verify_strict(&self, token: &str) -> Result<AccessTokenClaims, AccessJwtError> {
        let claims = self.verify(token)?;

        if claims.iss.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("iss"));
        }
        if claims.sub.trim().is_empty() {
            return Err(AccessJwtError::EmptyClaim("sub"));
        }
        if claims.exp == 0 {
            return Err(AccessJwtError::EmptyClaim("exp"));
        }
        if !aud_is_present_and_valid(&claims.aud) {
            return Err(AccessJwtError::MissingOrInvalidAud);
        }

        Ok(claims)
    }

    /// Verify, then turn the claims into the identity the role sync works with.
    ///
    /// This is the recommended entry-point for middleware.
    pub fn verify_identity(&self, token: &str) -> Result<VerifiedAccessToken, AccessJwtError> {
        let claims = self.verify_strict(token)?;

        let user_name = claims
            .preferred_username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(claims.sub);

        Ok(VerifiedAccessToken {
            identity: Identity {
                user_name,
                claims: self.role_claims(claims.roles.unwrap_or_default()),
            },
            jti: claims.jti,
        })
    }

    // App role `Admin` -> claim `APPROLE_Admin` (with the default prefix).
    pub fn role_claims(&self, roles: impl IntoIterator<Item = String>) -> ClaimSet {
        roles
            .into_iter()
            .filter(|role| !role.trim().is_empty())
            .map(|role| format!("{}{}", self.role_claim_prefix, role))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn roles_are_prefixed_into_claims() {
        let token = sign(&claims("alice", &["Admin", "User"]));
        let verified = auth_service().verify_identity(&token).unwrap();

        assert_eq!(verified.identity.user_name, "alice");
        assert_eq!(
            verified.identity.claims,
            ClaimSet::from(["APPROLE_Admin".to_string(), "APPROLE_User".to_string()])
        );
        assert_eq!(verified.jti.as_deref(), Some("token-1"));
    }

    #[test]
    fn preferred_username_wins_over_sub() {
        let mut c = claims("00000000-0000-0000-0000-000000000001", &["User"]);
        c["preferred_username"] = "alice@example.test".into();

        let verified = auth_service().verify_identity(&sign(&c)).unwrap();

        assert_eq!(verified.identity.user_name, "alice@example.test");
    }

    #[test]
    fn missing_roles_claim_gives_empty_claim_set() {
        let mut c = claims("alice", &[]);
        c.as_object_mut().unwrap().remove("roles");

        let verified = auth_service().verify_identity(&sign(&c)).unwrap();

        assert!(verified.identity.claims.is_empty());
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let mut c = claims("alice", &["User"]);
        c["aud"] = "someone-else".into();

        assert!(matches!(
            auth_service().verify_identity(&sign(&c)),
            Err(AccessJwtError::Jwt(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut c = claims("alice", &["User"]);
        c["exp"] = (now() - 600).into();

        assert!(auth_service().verify_identity(&sign(&c)).is_err());
    }

    #[test]
    fn blank_sub_is_rejected() {
        let token = sign(&claims("  ", &["User"]));

        assert!(matches!(
            auth_service().verify_identity(&token),
            Err(AccessJwtError::EmptyClaim("sub"))
        ));
    }

    #[test]
    fn garbage_key_is_rejected_at_construction() {
        let res = AuthService::new("not a pem", ISSUER, AUDIENCE, 0, "APPROLE_");
        assert!(matches!(res, Err(AccessJwtError::InvalidKey(_))));
    }
}
