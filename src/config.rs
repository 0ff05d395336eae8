/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, Auth 設定, role claim の識別子など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::roles::RoleCatalog;
use crate::services::roles::catalog::{
    DEFAULT_ADMIN_CLAIM, DEFAULT_CREATOR_CLAIM, DEFAULT_USER_CLAIM,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub database_max_connections: u32,

    pub auth_issuer: String,
    pub auth_audience: String,
    pub access_token_leeway_seconds: u64,
    pub access_jwt_public_key_pem: String,

    pub role_claim_prefix: String,
    pub role_admin_claim: String,
    pub role_user_claim: String,
    pub role_creator_claim: String,
    pub auto_provision_users: bool,

    pub http_timeout: Duration,
    pub http_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production, a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = get("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);

        let database_url = required("DATABASE_URL")?;

        let database_max_connections = get("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(5);

        let auth_issuer = required("AUTH_ISSUER")?;
        let auth_audience = required("AUTH_AUDIENCE")?;

        let access_token_leeway_seconds = get("ACCESS_TOKEN_LEEWAY_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let access_jwt_public_key_pem =
            required("ACCESS_JWT_PUBLIC_KEY_PEM")?.replace("\\n", "\n");

        let role_claim_prefix = get("ROLE_CLAIM_PREFIX").unwrap_or_else(|| "APPROLE_".to_string());

        let role_admin_claim =
            get("ROLE_ADMIN_CLAIM").unwrap_or_else(|| DEFAULT_ADMIN_CLAIM.to_string());
        let role_user_claim =
            get("ROLE_USER_CLAIM").unwrap_or_else(|| DEFAULT_USER_CLAIM.to_string());
        let role_creator_claim =
            get("ROLE_CREATOR_CLAIM").unwrap_or_else(|| DEFAULT_CREATOR_CLAIM.to_string());

        {
            let claims = [
                (&role_admin_claim, "ROLE_ADMIN_CLAIM"),
                (&role_user_claim, "ROLE_USER_CLAIM"),
                (&role_creator_claim, "ROLE_CREATOR_CLAIM"),
            ];
            let mut seen = HashSet::new();
            for (claim, key) in claims {
                // identifiers must be non-empty and distinct
                if claim.trim().is_empty() || !seen.insert(claim.as_str()) {
                    return Err(ConfigError::Invalid(key));
                }
            }
        }

        let auto_provision_users = match get("AUTO_PROVISION_USERS") {
            None => false,
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid("AUTO_PROVISION_USERS"))?,
        };

        let http_timeout = Duration::from_secs(
            get("HTTP_TIMEOUT_SECONDS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(30),
        );

        let http_body_limit_bytes = get("HTTP_BODY_LIMIT_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            auth_issuer,
            auth_audience,
            access_token_leeway_seconds,
            access_jwt_public_key_pem,
            role_claim_prefix,
            role_admin_claim,
            role_user_claim,
            role_creator_claim,
            auto_provision_users,
            http_timeout,
            http_body_limit_bytes,
        })
    }

    pub fn role_catalog(&self) -> RoleCatalog {
        RoleCatalog::new(
            self.role_admin_claim.clone(),
            self.role_user_claim.clone(),
            self.role_creator_claim.clone(),
        )
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
