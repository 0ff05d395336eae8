//! Request-time bridge between identity-provider app roles and local user permissions.
//!
//! `middleware::auth::access` turns a bearer token into an `AuthCtx`;
//! `middleware::role_sync` hands its identity to `services::roles::RoleSyncService`,
//! which reconciles the local user's permission set and always lets the request through.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
