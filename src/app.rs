/*
 * Responsibility
 * - Config読み込み → 依存生成 (PgPool, AuthService, RoleSyncService) → Router 組み立て
 * - Middleware の適用 (http → access → role_sync の順に外側から)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware::{self, http::HttpLimits};
use crate::repos::user_repo::PgUserStore;
use crate::services::auth::build_auth_service;
use crate::services::roles::{RoleSyncService, UserStore};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,approle_sync=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: crash immediately so it gets noticed
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<(), AppError> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting role sync bridge in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, addr = %config.addr, "failed to bind");
            AppError::Internal
        })?;
    axum::serve(listener, app).await.map_err(|err| {
        tracing::error!(error = %err, "server error");
        AppError::Internal
    })?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "failed to connect to database");
            AppError::Internal
        })?;

    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));
    build_state_with_store(config, store)
}

pub fn build_state_with_store(config: &Config, store: Arc<dyn UserStore>) -> Result<AppState, AppError> {
    let auth = build_auth_service(config)?;

    // The catalog is the only process-wide shared value; built once, read-only afterwards.
    let catalog = Arc::new(config.role_catalog());
    tracing::info!(
        catalog = ?catalog.entries(),
        auto_provision = config.auto_provision_users,
        store = store.backend_name(),
        "role catalog loaded"
    );

    let role_sync = Arc::new(RoleSyncService::new(
        catalog,
        store,
        config.auto_provision_users,
    ));

    Ok(AppState::new(auth, role_sync))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(api::v1::handlers::health::health))
        .nest("/api/v1", api::v1::routes());

    // Layers wrap outward: access runs first, then role_sync, then the handler.
    // Both cover every route so each inbound request is synced exactly once.
    let router = middleware::role_sync::apply(router, state.role_sync.clone());
    let router = middleware::auth::access::apply(router, state.auth.clone()).with_state(state);

    middleware::http::apply(
        router,
        HttpLimits {
            timeout: config.http_timeout,
            body_limit_bytes: config.http_body_limit_bytes,
        },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::util::ServiceExt;

    use super::*;
    use crate::services::auth::access_jwt::testing::{
        AUDIENCE, ISSUER, PUBLIC_KEY_PEM, claims, sign,
    };
    use crate::services::roles::PermissionSet;
    use crate::services::roles::store::memory::MemoryUserStore;

    fn config(auto_provision: bool) -> Config {
        let vars = HashMap::from([
            ("DATABASE_URL", "postgres://unused".to_string()),
            ("AUTH_ISSUER", ISSUER.to_string()),
            ("AUTH_AUDIENCE", AUDIENCE.to_string()),
            ("ACCESS_JWT_PUBLIC_KEY_PEM", PUBLIC_KEY_PEM.to_string()),
            ("ACCESS_TOKEN_LEEWAY_SECONDS", "0".to_string()),
            ("AUTO_PROVISION_USERS", auto_provision.to_string()),
        ]);
        Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    fn app(store: Arc<MemoryUserStore>, auto_provision: bool) -> Router {
        let config = config(auto_provision);
        let state = build_state_with_store(&config, store).unwrap();
        build_router(state, &config)
    }

    fn me(roles: &[&str]) -> Request<Body> {
        Request::builder()
            .uri("/api/v1/me")
            .header("authorization", format!("Bearer {}", sign(&claims("alice", roles))))
            .body(Body::empty())
            .unwrap()
    }

    async fn json(resp: axum::response::Response) -> Value {
        let bytes = body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public_and_carries_request_id() {
        let store = Arc::new(MemoryUserStore::new());
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let resp = app(store.clone(), false).oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(store.interactions(), 0);
    }

    #[tokio::test]
    async fn me_without_token_is_unauthorized() {
        let store = Arc::new(MemoryUserStore::new());
        let req = Request::builder().uri("/api/v1/me").body(Body::empty()).unwrap();

        let resp = app(store.clone(), false).oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(store.interactions(), 0);
    }

    #[tokio::test]
    async fn me_reflects_permissions_synced_in_the_same_request() {
        let store = Arc::new(MemoryUserStore::new().with_user("alice", PermissionSet::empty()));

        let resp = app(store, false).oneshot(me(&["Creator"])).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json(resp).await;
        assert_eq!(body["user_name"], "alice");
        assert_eq!(
            body["permissions"],
            serde_json::json!([
                "download", "upload", "playlist", "cover_art", "comment", "podcast", "stream",
                "share"
            ])
        );
    }

    #[tokio::test]
    async fn unknown_user_is_404_unless_provisioning_is_on() {
        let store = Arc::new(MemoryUserStore::new());
        let resp = app(store.clone(), false)
            .oneshot(me(&["User"]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.creates(), 0);

        let resp = app(store.clone(), true).oneshot(me(&["User"])).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json(resp).await["permissions"], serde_json::json!(["download", "stream"]));
        assert_eq!(store.creates(), 1);
    }

    #[tokio::test]
    async fn routes_outside_the_api_are_synced_too() {
        let store = Arc::new(MemoryUserStore::new().with_user("alice", PermissionSet::empty()));
        let req = Request::builder()
            .uri("/health")
            .header("authorization", format!("Bearer {}", sign(&claims("alice", &["User"]))))
            .body(Body::empty())
            .unwrap();

        let resp = app(store.clone(), false).oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(store.reads(), 1);
        assert_eq!(store.writes(), 1);
        assert_eq!(
            store.user("alice").unwrap().permissions.to_strings(),
            vec!["download".to_string(), "stream".to_string()]
        );
    }
}
