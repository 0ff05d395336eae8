//! Role sync interceptor.
//!
//! Runs once per request after the access middleware: reads the `AuthCtx` (if any),
//! lets `RoleSyncService` reconcile the caller's local permissions, then forwards the
//! request unchanged. The outcome never changes the response; failures are only logged.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::services::roles::RoleSyncService;

pub fn apply<S>(router: Router<S>, role_sync: Arc<RoleSyncService>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(role_sync, role_sync_middleware))
}

async fn role_sync_middleware(
    State(role_sync): State<Arc<RoleSyncService>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // Cloned so no borrow of the request is held across the store calls.
    let identity = req
        .extensions()
        .get::<AuthCtx>()
        .map(|ctx| ctx.identity().clone());

    let outcome = role_sync.sync(identity.as_ref()).await;
    tracing::debug!(?outcome, "role sync finished");

    next.run(req).await
}
