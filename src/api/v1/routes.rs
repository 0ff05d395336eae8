/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - access / role_sync middleware の適用は app.rs 側で行う
 */
use axum::{Router, routing::get};

use crate::state::AppState;

use crate::api::v1::handlers::me::get_me;

pub fn routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}
