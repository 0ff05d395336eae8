/*
 * Responsibility
 * - GET /me: 呼び出し元のローカルユーザーと現在の permission を返す
 * - role_sync middleware の後に走るので、同期済みの値が見える
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{dto::me::MeResponse, extractors::AuthCtxExtractor},
    error::AppError,
    state::AppState,
};

pub async fn get_me(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<MeResponse>, AppError> {
    let record = state
        .role_sync
        .store()
        .find_by_user_name(ctx.user_name())
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(record.into()))
}
