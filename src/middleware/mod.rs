/*
 * Responsibility
 * - middleware の公開インターフェース
 *   - http: request id / trace / body limit / timeout
 *   - auth::access: access token 検証 -> AuthCtx
 *   - role_sync: AuthCtx の role claim -> ローカル permission 同期
 */
pub mod auth;
pub mod http;
pub mod role_sync;
