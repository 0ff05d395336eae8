/*
 * Responsibility
 * - HTTP に依存しないドメインロジック
 *   - auth: access token 検証 (identity provider との境界)
 *   - roles: role claim -> permission の同期
 */
pub mod auth;
pub mod roles;
