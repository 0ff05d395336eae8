//! access token（JWT）検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization` ヘッダが無い: AuthCtx 無しでそのまま次へ (role_sync は何もしない)
//! - `Authorization: Bearer <jwt>` が不正: 401
//! - 正常: identity (user name + role claims) を AuthCtx として extensions に格納

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::AuthService;

/// Router に access token 検証を掛ける。
///
/// 例：
/// ```ignore
/// let app = middleware::role_sync::apply(app, state.role_sync.clone());
/// let app = middleware::auth::access::apply(app, state.auth.clone());
/// ```
pub fn apply<S>(router: Router<S>, auth: Arc<AuthService>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(auth, access_middleware))
}

async fn access_middleware(
    State(auth): State<Arc<AuthService>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().ok().map(str::to_owned));

    let Some(auth_header) = auth_header else {
        return Ok(next.run(req).await);
    };

    let token = auth_header
        .as_deref()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    // JWT 署名検証 + iss/aud/exp/leeway などは AuthService 側で実施
    let verified = match auth.verify_identity(token) {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(
                error = %err,
                "access token verification failed"
            );
            return Err(AppError::Unauthorized);
        }
    };

    tracing::debug!(
        user_name = %verified.identity.user_name,
        jti = ?verified.jti,
        "access token verified"
    );

    // middleware → role_sync / extractor への受け渡し
    req.extensions_mut()
        .insert(AuthCtx::new(verified.identity, verified.jti));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::util::ServiceExt;

    use super::*;
    use crate::services::auth::access_jwt::testing::{auth_service, claims, sign};

    async fn probe(req: Request<Body>) -> String {
        req.extensions()
            .get::<AuthCtx>()
            .map(|ctx| {
                let mut claims: Vec<_> = ctx.identity().claims.iter().cloned().collect();
                claims.sort();
                format!("{}:{}", ctx.user_name(), claims.join(","))
            })
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn app() -> Router {
        apply(
            Router::new().route("/probe", get(probe)),
            Arc::new(auth_service()),
        )
    }

    async fn call(req: Request<Body>) -> (StatusCode, String) {
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn no_header_passes_through_anonymously() {
        let req = Request::builder().uri("/probe").body(Body::empty()).unwrap();

        assert_eq!(call(req).await, (StatusCode::OK, "anonymous".to_string()));
    }

    #[tokio::test]
    async fn valid_token_puts_identity_in_extensions() {
        let token = sign(&claims("alice", &["User", "Creator"]));
        let req = Request::builder()
            .uri("/probe")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        assert_eq!(
            call(req).await,
            (
                StatusCode::OK,
                "alice:APPROLE_Creator,APPROLE_User".to_string()
            )
        );
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let req = Request::builder()
            .uri("/probe")
            .header("authorization", "Basic YWxpY2U6cGFzcw==")
            .body(Body::empty())
            .unwrap();

        assert_eq!(call(req).await.0, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let mut token = sign(&claims("alice", &["Admin"]));
        token.push('x');
        let req = Request::builder()
            .uri("/probe")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        assert_eq!(call(req).await.0, StatusCode::UNAUTHORIZED);
    }
}
