//! 保護ルート用の認証ミドルウェア
//!
//! `Authorization: Bearer <token>` を検証し、認証済みユーザーを
//! 型付きの値（`AuthUser`）としてハンドラーに渡す。

use axum::{
    extract::{FromRequestParts, Request},
    middleware::Next,
    response::Response,
};
use http::{header::AUTHORIZATION, request::Parts};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

const BEARER_SCHEME: &str = "bearer";

/// 認証済みユーザー
///
/// ハンドラーの引数に書くだけで、トークン検証済みのユーザーIDを受け取れる。
/// 検証に失敗した場合ハンドラーは呼ばれない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub token_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // require_auth レイヤーで検証済みなら再検証しない
        if let Some(auth) = parts.extensions.get::<AuthUser>() {
            return Ok(*auth);
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AppError::Unauthorized("no authorization header provided"))?
            .to_str()
            .map_err(|_| AppError::Unauthorized("invalid authorization header format"))?;

        let token = parse_bearer(header)?;

        let payload = state.token_maker.verify_token(token).map_err(|e| {
            tracing::warn!(error = %e, "アクセストークン検証失敗");
            AppError::from(e)
        })?;

        let auth = AuthUser {
            user_id: payload.user_id(),
            token_id: payload.id(),
        };
        parts.extensions.insert(auth);

        Ok(auth)
    }
}

/// ルートグループ全体に認証を要求するミドルウェア
///
/// `.route_layer(middleware::from_fn_with_state(state.clone(), require_auth))`
pub async fn require_auth(auth: AuthUser, mut request: Request, next: Next) -> Response {
    tracing::debug!(user_id = auth.user_id, "認証済みリクエスト");
    request.extensions_mut().insert(auth);
    next.run(request).await
}

/// `Bearer <token>` 形式のヘッダーからトークンを取り出す
///
/// スキーム名は大文字小文字を区別しない。空白区切りでちょうど2要素であること。
fn parse_bearer(header: &str) -> Result<&str, AppError> {
    let mut parts = header.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => {
            Ok(token)
        }
        (Some(scheme), Some(_), None) => {
            tracing::debug!(scheme = %scheme, "未対応の認証スキーム");
            Err(AppError::Unauthorized("unsupported authorization type"))
        }
        _ => Err(AppError::Unauthorized("invalid authorization header format")),
    }
}
