use axum::{Json, extract::State};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::handlers::user::UserResponse;
use crate::handlers::validation::{email_format, validate_request};
use crate::state::AppState;

/// ログインリクエスト
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(custom(email_format))]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// アクセストークン（Authorization: Bearer で送る）
    pub token: String,
    /// トークンの有効期間（秒）
    pub expires_in: i64,
    pub user: UserResponse,
}

/// ログインハンドラー
///
/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_request(&request)?;

    let result = state
        .auth_service
        .login(request.email.trim(), &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token: result.access_token,
        expires_in: state.config.access_token_ttl_secs,
        user: UserResponse::from(result.user),
    }))
}
