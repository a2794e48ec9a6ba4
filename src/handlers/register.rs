use axum::{Json, extract::State, http::StatusCode};
use garde::Validate;
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::user::UserResponse;
use crate::handlers::validation::{email_format, validate_request};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(length(min = 1, max = 100))]
    pub name: String,
    #[garde(custom(email_format))]
    pub email: String,
    #[garde(length(min = 8))]
    pub password: String, // SecretBox不要（Deserialize後すぐハッシュ化）
}

/// ユーザー登録ハンドラー
///
/// POST /api/users
///
/// # Security
/// - パスワードはログに出力しない
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    validate_request(&request)?;

    let user = state
        .auth_service
        .register(request.name.trim(), request.email.trim(), &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}
