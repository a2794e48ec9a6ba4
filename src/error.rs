use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::repositories::StoreError;
use crate::services::password::CredentialError;
use crate::token::TokenError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("認証エラー: {0}")]
    Authentication(String),

    #[error("認証が必要です: {0}")]
    Unauthorized(&'static str),

    #[error("無効なトークンです")]
    InvalidToken,

    #[error("トークンの有効期限が切れています")]
    ExpiredToken,

    #[error("資格情報の処理に失敗しました")]
    Credential(#[from] CredentialError),

    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("このメールアドレスは既に使用されています")]
    EmailAlreadyExists,

    #[error("リソースが見つかりません")]
    NotFound,

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("メール送信エラー: {0}")]
    Mail(String),

    #[error("データベースエラー")]
    Database(#[from] StoreError),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::InvalidToken => Self::InvalidToken,
            TokenError::ExpiredToken => Self::ExpiredToken,
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authentication(_)
            | Self::Unauthorized(_)
            | Self::InvalidToken
            | Self::ExpiredToken => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::EmailAlreadyExists => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Mail(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Credential(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Authentication(_) => "メールアドレスまたはパスワードが正しくありません".to_string(),
            Self::Unauthorized(reason) => {
                tracing::debug!(reason = %reason, "認証ヘッダー不正");
                "認証が必要です".to_string()
            }
            // 失敗理由（署名・形式・アルゴリズム）は区別しない
            Self::InvalidToken => "無効なトークンです".to_string(),
            Self::ExpiredToken => "トークンの有効期限が切れています".to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::EmailAlreadyExists => "このメールアドレスは既に使用されています".to_string(),
            Self::NotFound => "リソースが見つかりません".to_string(),
            Self::Mail(e) => {
                tracing::error!(error = %e, "メール送信エラー");
                "メールの送信に失敗しました".to_string()
            }
            Self::Config(e) => {
                tracing::error!(error = %e, "設定エラー");
                "内部エラーが発生しました".to_string()
            }
            Self::Credential(e) => {
                tracing::error!(error = ?e, "資格情報処理エラー");
                "内部エラーが発生しました".to_string()
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                "内部エラーが発生しました".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                "内部エラーが発生しました".to_string()
            }
        };

        (self.status(), Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_errors_are_normalized() {
        assert!(matches!(
            AppError::from(TokenError::InvalidToken),
            AppError::InvalidToken
        ));
        assert!(matches!(
            AppError::from(TokenError::ExpiredToken),
            AppError::ExpiredToken
        ));
        assert!(matches!(
            AppError::from(TokenError::Signing("boom".to_string())),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        for error in [
            AppError::Unauthorized("missing"),
            AppError::InvalidToken,
            AppError::ExpiredToken,
            AppError::Authentication("invalid_credentials".to_string()),
        ] {
            assert_eq!(error.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response = AppError::Credential(CredentialError::MalformedHash("x".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::Mail("smtp down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
