//! アクセストークンの発行と検証

pub mod jwt;
pub mod payload;

use time::Duration;

pub use jwt::JwtMaker;
pub use payload::Payload;

/// トークン層のエラー
///
/// 署名不一致・形式不正・アルゴリズム不一致は区別せず `InvalidToken` を返す。
/// 期限切れのみ `ExpiredToken` として区別する。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("無効なトークンです")]
    InvalidToken,

    #[error("トークンの有効期限が切れています")]
    ExpiredToken,

    #[error("有効期間が範囲外です")]
    InvalidDuration,

    #[error("署名鍵は{min}文字以上である必要があります")]
    InvalidKeySize { min: usize },

    #[error("トークンの署名に失敗しました: {0}")]
    Signing(String),
}

/// アクセストークンの発行・検証インターフェース
pub trait TokenMaker: Send + Sync {
    /// 指定ユーザー・有効期間のトークンを発行
    fn create_token(&self, user_id: i32, duration: Duration) -> Result<String, TokenError>;

    /// トークンを検証して Payload を返す
    fn verify_token(&self, token: &str) -> Result<Payload, TokenError>;
}
