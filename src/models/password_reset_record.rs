use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// パスワードリセットレコード
///
/// トークン自体はハッシュ化してDBに保存（token_hash）
/// 平文トークンはユーザーにメールで送信し、DBには保存しない
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PasswordResetRecord {
    pub id: i32,
    pub user_id: i32,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub used_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl PasswordResetRecord {
    /// 指定時刻において期限切れかどうか
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    /// 使用済み（または無効化済み）かどうか
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }
}
