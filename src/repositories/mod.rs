//! 永続化層
//!
//! サービス層はトレイト越しにストアを扱う。
//! 本番は PostgreSQL 実装、テストはインメモリ実装を差し込む。

pub mod password_reset;
pub mod user;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::models::{PasswordResetRecord, User};

pub use password_reset::PasswordResetRepository;
pub use user::UserRepository;

/// ストア層のエラー
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("一意制約違反: {0}")]
    UniqueViolation(String),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),
}

/// ユーザー作成時の入力
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError>;

    /// # Errors
    /// メールアドレス重複時は `StoreError::UniqueViolation`
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// パスワードハッシュを上書きする。対象ユーザーが無ければ `None`
    async fn update_password(
        &self,
        user_id: i32,
        password_hash: &str,
    ) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait PasswordResetStore: Send + Sync {
    /// 同一ユーザーに対する作成は直列化される
    async fn create(
        &self,
        user_id: i32,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<PasswordResetRecord, StoreError>;

    /// 有効期限や使用済みフラグの検証は呼び出し側で行う
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetRecord>, StoreError>;

    /// 未使用の場合のみ使用済みにする
    ///
    /// # Returns
    /// このリクエストで使用済みにできた場合 `true`（並行リクエストに負けた場合 `false`）
    async fn mark_as_used(&self, id: i32) -> Result<bool, StoreError>;

    /// `keep_id` より古いユーザーの未使用レコードを無効化し、件数を返す
    ///
    /// 同一ユーザーの `create` は直列化されるため、id の大小は発行順と一致する。
    async fn supersede_older(&self, user_id: i32, keep_id: i32) -> Result<u64, StoreError>;

    /// レコードを削除する（配送に失敗したトークンの後始末）
    async fn delete(&self, id: i32) -> Result<bool, StoreError>;

    /// 期限切れレコードを削除し、件数を返す
    async fn delete_expired(&self) -> Result<u64, StoreError>;
}
