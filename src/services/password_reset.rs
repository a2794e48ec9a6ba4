use std::sync::Arc;

use data_encoding::HEXLOWER;
use rand::RngCore;
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::config::Config;
use crate::error::AppError;
use crate::models::PasswordResetRecord;
use crate::repositories::{PasswordResetStore, UserStore};
use crate::services::email::Mailer;
use crate::services::password::CredentialHasher;

/// リセットトークンのバイト長（hex で 64 文字）
const RESET_TOKEN_BYTES: usize = 32;

/// パスワードリセットサービス
#[derive(Clone)]
pub struct PasswordResetService {
    user_store: Arc<dyn UserStore>,
    reset_store: Arc<dyn PasswordResetStore>,
    mailer: Arc<dyn Mailer>,
    hasher: CredentialHasher,
    config: Arc<Config>,
}

impl PasswordResetService {
    /// 新しい PasswordResetService を作成
    pub fn new(
        user_store: Arc<dyn UserStore>,
        reset_store: Arc<dyn PasswordResetStore>,
        mailer: Arc<dyn Mailer>,
        hasher: CredentialHasher,
        config: Arc<Config>,
    ) -> Self {
        Self {
            user_store,
            reset_store,
            mailer,
            hasher,
            config,
        }
    }

    /// パスワードリセットをリクエスト
    ///
    /// # Security
    /// - ユーザーが存在しない場合も常に成功を返す（情報漏洩防止）
    /// - メール送信に成功してから、同一ユーザーの古い未使用トークンを無効化する
    /// - トークン（平文）はログに出力しない
    pub async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        tracing::info!(email = %email, "パスワードリセットリクエスト");

        let Some(user) = self.user_store.find_by_email(email).await? else {
            tracing::info!(email = %email, "パスワードリセット: ユーザー不在（成功レスポンス返却）");
            return Ok(());
        };

        let token = generate_token();
        let token_hash = hash_token(&token);
        let expires_at = OffsetDateTime::now_utc()
            .checked_add(self.config.password_reset_token_ttl())
            .ok_or_else(|| {
                AppError::Config("PASSWORD_RESET_TOKEN_TTL_SECS が範囲外です".to_string())
            })?;

        let record = self
            .reset_store
            .create(user.id, &token_hash, expires_at)
            .await?;

        if let Err(e) = self.mailer.send_password_reset_email(email, &token).await {
            // 届いていないトークンは残さない（既存のトークンはそのまま有効）
            if let Err(cleanup) = self.reset_store.delete(record.id).await {
                tracing::error!(record_id = record.id, error = ?cleanup, "未配送リセットレコードの削除に失敗");
            }
            return Err(e);
        }

        let superseded = self.reset_store.supersede_older(user.id, record.id).await?;
        if superseded > 0 {
            tracing::info!(user_id = user.id, superseded, "古いリセットトークンを無効化");
        }

        tracing::info!(user_id = user.id, record_id = record.id, "パスワードリセットメール送信完了");

        Ok(())
    }

    /// リセットトークンを検証し、使用済みにする
    ///
    /// # Errors
    /// - `InvalidToken`: レコードが存在しない、所有者が一致しない、並行リクエストに先を越された
    /// - `ExpiredToken`: 有効期限切れ、または使用済み
    pub async fn verify_and_consume(
        &self,
        user_id: i32,
        token: &str,
    ) -> Result<PasswordResetRecord, AppError> {
        let record = self
            .reset_store
            .find_by_token_hash(&hash_token(token))
            .await?
            .ok_or(AppError::InvalidToken)?;

        // 他アカウントのトークン推測対策
        if record.user_id != user_id {
            tracing::warn!(user_id, record_id = record.id, "リセットトークンの所有者不一致");
            return Err(AppError::InvalidToken);
        }

        if record.is_used() {
            tracing::warn!(record_id = record.id, "使用済みトークン");
            return Err(AppError::ExpiredToken);
        }

        if record.is_expired_at(OffsetDateTime::now_utc()) {
            tracing::warn!(record_id = record.id, "期限切れトークン");
            return Err(AppError::ExpiredToken);
        }

        if !self.reset_store.mark_as_used(record.id).await? {
            tracing::warn!(record_id = record.id, "トークンは並行リクエストで使用済み");
            return Err(AppError::InvalidToken);
        }

        Ok(record)
    }

    /// 新しいパスワードをハッシュ化して保存
    ///
    /// 呼び出し前に `verify_and_consume` で認可されていること
    pub async fn complete_password_reset(
        &self,
        user_id: i32,
        new_password: &str,
    ) -> Result<(), AppError> {
        let password_hash = self.hasher.hash_async(new_password).await?;

        self.user_store
            .update_password(user_id, &password_hash)
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(user_id, "パスワードリセット完了");

        Ok(())
    }

    /// トークン検証からパスワード更新までを順に実行
    ///
    /// 検証に失敗した場合、保存済みのパスワードは変更されない。
    pub async fn reset_password(
        &self,
        user_id: i32,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        self.verify_and_consume(user_id, token).await?;
        self.complete_password_reset(user_id, new_password).await
    }

    /// 期限切れレコードを削除
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        Ok(self.reset_store.delete_expired().await?)
    }
}

/// 32バイトのランダムトークンを生成（hex）
fn generate_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    HEXLOWER.encode(&bytes)
}

/// トークンをSHA256でハッシュ化
fn hash_token(token: &str) -> String {
    HEXLOWER.encode(Sha256::digest(token.as_bytes()).as_slice())
}
