use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use super::{PasswordResetStore, StoreError};
use crate::models::PasswordResetRecord;

#[derive(Clone)]
pub struct PasswordResetRepository {
    pool: PgPool,
}

impl PasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordResetStore for PasswordResetRepository {
    /// 新しいパスワードリセットレコードを作成
    ///
    /// # Arguments
    /// * `user_id` - 対象ユーザーのID
    /// * `token_hash` - トークンのSHA256ハッシュ
    /// * `expires_at` - 有効期限
    async fn create(
        &self,
        user_id: i32,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<PasswordResetRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        // ユーザー行をロックして同一ユーザーの発行を直列化する（id 順 = コミット順）
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let record = sqlx::query_as::<_, PasswordResetRecord>(
            r#"
            INSERT INTO password_resets (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, expires_at, used_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordResetRecord>, StoreError> {
        let record = sqlx::query_as::<_, PasswordResetRecord>(
            r#"
            SELECT id, user_id, token_hash, expires_at, used_at, created_at
            FROM password_resets
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// 条件付き UPDATE で二重使用を防ぐ
    async fn mark_as_used(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE password_resets
            SET used_at = NOW()
            WHERE id = $1 AND used_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn supersede_older(&self, user_id: i32, keep_id: i32) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE password_resets
            SET used_at = NOW()
            WHERE user_id = $1 AND id < $2 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(keep_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM password_resets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM password_resets
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
