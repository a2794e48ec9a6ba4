use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::models::User;
use crate::repositories::{NewUser, StoreError, UserStore};
use crate::services::password::CredentialHasher;
use crate::token::TokenMaker;

const DEFAULT_ROLE: &str = "user";

/// ログイン成功時の結果
#[derive(Debug)]
pub struct LoginResult {
    pub access_token: String,
    pub user: User,
}

/// 認証サービス
#[derive(Clone)]
pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    token_maker: Arc<dyn TokenMaker>,
    hasher: CredentialHasher,
    config: Arc<Config>,
}

impl AuthService {
    /// 新しい AuthService を作成
    pub fn new(
        user_store: Arc<dyn UserStore>,
        token_maker: Arc<dyn TokenMaker>,
        hasher: CredentialHasher,
        config: Arc<Config>,
    ) -> Self {
        Self {
            user_store,
            token_maker,
            hasher,
            config,
        }
    }

    /// ユーザー登録
    ///
    /// # Security
    /// - パスワードは即座にハッシュ化し、ログに出力しない
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AppError> {
        let password_hash = self.hasher.hash_async(password).await?;

        let user = self
            .user_store
            .create_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role: DEFAULT_ROLE.to_string(),
            })
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => AppError::EmailAlreadyExists,
                other => AppError::Database(other),
            })?;

        tracing::info!(user_id = user.id, "ユーザー登録成功");

        Ok(user)
    }

    /// ユーザー認証を実行
    ///
    /// タイミング攻撃対策: ユーザーが存在しない場合もダミーのパスワード検証を実行
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let Some(user) = self.user_store.find_by_email(email).await? else {
            self.hasher.check_dummy_async(password).await;
            tracing::warn!(email = %email, "認証失敗: ユーザー不在");
            return Err(AppError::Authentication("invalid_credentials".to_string()));
        };

        match self.hasher.check_async(password, &user.password_hash).await {
            Ok(true) => {
                tracing::info!(user_id = user.id, "認証成功");
                Ok(user)
            }
            Ok(false) => {
                tracing::warn!(user_id = user.id, "認証失敗: パスワード不一致");
                Err(AppError::Authentication("invalid_credentials".to_string()))
            }
            // 壊れたハッシュも認証失敗として扱う
            Err(e) => {
                tracing::error!(user_id = user.id, error = ?e, "認証失敗: 保存済みハッシュが不正");
                Err(AppError::Authentication("invalid_credentials".to_string()))
            }
        }
    }

    /// 認証してアクセストークンを発行
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AppError> {
        let user = self.authenticate(email, password).await?;
        let access_token = self
            .token_maker
            .create_token(user.id, self.config.access_token_ttl())?;

        Ok(LoginResult { access_token, user })
    }

    /// ユーザーIDでユーザーを取得
    pub async fn current_user(&self, user_id: i32) -> Result<User, AppError> {
        self.user_store
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }
}
