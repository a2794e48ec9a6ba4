use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{
    PasswordResetRepository, PasswordResetStore, UserRepository, UserStore,
};
use crate::services::{AuthService, CredentialHasher, LogMailer, Mailer, PasswordResetService};
use crate::token::{JwtMaker, TokenMaker};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有、起動後は不変）
    pub config: Arc<Config>,
    /// アクセストークンの発行・検証
    pub token_maker: Arc<dyn TokenMaker>,
    /// ログイン・登録
    pub auth_service: AuthService,
    /// パスワードリセット
    pub password_reset_service: PasswordResetService,
}

impl AppState {
    /// PostgreSQL をバックエンドに AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let user_store: Arc<dyn UserStore> = Arc::new(UserRepository::new(db_pool.clone()));
        let reset_store: Arc<dyn PasswordResetStore> =
            Arc::new(PasswordResetRepository::new(db_pool));
        let mailer = build_mailer(config.clone())?;

        Self::from_parts(config, user_store, reset_store, mailer)
    }

    /// ストア・メーラーを差し込んで AppState を作成
    ///
    /// TTL、署名鍵の長さ、ハッシュパラメータの検証はここで行う（起動時に失敗させる）。
    pub fn from_parts(
        config: Arc<Config>,
        user_store: Arc<dyn UserStore>,
        reset_store: Arc<dyn PasswordResetStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let token_maker: Arc<dyn TokenMaker> =
            Arc::new(JwtMaker::new(config.token_symmetric_key.expose_secret())?);
        let hasher = CredentialHasher::new(config.password_hash_cost())?;

        let auth_service = AuthService::new(
            user_store.clone(),
            token_maker.clone(),
            hasher.clone(),
            config.clone(),
        );
        let password_reset_service =
            PasswordResetService::new(user_store, reset_store, mailer, hasher, config.clone());

        Ok(Self {
            config,
            token_maker,
            auth_service,
            password_reset_service,
        })
    }
}

/// SMTP が設定されていれば SMTP、なければログ出力のみのメーラー
#[cfg(feature = "email")]
fn build_mailer(config: Arc<Config>) -> Result<Arc<dyn Mailer>, AppError> {
    use crate::services::email::smtp::SmtpMailer;

    match SmtpMailer::from_config(config.clone())? {
        Some(mailer) => {
            tracing::info!("SMTP メーラーを初期化");
            Ok(Arc::new(mailer))
        }
        None => {
            tracing::info!("SMTP 未設定（ログ出力メーラーを使用）");
            Ok(Arc::new(LogMailer::new(config)))
        }
    }
}

#[cfg(not(feature = "email"))]
fn build_mailer(config: Arc<Config>) -> Result<Arc<dyn Mailer>, AppError> {
    if config.smtp_host.is_some() {
        tracing::warn!("SMTP 設定がありますが email フィーチャーが無効です（ログ出力メーラーを使用）");
    }
    Ok(Arc::new(LogMailer::new(config)))
}
