use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::AppError;

const DEFAULT_RESET_URL_BASE: &str = "http://localhost:3000/reset-password";

/// リセットメール配送インターフェース
#[async_trait]
pub trait Mailer: Send + Sync {
    /// パスワードリセットメールを送信
    ///
    /// 失敗時は `AppError::Mail` を返す（リトライしない）
    async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), AppError>;
}

/// リセットURLを構築
pub fn build_reset_url(base: Option<&str>, token: &str) -> String {
    format!("{}?token={}", base.unwrap_or(DEFAULT_RESET_URL_BASE), token)
}

#[cfg_attr(not(feature = "email"), allow(dead_code))]
fn reset_email_body(reset_url: &str) -> String {
    format!(
        "パスワードを再設定するには次のリンクを開いてください: <a href=\"{url}\">{url}</a>",
        url = reset_url
    )
}

/// メール送信サービス（開発環境: ログ出力のみ）
#[derive(Clone)]
pub struct LogMailer {
    config: Arc<Config>,
}

impl LogMailer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), AppError> {
        let reset_url = build_reset_url(self.config.password_reset_url_base.as_deref(), token);

        // 開発モード: メール送信せずログ出力のみ
        tracing::info!(to = %to, "パスワードリセットメール送信（開発モード）");
        tracing::debug!("リセットURL: {}", reset_url);

        Ok(())
    }
}

/// SMTP 経由のメール送信（`email` フィーチャー有効時）
#[cfg(feature = "email")]
pub mod smtp {
    use std::sync::Arc;

    use async_trait::async_trait;
    use lettre::message::{Mailbox, header::ContentType};
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
    use secrecy::ExposeSecret;

    use super::{Mailer, build_reset_url, reset_email_body};
    use crate::config::Config;
    use crate::error::AppError;

    #[derive(Clone)]
    pub struct SmtpMailer {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
        config: Arc<Config>,
    }

    impl SmtpMailer {
        /// SMTP設定から作成。設定が揃っていなければ `None`
        pub fn from_config(config: Arc<Config>) -> Result<Option<Self>, AppError> {
            let (Some(host), Some(from)) = (&config.smtp_host, &config.smtp_from_address) else {
                return Ok(None);
            };

            let from: Mailbox = from
                .parse()
                .map_err(|e| AppError::Mail(format!("invalid from address: {e}")))?;

            let transport = match (&config.smtp_username, &config.smtp_password) {
                (Some(username), Some(password)) => {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                        .map_err(|e| AppError::Mail(e.to_string()))?
                        .port(config.smtp_port)
                        .credentials(Credentials::new(
                            username.expose_secret().clone(),
                            password.expose_secret().clone(),
                        ))
                        .build()
                }
                // 認証なし（MailHog などローカル開発用）
                _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                    .port(config.smtp_port)
                    .build(),
            };

            Ok(Some(Self {
                transport,
                from,
                config,
            }))
        }
    }

    #[async_trait]
    impl Mailer for SmtpMailer {
        async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), AppError> {
            let to: Mailbox = to
                .parse()
                .map_err(|e| AppError::Mail(format!("invalid recipient: {e}")))?;
            let reset_url =
                build_reset_url(self.config.password_reset_url_base.as_deref(), token);

            let message = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject("パスワード再設定のご案内")
                .header(ContentType::TEXT_HTML)
                .body(reset_email_body(&reset_url))
                .map_err(|e| AppError::Mail(e.to_string()))?;

            self.transport
                .send(message)
                .await
                .map_err(|e| AppError::Mail(e.to_string()))?;

            tracing::info!("SMTP 経由でリセットメールを送信");
            Ok(())
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::Mailer;
    use crate::error::AppError;

    /// 送信内容を記録するだけのメーラー
    #[derive(Default)]
    pub struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMailer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }

        pub fn last_token(&self) -> Option<String> {
            self.sent.lock().unwrap().last().map(|(_, token)| token.clone())
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), AppError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), token.to_string()));
            Ok(())
        }
    }

    /// 常に失敗するメーラー
    pub struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_password_reset_email(&self, _to: &str, _token: &str) -> Result<(), AppError> {
            Err(AppError::Mail("connection refused".to_string()))
        }
    }
}
