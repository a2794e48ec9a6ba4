use secrecy::SecretBox;
use serde::Deserialize;
use time::Duration;

use crate::error::AppError;
use crate::services::password::HashCost;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // アクセストークン設定
    /// HMAC署名鍵（32文字以上）
    pub token_symmetric_key: SecretBox<String>,
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: i64,

    // パスワードリセット設定
    #[serde(default)]
    pub password_reset_url_base: Option<String>,
    #[serde(default = "default_password_reset_token_ttl_secs")]
    pub password_reset_token_ttl_secs: i64,
    /// 期限切れリセットレコードの削除間隔
    #[serde(default = "default_password_reset_purge_interval_secs")]
    pub password_reset_purge_interval_secs: u64,

    // パスワードハッシュ（argon2id）のコスト
    #[serde(default = "default_password_hash_memory_kib")]
    pub password_hash_memory_kib: u32,
    #[serde(default = "default_password_hash_iterations")]
    pub password_hash_iterations: u32,
    #[serde(default = "default_password_hash_parallelism")]
    pub password_hash_parallelism: u32,

    // CORS（未設定なら CORS レイヤーを付けない）
    #[serde(default)]
    pub cors_allowed_origin: Option<String>,

    // SMTP設定（オプション - email機能有効時のみ使用）
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<SecretBox<String>>,
    pub smtp_password: Option<SecretBox<String>>,
    #[serde(default)]
    pub smtp_from_address: Option<String>,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 900;
const DEFAULT_PASSWORD_RESET_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_PASSWORD_RESET_PURGE_INTERVAL_SECS: u64 = 3600;
/// TTL の上限（1年）
const MAX_TTL_SECS: i64 = 365 * 24 * 60 * 60;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_access_token_ttl_secs() -> i64 {
    DEFAULT_ACCESS_TOKEN_TTL_SECS
}

fn default_password_reset_token_ttl_secs() -> i64 {
    DEFAULT_PASSWORD_RESET_TOKEN_TTL_SECS
}

fn default_password_reset_purge_interval_secs() -> u64 {
    DEFAULT_PASSWORD_RESET_PURGE_INTERVAL_SECS
}

fn default_password_hash_memory_kib() -> u32 {
    HashCost::default().memory_kib
}

fn default_password_hash_iterations() -> u32 {
    HashCost::default().iterations
}

fn default_password_hash_parallelism() -> u32 {
    HashCost::default().parallelism
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_ttl_secs)
    }

    pub fn password_reset_token_ttl(&self) -> Duration {
        Duration::seconds(self.password_reset_token_ttl_secs)
    }

    /// 起動時の設定値チェック
    ///
    /// TTL は 1秒以上、1年以下であること。
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, secs) in [
            ("ACCESS_TOKEN_TTL_SECS", self.access_token_ttl_secs),
            ("PASSWORD_RESET_TOKEN_TTL_SECS", self.password_reset_token_ttl_secs),
        ] {
            if !(1..=MAX_TTL_SECS).contains(&secs) {
                tracing::error!(name, secs, max = MAX_TTL_SECS, "TTL が範囲外です");
                return Err(AppError::Config(format!(
                    "{name} は 1〜{MAX_TTL_SECS} の範囲で指定してください"
                )));
            }
        }
        Ok(())
    }

    pub fn password_hash_cost(&self) -> HashCost {
        HashCost {
            memory_kib: self.password_hash_memory_kib,
            iterations: self.password_hash_iterations,
            parallelism: self.password_hash_parallelism,
        }
    }
}

#[cfg(test)]
impl Config {
    /// テスト用設定（軽量なハッシュコスト）
    pub fn for_tests() -> Self {
        Self {
            database_url: SecretBox::new(Box::new("postgres://localhost/shopgate_test".to_string())),
            host: default_host(),
            port: default_port(),
            token_symmetric_key: SecretBox::new(Box::new(
                "test-secret-key-at-least-32-bytes-long".to_string(),
            )),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            password_reset_url_base: Some("https://shop.example.com/reset-password".to_string()),
            password_reset_token_ttl_secs: default_password_reset_token_ttl_secs(),
            password_reset_purge_interval_secs: default_password_reset_purge_interval_secs(),
            password_hash_memory_kib: 1024,
            password_hash_iterations: 1,
            password_hash_parallelism: 1,
            cors_allowed_origin: None,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            smtp_from_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_env() {
        let vars = vec![
            ("DATABASE_URL".to_string(), "postgres://localhost/shop".to_string()),
            (
                "TOKEN_SYMMETRIC_KEY".to_string(),
                "0123456789abcdef0123456789abcdef".to_string(),
            ),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.access_token_ttl(), Duration::minutes(15));
        assert_eq!(config.password_reset_token_ttl(), Duration::hours(1));
        assert_eq!(config.password_hash_cost(), HashCost::default());
        assert!(config.password_reset_url_base.is_none());
        assert!(config.smtp_host.is_none());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::for_tests().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_ttl() {
        for secs in [0, -1, MAX_TTL_SECS + 1, i64::MAX] {
            let mut config = Config::for_tests();
            config.access_token_ttl_secs = secs;
            assert!(matches!(config.validate(), Err(AppError::Config(_))), "{secs}");

            let mut config = Config::for_tests();
            config.password_reset_token_ttl_secs = secs;
            assert!(matches!(config.validate(), Err(AppError::Config(_))), "{secs}");
        }
    }

    #[test]
    fn test_missing_token_key_fails() {
        let vars = vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/shop".to_string(),
        )];
        let result: Result<Config, _> = envy::from_iter(vars);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides() {
        let vars = vec![
            ("DATABASE_URL".to_string(), "postgres://localhost/shop".to_string()),
            (
                "TOKEN_SYMMETRIC_KEY".to_string(),
                "0123456789abcdef0123456789abcdef".to_string(),
            ),
            ("ACCESS_TOKEN_TTL_SECS".to_string(), "60".to_string()),
            ("PASSWORD_RESET_TOKEN_TTL_SECS".to_string(), "120".to_string()),
            ("PASSWORD_HASH_ITERATIONS".to_string(), "3".to_string()),
            ("PORT".to_string(), "8080".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_ttl(), Duration::minutes(1));
        assert_eq!(config.password_reset_token_ttl(), Duration::minutes(2));
        assert_eq!(config.password_hash_cost().iterations, 3);
    }
}
