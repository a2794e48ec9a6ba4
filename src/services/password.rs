use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version};
use tokio::task::spawn_blocking;

/// パスワードハッシュ層のエラー
///
/// 呼び出し側ではいずれも認証失敗として扱うこと。
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    #[error("パスワードハッシュの生成に失敗しました: {0}")]
    HashingFailed(String),

    #[error("不正な形式のパスワードハッシュです: {0}")]
    MalformedHash(String),

    #[error("不正なハッシュパラメータです: {0}")]
    InvalidParams(String),

    #[error("ハッシュ処理タスクが異常終了しました: {0}")]
    Task(String),
}

/// Argon2id のコストパラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// パスワードハッシュ化サービス（argon2id）
///
/// 検証時はハッシュ文字列側のパラメータを使うため、
/// コストを変更しても既存ハッシュはそのまま検証できる。
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl CredentialHasher {
    /// 新しい CredentialHasher を作成
    pub fn new(cost: HashCost) -> Result<Self, CredentialError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| CredentialError::InvalidParams(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut hasher = Self {
            argon2,
            dummy_hash: String::new(),
        };
        // ユーザー不在時のダミー検証用（応答時間を揃える）
        hasher.dummy_hash = hasher.hash("shopgate-dummy-password")?;

        Ok(hasher)
    }

    /// パスワードをハッシュ化（PHC文字列形式）
    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = ?e, "パスワードハッシュ生成エラー");
                CredentialError::HashingFailed(e.to_string())
            })?;
        Ok(hash.to_string())
    }

    /// パスワードとハッシュを照合
    ///
    /// # Returns
    /// 一致すれば `Ok(true)`、不一致なら `Ok(false)`
    ///
    /// # Errors
    /// ハッシュ文字列が解析できない場合は `MalformedHash`
    pub fn check(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!(error = ?e, "パスワードハッシュのパースエラー");
            CredentialError::MalformedHash(e.to_string())
        })?;

        match self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
        {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::MalformedHash(e.to_string())),
        }
    }

    /// ダミーハッシュに対して照合を行う（結果は捨てる）
    pub fn check_dummy(&self, password: &str) {
        let _ = self.check(password, &self.dummy_hash);
    }

    // argon2 は CPU を占有するため、async 側からはブロッキングスレッドで実行する

    /// `hash` をブロッキングスレッドで実行
    pub async fn hash_async(&self, password: &str) -> Result<String, CredentialError> {
        let hasher = self.clone();
        let password = password.to_owned();
        spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?
    }

    /// `check` をブロッキングスレッドで実行
    pub async fn check_async(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        let hasher = self.clone();
        let (password, hash) = (password.to_owned(), hash.to_owned());
        spawn_blocking(move || hasher.check(&password, &hash))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?
    }

    /// `check_dummy` をブロッキングスレッドで実行
    pub async fn check_dummy_async(&self, password: &str) {
        let hasher = self.clone();
        let password = password.to_owned();
        if let Err(e) = spawn_blocking(move || hasher.check_dummy(&password)).await {
            tracing::error!(error = ?e, "ダミー照合タスクが異常終了");
        }
    }
}
