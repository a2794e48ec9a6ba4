use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use time::{Duration, OffsetDateTime};

use super::{Payload, TokenError, TokenMaker};

/// 署名鍵の最小長（HS256 の鍵長 256bit に合わせる）
pub const MIN_SECRET_KEY_SIZE: usize = 32;

/// HMAC 署名の JWT でアクセストークンを発行・検証する
///
/// # Security
/// - 発行は常に HS256
/// - 検証時はヘッダーの alg が HMAC 系以外なら拒否（alg 差し替え攻撃対策）
/// - 失敗理由は期限切れ以外すべて `InvalidToken` にまとめる
pub struct JwtMaker {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtMaker {
    /// 新しい JwtMaker を作成
    ///
    /// 鍵長のチェックはここで一度だけ行う。
    pub fn new(secret_key: &str) -> Result<Self, TokenError> {
        if secret_key.len() < MIN_SECRET_KEY_SIZE {
            tracing::error!(
                expected = MIN_SECRET_KEY_SIZE,
                actual = secret_key.len(),
                "トークン署名鍵が短すぎます"
            );
            return Err(TokenError::InvalidKeySize {
                min: MIN_SECRET_KEY_SIZE,
            });
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // 有効期限は Payload 側で判定する（exp クレームは持たない）
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            validation,
        })
    }
}

impl TokenMaker for JwtMaker {
    fn create_token(&self, user_id: i32, duration: Duration) -> Result<String, TokenError> {
        let payload = Payload::new(user_id, duration)?;

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key).map_err(|e| {
            tracing::error!(error = ?e, "トークン署名エラー");
            TokenError::Signing(e.to_string())
        })
    }

    fn verify_token(&self, token: &str) -> Result<Payload, TokenError> {
        let token_data =
            decode::<Payload>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(kind = ?e.kind(), "トークン検証失敗");
                TokenError::InvalidToken
            })?;

        let payload = token_data.claims;
        if payload.is_expired_at(OffsetDateTime::now_utc()) {
            return Err(TokenError::ExpiredToken);
        }

        Ok(payload)
    }
}
