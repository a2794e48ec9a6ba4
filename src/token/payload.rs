use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::TokenError;

/// アクセストークンに埋め込まれるクレーム
///
/// 署名済みトークンの中にのみ存在し、DBには保存しない。
/// 生成後は変更不可（フィールドは読み取り専用アクセサ経由で公開）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    id: Uuid,
    user_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    expired_at: OffsetDateTime,
}

impl Payload {
    /// 新しい Payload を作成
    ///
    /// 発行時刻は現在時刻、有効期限は `issued_at + duration`。
    /// 負の duration を渡すと作成時点で期限切れになる。
    ///
    /// # Errors
    /// 有効期限が表現可能な日時の範囲を超える場合は `InvalidDuration`
    pub fn new(user_id: i32, duration: Duration) -> Result<Self, TokenError> {
        let issued_at = OffsetDateTime::now_utc();
        let expired_at = issued_at
            .checked_add(duration)
            .ok_or(TokenError::InvalidDuration)?;

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            issued_at,
            expired_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn issued_at(&self) -> OffsetDateTime {
        self.issued_at
    }

    pub fn expired_at(&self) -> OffsetDateTime {
        self.expired_at
    }

    /// 指定時刻において期限切れかどうか
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expired_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_payload_window() {
        let payload = Payload::new(42, Duration::minutes(15)).unwrap();
        assert_eq!(payload.user_id(), 42);
        assert_eq!(
            payload.expired_at() - payload.issued_at(),
            Duration::minutes(15)
        );
        assert!(!payload.is_expired_at(payload.issued_at()));
    }

    #[test]
    fn test_payload_ids_are_unique() {
        let a = Payload::new(1, Duration::minutes(1)).unwrap();
        let b = Payload::new(1, Duration::minutes(1)).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_negative_duration_is_already_expired() {
        let payload = Payload::new(1, Duration::seconds(-1)).unwrap();
        assert!(payload.is_expired_at(OffsetDateTime::now_utc()));
    }

    #[test]
    fn test_payload_serializes_rfc3339_timestamps() {
        let payload = Payload::new(7, Duration::hours(1)).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["user_id"], 7);
        assert!(json["issued_at"].is_string());
        assert!(json["expired_at"].is_string());

        let decoded: Payload = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_out_of_range_duration_is_rejected() {
        for duration in [
            Duration::seconds(i64::MAX),
            Duration::days(365 * 9000),
            Duration::seconds(i64::MIN),
        ] {
            assert_eq!(
                Payload::new(1, duration),
                Err(TokenError::InvalidDuration),
                "{:?}",
                duration
            );
        }
    }
}
