use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::services::PasswordResetService;

/// 期限切れリセットレコードを定期的に削除するバックグラウンドタスクを起動
///
/// 失敗してもログに残すだけで、次の周期で再度実行する。
pub fn spawn_reset_purge_task(service: PasswordResetService, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(period_secs = period.as_secs(), "リセットレコード削除タスク開始");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match service.purge_expired().await {
                Ok(0) => {}
                Ok(deleted) => {
                    tracing::info!(deleted, "期限切れリセットレコードを削除");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "期限切れリセットレコードの削除に失敗");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::OffsetDateTime;

    use super::*;
    use crate::config::Config;
    use crate::repositories::PasswordResetStore;
    use crate::repositories::memory::{InMemoryPasswordResetStore, InMemoryUserStore};
    use crate::services::email::testing::RecordingMailer;
    use crate::services::password::CredentialHasher;

    #[tokio::test]
    async fn test_purge_task_deletes_expired_records() {
        let config = Arc::new(Config::for_tests());
        let resets = Arc::new(InMemoryPasswordResetStore::new());
        resets
            .create(1, "expired", OffsetDateTime::now_utc() - time::Duration::minutes(1))
            .await
            .unwrap();
        resets
            .create(1, "live", OffsetDateTime::now_utc() + time::Duration::hours(1))
            .await
            .unwrap();

        let service = PasswordResetService::new(
            Arc::new(InMemoryUserStore::new()),
            resets.clone(),
            Arc::new(RecordingMailer::new()),
            CredentialHasher::new(config.password_hash_cost()).unwrap(),
            config,
        );

        let handle = spawn_reset_purge_task(service, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        let records = resets.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].token_hash, "live");
    }
}
