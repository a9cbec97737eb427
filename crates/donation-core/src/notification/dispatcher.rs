//! 发件箱投递器
//!
//! 领取到期任务、调用通知渠道投递并回写结果。领取时即延长租约，
//! 投递进程在回写前崩溃时，任务会在租约到期后被再次领取。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use donation_shared::observability::metrics;
use donation_shared::retry::RetryPolicy;

use super::channel::NotificationChannel;
use crate::error::Result;
use crate::repository::NotificationOutboxTrait;

/// 单轮投递统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub claimed: usize,
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

/// 发件箱投递器
pub struct OutboxDispatcher {
    outbox: Arc<dyn NotificationOutboxTrait>,
    channel: Arc<dyn NotificationChannel>,
    policy: RetryPolicy,
    batch_size: i64,
    lease: Duration,
}

impl OutboxDispatcher {
    pub fn new(
        outbox: Arc<dyn NotificationOutboxTrait>,
        channel: Arc<dyn NotificationChannel>,
        max_attempts: u32,
        batch_size: i64,
    ) -> Self {
        Self {
            outbox,
            channel,
            policy: RetryPolicy::for_outbox(max_attempts),
            batch_size,
            lease: Duration::from_secs(300),
        }
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub async fn run_once(&self) -> Result<DispatchReport> {
        self.run_once_at(Utc::now()).await
    }

    /// 按指定时间执行一轮投递
    #[instrument(skip(self), fields(channel = %self.channel.name()))]
    pub async fn run_once_at(&self, now: DateTime<Utc>) -> Result<DispatchReport> {
        let lease_until = now + chrono::Duration::from_std(self.lease).unwrap_or_default();
        let tasks = self
            .outbox
            .claim_due(now, self.batch_size, lease_until)
            .await?;

        let mut report = DispatchReport {
            claimed: tasks.len(),
            ..Default::default()
        };

        for task in tasks {
            match self.channel.send(&task).await {
                Ok(receipt) => {
                    self.outbox.mark_sent(task.id, Utc::now()).await?;
                    metrics::record_notification("sent");
                    info!(
                        task_id = %task.id,
                        message_id = %receipt.message_id,
                        attempts = task.attempts,
                        "通知投递成功"
                    );
                    report.sent += 1;
                }
                Err(e) => {
                    // attempts 已包含本次投递
                    let retries_used = task.attempts.saturating_sub(1).max(0) as u32;
                    if self.policy.should_retry(retries_used) {
                        let delay = self.policy.delay_for_attempt(retries_used);
                        let next_attempt_at =
                            now + chrono::Duration::from_std(delay).unwrap_or_default();
                        self.outbox
                            .mark_retry(task.id, e.to_string(), next_attempt_at, Utc::now())
                            .await?;
                        metrics::record_notification("retry");
                        warn!(
                            task_id = %task.id,
                            attempts = task.attempts,
                            next_attempt_at = %next_attempt_at,
                            error = %e,
                            "通知投递失败，稍后重试"
                        );
                        report.retried += 1;
                    } else {
                        self.outbox
                            .mark_failed(task.id, e.to_string(), Utc::now())
                            .await?;
                        metrics::record_notification("failed");
                        warn!(
                            task_id = %task.id,
                            attempts = task.attempts,
                            error = %e,
                            "通知投递失败次数已达上限"
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DonationError;
    use crate::models::{NotificationKind, NotificationStatus, NotificationTask};
    use crate::notification::channel::{DeliveryReceipt, MockNotificationChannel};
    use crate::repository::MemoryStore;

    fn task(now: DateTime<Utc>) -> NotificationTask {
        NotificationTask::pending(
            "b@example.org",
            NotificationKind::RegistrationConfirmed,
            "主题",
            "正文",
            serde_json::json!({}),
            now,
        )
    }

    fn failing_channel() -> MockNotificationChannel {
        let mut channel = MockNotificationChannel::new();
        channel.expect_name().return_const("mock".to_string());
        channel
            .expect_send()
            .returning(|_| Err(DonationError::Internal("relay down".to_string())));
        channel
    }

    #[tokio::test]
    async fn test_successful_delivery_marks_sent() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        let t = task(now);
        store.enqueue(&t).await.unwrap();

        let mut channel = MockNotificationChannel::new();
        channel.expect_name().return_const("mock".to_string());
        channel.expect_send().times(1).returning(|_| {
            Ok(DeliveryReceipt {
                message_id: "m-1".to_string(),
            })
        });

        let dispatcher = OutboxDispatcher::new(store.clone(), Arc::new(channel), 3, 10);
        let report = dispatcher.run_once_at(now).await.unwrap();
        assert_eq!(report.sent, 1);

        let stored = NotificationOutboxTrait::get(store.as_ref(), t.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, NotificationStatus::Sent);
        assert_eq!(stored.attempts, 1);
    }

    #[tokio::test]
    async fn test_failure_backs_off_then_fails() {
        let store = Arc::new(MemoryStore::new());
        let mut now = Utc::now();
        let t = task(now);
        store.enqueue(&t).await.unwrap();

        let dispatcher = OutboxDispatcher::new(store.clone(), Arc::new(failing_channel()), 2, 10);

        let first = dispatcher.run_once_at(now).await.unwrap();
        assert_eq!(first.retried, 1);

        // 退避期内不会被再次领取
        let idle = dispatcher.run_once_at(now).await.unwrap();
        assert_eq!(idle.claimed, 0);

        now += chrono::Duration::seconds(31);
        let second = dispatcher.run_once_at(now).await.unwrap();
        assert_eq!(second.failed, 1);

        let stored = NotificationOutboxTrait::get(store.as_ref(), t.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, NotificationStatus::Failed);
        assert_eq!(stored.attempts, 2);
        assert_eq!(stored.last_error.as_deref(), Some("内部错误: relay down"));
    }
}
