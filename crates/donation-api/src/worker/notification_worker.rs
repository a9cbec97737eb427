//! 通知投递 Worker
//!
//! 轮询通知发件箱，将到期任务交给投递器发送

use std::sync::Arc;
use std::time::Duration;

use donation_core::{DispatchReport, OutboxDispatcher};
use donation_shared::observability::metrics;
use tracing::{debug, error, info};

/// 通知投递 Worker
pub struct NotificationWorker {
    dispatcher: Arc<OutboxDispatcher>,
    poll_interval: Duration,
}

impl NotificationWorker {
    pub fn new(dispatcher: Arc<OutboxDispatcher>, poll_interval_secs: u64) -> Self {
        Self {
            dispatcher,
            poll_interval: Duration::from_secs(poll_interval_secs),
        }
    }

    /// 主循环：持续投递直到进程退出
    pub async fn run(&self) {
        info!(poll_interval = ?self.poll_interval, "NotificationWorker 已启动");

        loop {
            self.tick().await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 执行一轮投递
    pub async fn tick(&self) -> DispatchReport {
        let report = match self.dispatcher.run_once().await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "通知投递出错");
                DispatchReport::default()
            }
        };

        if report.claimed > 0 {
            debug!(
                claimed = report.claimed,
                sent = report.sent,
                retried = report.retried,
                failed = report.failed,
                "通知投递批次完成"
            );
        }

        metrics::set_worker_last_run("notification_worker");
        report
    }
}
