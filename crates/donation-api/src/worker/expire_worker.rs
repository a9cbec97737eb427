//! 报名过期处理 Worker
//!
//! 定期将超过核销截止时间仍未核销的报名置为 EXPIRED 并释放名额。
//! PostgreSQL 下过期批次使用 `FOR UPDATE SKIP LOCKED`，多实例同时运行不会重复处理。

use std::sync::Arc;
use std::time::Duration;

use donation_core::ExpiryService;
use donation_shared::observability::metrics;
use tracing::{error, info};

/// 过期处理 Worker
pub struct ExpireWorker {
    expiry: Arc<ExpiryService>,
    /// 轮询间隔
    poll_interval: Duration,
}

impl ExpireWorker {
    pub fn new(expiry: Arc<ExpiryService>, poll_interval_secs: u64) -> Self {
        Self {
            expiry,
            poll_interval: Duration::from_secs(poll_interval_secs),
        }
    }

    /// 主循环：持续处理过期报名直到进程退出
    pub async fn run(&self) {
        info!(poll_interval = ?self.poll_interval, "ExpireWorker 已启动");

        loop {
            self.tick().await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 执行一轮扫描，返回本轮过期的报名数
    pub async fn tick(&self) -> u64 {
        let expired = match self.expiry.sweep().await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "过期扫描出错");
                0
            }
        };

        // 记录 Worker 健康状态
        metrics::set_worker_last_run("expire_worker");
        expired
    }
}
