//! 过期扫描服务
//!
//! 将所有已逾期的非终态报名置为 EXPIRED 并释放名额。分批处理，
//! 每行转换都以"仍为非终态"为条件，重复执行不会重复计数。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use donation_shared::observability::metrics;

use crate::error::Result;
use crate::repository::ApplicationRepositoryTrait;

/// 过期扫描服务
pub struct ExpiryService {
    applications: Arc<dyn ApplicationRepositoryTrait>,
    batch_size: i64,
}

impl ExpiryService {
    pub fn new(applications: Arc<dyn ApplicationRepositoryTrait>, batch_size: i64) -> Self {
        Self {
            applications,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn sweep(&self) -> Result<u64> {
        self.sweep_at(Utc::now()).await
    }

    /// 按指定时间执行一次完整扫描，返回本次转换的报名数
    #[instrument(skip(self))]
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut total = 0u64;

        loop {
            let expired = self
                .applications
                .expire_overdue(now, self.batch_size)
                .await?;
            total += expired;
            debug!(batch = expired, total, "过期批次处理完成");

            if expired < self.batch_size as u64 {
                break;
            }
        }

        if total > 0 {
            metrics::record_expirations("sweep", total);
            info!(count = total, "过期扫描完成");
        }

        Ok(total)
    }
}
