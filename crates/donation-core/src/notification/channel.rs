//! 通知渠道接口

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NotificationTask;

/// 投递回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// 外部系统返回的消息 ID
    pub message_id: String,
}

/// 通知渠道 trait
///
/// 渠道实现应当是无状态的，便于并发调用。返回 Err 表示本次投递失败，
/// 是否重试由发件箱投递器决定。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    async fn send(&self, task: &NotificationTask) -> Result<DeliveryReceipt>;
}
