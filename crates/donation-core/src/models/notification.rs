//! 通知发件箱任务

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{NotificationKind, NotificationStatus};

/// 通知任务
///
/// 业务流程只负责写入任务，投递由后台 Worker 完成，失败按退避策略重试
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTask {
    pub id: Uuid,
    /// 收件人邮箱
    pub recipient: String,
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
    /// 模板参数，报名确认通知中携带二维码内容
    pub payload: serde_json::Value,
    pub status: NotificationStatus,
    /// 已尝试投递次数
    pub attempts: i32,
    #[sqlx(default)]
    pub last_error: Option<String>,
    pub next_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationTask {
    /// 创建待投递任务
    pub fn pending(
        recipient: impl Into<String>,
        kind: NotificationKind,
        subject: impl Into<String>,
        body: impl Into<String>,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            recipient: recipient.into(),
            kind,
            subject: subject.into(),
            body: body.into(),
            payload,
            status: NotificationStatus::Pending,
            attempts: 0,
            last_error: None,
            next_attempt_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}
