//! 活动报名实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ApplicationStatus;

/// 活动报名
///
/// 一条记录对应一名受助人对一场活动的报名。记录从不物理删除，只通过状态流转结束。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProgramApplication {
    pub id: Uuid,
    pub program_id: Uuid,
    pub beneficiary_id: Uuid,
    pub status: ApplicationStatus,
    /// 扫码核销使用的不透明令牌，全局唯一
    pub qr_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[sqlx(default)]
    pub checked_in_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ProgramApplication {
    /// 检查报名是否已超过核销截止时间
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
