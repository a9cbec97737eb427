//! 账号与资料实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AccountRole, AccountStatus, ProfileKind, ReviewStatus};

/// 登录账号
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: AccountRole,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 捐赠人 / 受助人资料
///
/// 每份资料归属唯一账号，审核状态由管理员设置
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: ProfileKind,
    pub full_name: String,
    #[sqlx(default)]
    pub phone: Option<String>,
    #[sqlx(default)]
    pub address: Option<String>,
    /// 捐赠人所属机构
    #[sqlx(default)]
    pub organization: Option<String>,
    /// 受助人家庭人数
    #[sqlx(default)]
    pub household_size: Option<i32>,
    pub review_status: ReviewStatus,
    #[sqlx(default)]
    pub review_reason: Option<String>,
    #[sqlx(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_approved(&self) -> bool {
        self.review_status == ReviewStatus::Approved
    }
}
