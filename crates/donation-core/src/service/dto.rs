//! 服务层数据传输对象
//!
//! 定义服务层与外部交互使用的 DTO，与内部领域模型解耦

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ApplicationStatus, DonationKind, ProgramStatus, ReviewStatus};

// ==================== 报名 ====================

/// 报名请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub beneficiary_id: Uuid,
    pub program_id: Uuid,
}

/// 报名结果
///
/// warnings 收集不影响报名结果的问题（如通知入队失败）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    pub application_id: Uuid,
    pub qr_token: String,
    pub expires_at: DateTime<Utc>,
    pub warnings: Vec<String>,
}

/// 按状态统计的报名数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCounts {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub checked_in: i64,
    pub expired: i64,
    pub cancelled: i64,
}

impl ApplicationCounts {
    pub fn from_rows(rows: &[(ApplicationStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status {
                ApplicationStatus::Pending => counts.pending += count,
                ApplicationStatus::Confirmed => counts.confirmed += count,
                ApplicationStatus::CheckedIn => counts.checked_in += count,
                ApplicationStatus::Expired => counts.expired += count,
                ApplicationStatus::Cancelled => counts.cancelled += count,
            }
            counts.total += count;
        }
        counts
    }
}

/// 单个活动的报名统计
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramStats {
    pub program_id: Uuid,
    pub max_participants: i32,
    pub current_participants: i32,
    #[serde(flatten)]
    pub counts: ApplicationCounts,
}

// ==================== 活动 ====================

/// 创建活动参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProgram {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub max_participants: i32,
}

/// 分页结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

// ==================== 资料与审核 ====================

/// 捐赠人 / 受助人注册参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// 仅捐赠人
    pub organization: Option<String>,
    /// 仅受助人
    pub household_size: Option<i32>,
}

/// 审核决定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    pub approved: bool,
    pub reason: Option<String>,
}

// ==================== 捐赠 ====================

/// 捐赠登记参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDonation {
    pub donor_id: Uuid,
    pub kind: DonationKind,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub item_name: Option<String>,
    pub quantity: Option<i32>,
    pub unit: Option<String>,
    pub note: Option<String>,
    /// 缺省为登记时间
    pub received_at: Option<DateTime<Utc>>,
}

// ==================== 仪表盘 ====================

/// 按审核状态统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl ReviewCounts {
    pub fn from_rows(rows: &[(ReviewStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status {
                ReviewStatus::Pending => counts.pending += count,
                ReviewStatus::Approved => counts.approved += count,
                ReviewStatus::Rejected => counts.rejected += count,
            }
        }
        counts
    }
}

/// 按状态统计的活动数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramCounts {
    pub draft: i64,
    pub published: i64,
    pub cancelled: i64,
}

impl ProgramCounts {
    pub fn from_rows(rows: &[(ProgramStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status {
                ProgramStatus::Draft => counts.draft += count,
                ProgramStatus::Published => counts.published += count,
                ProgramStatus::Cancelled => counts.cancelled += count,
            }
        }
        counts
    }
}

/// 单币种现金捐赠合计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotal {
    pub currency: String,
    pub amount_cents: i64,
}

/// 管理后台仪表盘
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub donors: ReviewCounts,
    pub beneficiaries: ReviewCounts,
    pub programs: ProgramCounts,
    pub applications: ApplicationCounts,
    pub monetary_totals: Vec<CurrencyTotal>,
    pub produce_donations: i64,
    pub generated_at: DateTime<Utc>,
}
